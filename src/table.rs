//! Plain-text table rendering for console reports.

use std::borrow::Cow;
use std::fmt::Write as _;

const COLUMN_GAP: &str = "  ";
const MIN_RULE_WIDTH: usize = 3;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let widths = column_widths(headers, rows);
    let rule = widths
        .iter()
        .map(|w| "-".repeat((*w).max(MIN_RULE_WIDTH)))
        .collect::<Vec<_>>();
    let rule_widths = widths
        .iter()
        .map(|w| (*w).max(MIN_RULE_WIDTH))
        .collect::<Vec<_>>();

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(headers, &widths));
    let _ = writeln!(output, "{}", format_line(&rule, &rule_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_line(row, &widths));
    }
    output
}

/// A titled report section; an empty section prints `(none)` instead of a table.
pub fn render_section(title: &str, headers: &[String], rows: &[Vec<String>]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{title}");
    let _ = writeln!(output, "{}", "=".repeat(display_width(title)));
    if rows.is_empty() {
        let _ = writeln!(output, "(none)");
    } else {
        output.push_str(&render_table(headers, rows));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths = headers
        .iter()
        .map(|h| display_width(h).max(1))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }
    widths
}

fn format_line(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = flatten_whitespace(value);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    line.trim_end_matches(' ').to_string()
}

/// Visible character count, skipping ANSI colour sequences such as `\x1b[31m`.
fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;
    for ch in value.chars() {
        match (in_escape, ch) {
            (false, '\u{1b}') => in_escape = true,
            (true, 'm') => in_escape = false,
            (true, _) => {}
            (false, _) => width += 1,
        }
    }
    width
}

fn flatten_whitespace(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
