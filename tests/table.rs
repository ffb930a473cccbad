use tally_sync::table::{render_section, render_table};

#[test]
fn render_table_aligns_columns() {
    let headers = vec!["subj".to_string(), "room".to_string()];
    let rows = vec![
        vec!["CS".to_string(), "101".to_string()],
        vec!["MATH".to_string(), "9".to_string()],
    ];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines, vec!["subj  room", "----  ----", "CS    101", "MATH  9"]);
}

#[test]
fn render_table_normalizes_control_characters() {
    let headers = vec!["notes".to_string()];
    let rows = vec![vec!["line1\nline2\tvalue".to_string()]];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "line1 line2 value");
}

#[test]
fn render_table_handles_unicode_and_ansi_widths() {
    let headers = vec!["résumé".to_string(), "status".to_string()];
    let rows = vec![vec!["café".to_string(), "\u{1b}[31mERR\u{1b}[0m".to_string()]];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[0], "résumé  status");
    assert_eq!(lines[2], "café    \u{1b}[31mERR\u{1b}[0m");
}

#[test]
fn render_table_rule_is_at_least_three_wide() {
    let headers = vec!["id".to_string()];
    let rendered = render_table(&headers, &[vec!["1".to_string()]]);
    assert_eq!(rendered.lines().nth(1), Some("---"));
}

#[test]
fn render_section_underlines_title() {
    let headers = vec!["row".to_string(), "subj".to_string()];
    let rows = vec![vec!["3".to_string(), "EN".to_string()]];

    let rendered = render_section("Unmatched target rows", &headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[0], "Unmatched target rows");
    assert_eq!(lines[1], "=".repeat("Unmatched target rows".len()));
    assert_eq!(lines[2], "row  subj");
    assert_eq!(lines[4], "3    EN");
}

#[test]
fn render_section_without_rows_prints_none() {
    let headers = vec!["row".to_string()];
    let rendered = render_section("Planned changes", &headers, &[]);
    assert_eq!(rendered, "Planned changes\n===============\n(none)\n");
}
