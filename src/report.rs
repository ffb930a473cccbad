//! Human-readable reports derived from a reconciliation run.
//!
//! Every function here is pure: it reads the tables, the column mapping and
//! the match outcome and returns rendered text. Nothing is printed or written.

use std::collections::HashMap;

use itertools::Itertools;

use crate::{
    columns::{CanonicalColumns, ColumnMapping},
    data::Table,
    differ::CellChange,
    matcher::AmbiguousMatch,
    table::render_section,
};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Sheet-style row label: data rows start one below the header.
fn row_label(position: usize) -> String {
    (position + 1).to_string()
}

pub fn render_column_mapping(mapping: &ColumnMapping) -> String {
    let headers = strings(&["canonical", "tally column", "target column", "status"]);
    let rows = mapping
        .entries()
        .iter()
        .map(|entry| {
            vec![
                entry.canonical.clone(),
                entry.tally.clone().unwrap_or_default(),
                entry.target.clone().unwrap_or_default(),
                entry.status.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    let mut output = render_section("Column mapping", &headers, &rows);
    output.push_str(&format!(
        "Matched: {}, Unmatched: {}, Total: {}\n",
        mapping.matched_count(),
        mapping.unmatched_count(),
        mapping.entries().len()
    ));
    output
}

/// Positions of rows that have at least one identical twin, in table order.
/// Every member of a duplicate group is listed, not only the later copies.
pub fn find_duplicate_rows(table: &Table) -> Vec<usize> {
    let mut counts: HashMap<Vec<String>, usize> = HashMap::new();
    for position in 0..table.len() {
        *counts.entry(table.display_row(position)).or_default() += 1;
    }
    (0..table.len())
        .filter(|&position| counts.get(&table.display_row(position)).copied().unwrap_or(0) > 1)
        .collect()
}

fn table_rows(table: &Table, positions: &[usize]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut headers = vec!["row".to_string()];
    headers.extend(table.headers().iter().cloned());
    let rows = positions
        .iter()
        .map(|&position| {
            let mut row = vec![row_label(position)];
            row.extend(table.display_row(position));
            row
        })
        .collect();
    (headers, rows)
}

pub fn render_duplicates(title: &str, table: &Table, positions: &[usize]) -> String {
    let (headers, rows) = table_rows(table, positions);
    render_section(title, &headers, &rows)
}

/// Identity-key groups, one line per member, groups separated by their number.
pub fn render_key_duplicates(title: &str, table: &Table, groups: &[Vec<usize>]) -> String {
    let mut headers = vec!["group".to_string()];
    let (table_headers, _) = table_rows(table, &[]);
    headers.extend(table_headers);
    let rows = groups
        .iter()
        .enumerate()
        .flat_map(|(group_idx, members)| {
            members.iter().map(move |&position| {
                let mut row = vec![(group_idx + 1).to_string(), row_label(position)];
                row.extend(table.display_row(position));
                row
            })
        })
        .collect::<Vec<_>>();
    render_section(title, &headers, &rows)
}

/// Target rows no tally row selected, headed by the target's own column names.
pub fn render_unmatched_target(
    target: &Table,
    target_columns: &CanonicalColumns,
    mapping: &ColumnMapping,
    positions: &[usize],
) -> String {
    let mut headers = vec!["row".to_string()];
    headers.extend(
        target_columns
            .keys()
            .iter()
            .map(|key| mapping.target_name(key).to_string()),
    );
    let rows = positions
        .iter()
        .map(|&position| {
            let mut row = vec![row_label(position)];
            row.extend(target_columns.keys().iter().map(|key| {
                target_columns
                    .position(key)
                    .map(|idx| target.value(position, idx).as_display())
                    .unwrap_or_default()
            }));
            row
        })
        .collect::<Vec<_>>();
    render_section("Unmatched target rows", &headers, &rows)
}

pub fn render_unmatched_tally(tally: &Table, positions: &[usize]) -> String {
    let (headers, rows) = table_rows(tally, positions);
    render_section("Tally rows without a target match", &headers, &rows)
}

pub fn render_ambiguous(ambiguous: &[AmbiguousMatch]) -> String {
    let headers = strings(&["tally row", "target rows", "resolution"]);
    let rows = ambiguous
        .iter()
        .map(|conflict| {
            let resolution = match (conflict.applied, conflict.target_rows.first()) {
                (true, Some(&first)) => format!("updated row {}", row_label(first)),
                _ => "skipped".to_string(),
            };
            vec![
                row_label(conflict.tally_row),
                conflict.target_rows.iter().map(|&r| row_label(r)).join(", "),
                resolution,
            ]
        })
        .collect::<Vec<_>>();
    render_section("Ambiguous matches", &headers, &rows)
}

pub fn render_changes(changes: &[CellChange], mapping: &ColumnMapping) -> String {
    let headers = strings(&["row", "column", "old value", "new value"]);
    let rows = changes
        .iter()
        .map(|change| {
            vec![
                row_label(change.target_row),
                mapping.target_name(&change.column).to_string(),
                change.old_value.as_display(),
                change.new_value.as_display(),
            ]
        })
        .collect::<Vec<_>>();
    render_section("Planned changes", &headers, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CellValue;

    fn sample() -> Table {
        Table::new(
            strings(&["Subj", "Crs No", "Room"]),
            vec![
                vec![CellValue::text("CS"), CellValue::Number(101.0), CellValue::text("205")],
                vec![CellValue::text("MA"), CellValue::text("200"), CellValue::Empty],
                vec![CellValue::text("CS"), CellValue::text("101"), CellValue::text("205")],
            ],
        )
    }

    #[test]
    fn duplicates_compare_displayed_values_and_keep_every_member() {
        assert_eq!(find_duplicate_rows(&sample()), vec![0, 2]);
        let unique = Table::new(strings(&["a"]), vec![vec![CellValue::text("x")]]);
        assert!(find_duplicate_rows(&unique).is_empty());
    }

    #[test]
    fn unmatched_target_uses_original_headers() {
        let target = sample();
        let target_columns = CanonicalColumns::from_headers(target.headers());
        let tally_columns = CanonicalColumns::from_headers(&strings(&["subj", "crsno"]));
        let mapping = ColumnMapping::build(&tally_columns, &target_columns);

        let rendered = render_unmatched_target(&target, &target_columns, &mapping, &[1]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Unmatched target rows");
        assert_eq!(lines[2], "row  Subj  Crs No  Room");
        assert_eq!(lines[4], "2    MA    200");
    }

    #[test]
    fn empty_sections_say_none() {
        let rendered = render_ambiguous(&[]);
        assert!(rendered.ends_with("(none)\n"));
    }

    #[test]
    fn ambiguous_resolution_names_the_updated_row() {
        let rendered = render_ambiguous(&[AmbiguousMatch {
            tally_row: 0,
            target_rows: vec![1, 2],
            applied: true,
        }]);
        assert!(rendered.contains("updated row 2"));
        assert!(rendered.contains("2, 3"));
    }

    #[test]
    fn mapping_report_ends_with_counts() {
        let tally = CanonicalColumns::from_headers(&strings(&["Subj", "Enrolled"]));
        let target = CanonicalColumns::from_headers(&strings(&["SUBJ"]));
        let rendered = render_column_mapping(&ColumnMapping::build(&tally, &target));
        assert!(rendered.contains("Matched"));
        assert!(rendered.ends_with("Matched: 1, Unmatched: 1, Total: 2\n"));
    }
}
