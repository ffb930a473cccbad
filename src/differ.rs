//! Cell-level differences between matched rows.
//!
//! Only columns present in both tables and outside the identity key are
//! compared. The tally always wins: a change carries the tally's raw value.

use crate::{
    columns::{CanonicalColumns, ColumnMapping},
    config::KeyColumns,
    data::{CellValue, Table},
    matcher::MatchedPair,
    values::normalize_for_compare,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CellChange {
    /// 0-based row position inside the target table's data region
    pub target_row: usize,
    /// Canonical column key
    pub column: String,
    pub old_value: CellValue,
    pub new_value: CellValue,
}

/// A non-key column shared by both tables with its position in each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedColumn {
    pub key: String,
    pub tally_index: usize,
    pub target_index: usize,
}

pub fn shared_columns(
    mapping: &ColumnMapping,
    tally: &CanonicalColumns,
    target: &CanonicalColumns,
    keys: &KeyColumns,
) -> Vec<SharedColumn> {
    mapping
        .shared_keys()
        .filter(|key| !keys.contains(key))
        .filter_map(|key| {
            Some(SharedColumn {
                key: key.to_string(),
                tally_index: tally.position(key)?,
                target_index: target.position(key)?,
            })
        })
        .collect()
}

pub fn diff_pair(
    tally_row: &[CellValue],
    target_row: &[CellValue],
    target_position: usize,
    columns: &[SharedColumn],
) -> Vec<CellChange> {
    let mut changes = Vec::new();
    for column in columns {
        let new_value = tally_row
            .get(column.tally_index)
            .unwrap_or(&CellValue::Empty);
        let old_value = target_row
            .get(column.target_index)
            .unwrap_or(&CellValue::Empty);
        if normalize_for_compare(old_value) != normalize_for_compare(new_value) {
            changes.push(CellChange {
                target_row: target_position,
                column: column.key.clone(),
                old_value: old_value.clone(),
                new_value: new_value.clone(),
            });
        }
    }
    changes
}

pub fn diff_matches(
    tally: &Table,
    target: &Table,
    pairs: &[MatchedPair],
    columns: &[SharedColumn],
) -> Vec<CellChange> {
    pairs
        .iter()
        .filter_map(|pair| {
            let tally_row = tally.row(pair.tally_row)?;
            let target_row = target.row(pair.target_row)?;
            Some(diff_pair(tally_row, target_row, pair.target_row, columns))
        })
        .flatten()
        .collect()
}
