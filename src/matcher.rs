//! Identity keys and tally-to-target row matching.
//!
//! Two rows denote the same course section when their subject, course
//! number, section and meeting days agree after normalization. Target rows
//! are bucketed by key in sheet order, so "first match" always means the
//! earliest target row.

use std::{collections::HashMap, hash::Hash};

use log::{debug, warn};

use crate::{
    columns::CanonicalColumns,
    config::{AmbiguityPolicy, KeyColumns},
    data::{CellValue, Table},
    error::{ReconcileError, TableRole},
    values::{is_unparseable_course_number, normalize_course_number, normalize_days},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub subject: String,
    pub course_number: i64,
    pub section: String,
    pub days: String,
}

impl IdentityKey {
    pub fn from_row(row: &[CellValue], indices: &KeyIndices) -> Self {
        let cell = |idx: usize| row.get(idx).unwrap_or(&CellValue::Empty);
        Self {
            subject: cell(indices.subject).as_display(),
            course_number: normalize_course_number(cell(indices.course_number)),
            section: cell(indices.section).as_display(),
            days: normalize_days(cell(indices.days)),
        }
    }
}

/// Positions of the key columns inside one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyIndices {
    pub subject: usize,
    pub course_number: usize,
    pub section: usize,
    pub days: usize,
}

impl KeyIndices {
    pub fn resolve(
        columns: &CanonicalColumns,
        keys: &KeyColumns,
        table: TableRole,
    ) -> Result<Self, ReconcileError> {
        let lookup = |key: &str| {
            columns
                .position(key)
                .ok_or_else(|| ReconcileError::MissingKeyColumn {
                    table,
                    column: key.to_string(),
                })
        };
        Ok(Self {
            subject: lookup(&keys.subject)?,
            course_number: lookup(&keys.course_number)?,
            section: lookup(&keys.section)?,
            days: lookup(&keys.days)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedPair {
    pub tally_row: usize,
    pub target_row: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousMatch {
    pub tally_row: usize,
    /// Every target row sharing the key, in sheet order
    pub target_rows: Vec<usize>,
    /// Whether the first candidate was still updated
    pub applied: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub pairs: Vec<MatchedPair>,
    /// Target rows never selected by any tally row, in sheet order
    pub unmatched_target: Vec<usize>,
    /// Tally rows with no target counterpart, in tally order
    pub unmatched_tally: Vec<usize>,
    pub ambiguous: Vec<AmbiguousMatch>,
    /// Rows (by role and position) whose course number collapsed to 0
    pub unparseable_course_numbers: Vec<(TableRole, usize)>,
}

pub struct RowMatcher<'a> {
    tally: &'a Table,
    tally_keys: KeyIndices,
    target: &'a Table,
    target_keys: KeyIndices,
    policy: AmbiguityPolicy,
}

impl<'a> RowMatcher<'a> {
    pub fn new(
        tally: &'a Table,
        tally_columns: &CanonicalColumns,
        target: &'a Table,
        target_columns: &CanonicalColumns,
        keys: &KeyColumns,
        policy: AmbiguityPolicy,
    ) -> Result<Self, ReconcileError> {
        Ok(Self {
            tally,
            tally_keys: KeyIndices::resolve(tally_columns, keys, TableRole::Tally)?,
            target,
            target_keys: KeyIndices::resolve(target_columns, keys, TableRole::Target)?,
            policy,
        })
    }

    pub fn run(&self) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        let buckets = self.target_buckets(&mut outcome);
        let mut selected = vec![false; self.target.len()];

        for (tally_row, row) in self.tally.rows().iter().enumerate() {
            if is_unparseable_course_number(&row[self.tally_keys.course_number]) {
                outcome
                    .unparseable_course_numbers
                    .push((TableRole::Tally, tally_row));
            }
            let key = IdentityKey::from_row(row, &self.tally_keys);
            let Some(candidates) = buckets.get(&key) else {
                debug!("Tally row {tally_row} has no target counterpart for {key:?}");
                outcome.unmatched_tally.push(tally_row);
                continue;
            };

            let first = candidates[0];
            if candidates.len() > 1 {
                let applied = self.policy != AmbiguityPolicy::Skip;
                if self.policy != AmbiguityPolicy::FirstMatch {
                    warn!(
                        "Tally row {tally_row} matches {} target rows {:?}",
                        candidates.len(),
                        candidates
                    );
                }
                outcome.ambiguous.push(AmbiguousMatch {
                    tally_row,
                    target_rows: candidates.clone(),
                    applied,
                });
                if !applied {
                    continue;
                }
            }

            selected[first] = true;
            outcome.pairs.push(MatchedPair {
                tally_row,
                target_row: first,
            });
        }

        outcome.unmatched_target = selected
            .iter()
            .enumerate()
            .filter(|(_, chosen)| !**chosen)
            .map(|(idx, _)| idx)
            .collect();
        outcome
    }

    fn target_buckets(&self, outcome: &mut MatchOutcome) -> HashMap<IdentityKey, Vec<usize>> {
        let mut buckets: HashMap<IdentityKey, Vec<usize>> = HashMap::new();
        for (target_row, row) in self.target.rows().iter().enumerate() {
            if is_unparseable_course_number(&row[self.target_keys.course_number]) {
                outcome
                    .unparseable_course_numbers
                    .push((TableRole::Target, target_row));
            }
            buckets
                .entry(IdentityKey::from_row(row, &self.target_keys))
                .or_default()
                .push(target_row);
        }
        buckets
    }
}

/// Groups of rows inside one table that share an identity key.
pub fn duplicate_identity_keys(table: &Table, indices: &KeyIndices) -> Vec<Vec<usize>> {
    duplicate_groups(table, |row| IdentityKey::from_row(row, indices))
}

/// Groups of rows whose displayed values agree in every listed column.
pub fn duplicate_column_values(table: &Table, columns: &[usize]) -> Vec<Vec<usize>> {
    duplicate_groups(table, |row| {
        columns
            .iter()
            .map(|&idx| row.get(idx).map(CellValue::as_display).unwrap_or_default())
            .collect::<Vec<_>>()
    })
}

/// Rows sharing a key, grouped in order of each key's first appearance.
fn duplicate_groups<K, F>(table: &Table, key_of: F) -> Vec<Vec<usize>>
where
    K: Hash + Eq + Clone,
    F: Fn(&[CellValue]) -> K,
{
    let mut groups: HashMap<K, Vec<usize>> = HashMap::new();
    let mut order = Vec::new();
    for (idx, row) in table.rows().iter().enumerate() {
        let key = key_of(row);
        let group = groups.entry(key.clone()).or_default();
        if group.is_empty() {
            order.push(key);
        }
        group.push(idx);
    }
    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .filter(|group| group.len() > 1)
        .collect()
}
