//! Column name canonicalization and cross-table column alignment.
//!
//! Headers in the tally and the target rarely agree on spelling ("Crs #",
//! "CRS#", "crs\n#"). Each header is reduced to a canonical key (lowercase,
//! alphanumerics only) and the two tables are aligned on that key. The
//! resulting [`ColumnMapping`] is built once per run and only read afterwards.

use std::{collections::HashMap, fmt};

/// Canonical key for a column header: case-folded with every character that
/// is not alphanumeric removed. Accepts anything displayable so numeric
/// headers are coerced to text first.
pub fn normalize_column_name<T: fmt::Display + ?Sized>(name: &T) -> String {
    name.to_string()
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Canonical keys for one table's headers, with a lookup from key to position.
///
/// When two headers collapse onto the same key the later one wins, both for
/// the position lookup and for the original name.
#[derive(Debug, Clone, Default)]
pub struct CanonicalColumns {
    keys: Vec<String>,
    positions: HashMap<String, usize>,
    originals: HashMap<String, String>,
}

impl CanonicalColumns {
    pub fn from_headers(headers: &[String]) -> Self {
        let mut columns = CanonicalColumns::default();
        for (idx, header) in headers.iter().enumerate() {
            let key = normalize_column_name(header.as_str());
            if !columns.positions.contains_key(&key) {
                columns.keys.push(key.clone());
            }
            columns.positions.insert(key.clone(), idx);
            columns.originals.insert(key, header.clone());
        }
        columns
    }

    /// Distinct keys in first-seen header order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn original_name(&self, key: &str) -> Option<&str> {
        self.originals.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingStatus {
    Matched,
    Unmatched,
}

impl fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingStatus::Matched => f.write_str("Matched"),
            MappingStatus::Unmatched => f.write_str("Unmatched"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub canonical: String,
    pub tally: Option<String>,
    pub target: Option<String>,
    pub status: MappingStatus,
}

/// Every canonical key seen in either table, tally order first, then the
/// target-only keys in target order.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    entries: Vec<MappingEntry>,
}

impl ColumnMapping {
    pub fn build(tally: &CanonicalColumns, target: &CanonicalColumns) -> Self {
        let mut entries = Vec::with_capacity(tally.keys().len() + target.keys().len());
        for key in tally.keys() {
            entries.push(Self::entry(key, tally, target));
        }
        for key in target.keys().iter().filter(|key| !tally.contains(key)) {
            entries.push(Self::entry(key, tally, target));
        }
        Self { entries }
    }

    fn entry(key: &str, tally: &CanonicalColumns, target: &CanonicalColumns) -> MappingEntry {
        let tally_name = tally.original_name(key).map(str::to_string);
        let target_name = target.original_name(key).map(str::to_string);
        let status = if tally_name.is_some() && target_name.is_some() {
            MappingStatus::Matched
        } else {
            MappingStatus::Unmatched
        };
        MappingEntry {
            canonical: key.to_string(),
            tally: tally_name,
            target: target_name,
            status,
        }
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn matched_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == MappingStatus::Matched)
            .count()
    }

    pub fn unmatched_count(&self) -> usize {
        self.entries.len() - self.matched_count()
    }

    /// Canonical keys present in both tables, in mapping order.
    pub fn shared_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.status == MappingStatus::Matched)
            .map(|e| e.canonical.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&MappingEntry> {
        self.entries.iter().find(|e| e.canonical == key)
    }

    /// Original target header for a canonical key, falling back to the key.
    pub fn target_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key)
            .and_then(|e| e.target.as_deref())
            .unwrap_or(key)
    }

    /// Original tally header for a canonical key, falling back to the key.
    pub fn tally_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).and_then(|e| e.tally.as_deref()).unwrap_or(key)
    }
}
