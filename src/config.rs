//! Run configuration loaded from YAML and overridden from the command line.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::columns::normalize_column_name;

pub const DEFAULT_ANCHOR: &str = "Subj";

/// What to do when one tally row's identity key matches several target rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Update the first target row in sheet order and say nothing
    #[default]
    FirstMatch,
    /// Update the first target row and list the conflict in the report
    Warn,
    /// Leave every candidate untouched and list the conflict in the report
    Skip,
}

/// Which columns the `duplicates` command compares when looking for rows
/// that ought to be unique.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum UniquenessCheck {
    /// The four identity-key columns, normalized as for matching
    #[default]
    IdentityKey,
    /// The table's first three columns plus the `Room` column, compared as displayed
    LeadingColumnsAndRoom,
}

/// Canonical column keys that make up a row's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyColumns {
    pub subject: String,
    pub course_number: String,
    pub section: String,
    pub days: String,
}

impl Default for KeyColumns {
    fn default() -> Self {
        Self {
            subject: "subj".to_string(),
            course_number: "crsno".to_string(),
            section: "sec".to_string(),
            days: "days".to_string(),
        }
    }
}

impl KeyColumns {
    pub fn all(&self) -> [&str; 4] {
        [
            self.subject.as_str(),
            self.course_number.as_str(),
            self.section.as_str(),
            self.days.as_str(),
        ]
    }

    pub fn contains(&self, key: &str) -> bool {
        self.all().contains(&key)
    }

    /// Re-canonicalizes hand-written keys so `"Crs No"` in a config file works.
    fn normalized(self) -> Self {
        Self {
            subject: normalize_column_name(self.subject.as_str()),
            course_number: normalize_column_name(self.course_number.as_str()),
            section: normalize_column_name(self.section.as_str()),
            days: normalize_column_name(self.days.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Header text that marks the top-left corner of each table
    pub anchor: String,
    pub key_columns: KeyColumns,
    pub ambiguity: AmbiguityPolicy,
    pub uniqueness: UniquenessCheck,
    /// List tally rows that have no counterpart in the target
    pub report_unmatched_tally: bool,
    /// List every planned cell change
    pub show_changes: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            anchor: DEFAULT_ANCHOR.to_string(),
            key_columns: KeyColumns::default(),
            ambiguity: AmbiguityPolicy::default(),
            uniqueness: UniquenessCheck::default(),
            report_unmatched_tally: true,
            show_changes: true,
        }
    }
}

impl ReconcileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: ReconcileConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating config file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing config YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing config to YAML string")
    }

    /// Canonical key of the anchor header.
    pub fn anchor_key(&self) -> String {
        normalize_column_name(self.anchor.as_str())
    }

    /// Rejects an anchor or key column with no letters or digits; its
    /// canonical key would be empty and could never name a header.
    pub fn validate(&self) -> Result<()> {
        if self.anchor_key().is_empty() {
            bail!(
                "Anchor '{}' has no letters or digits and cannot identify a header cell",
                self.anchor
            );
        }
        if self.key_columns.all().iter().any(|key| key.is_empty()) {
            bail!("Key columns must each contain a letter or digit");
        }
        Ok(())
    }

    fn normalized(mut self) -> Self {
        self.key_columns = self.key_columns.normalized();
        self
    }
}
