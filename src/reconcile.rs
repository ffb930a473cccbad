//! Reconciliation pipeline: normalize columns, match rows, diff fields,
//! write back, report.
//!
//! [`plan`] is the pure part and works on in-memory tables. [`run`] adds the
//! file handling around it and [`execute`] is the `reconcile` subcommand.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};

use crate::{
    cli::ReconcileArgs,
    columns::{CanonicalColumns, ColumnMapping},
    config::{AmbiguityPolicy, ReconcileConfig},
    data::Table,
    differ::{CellChange, diff_matches, shared_columns},
    error::{ReconcileError, TableRole},
    io_utils,
    matcher::{MatchOutcome, RowMatcher},
    report,
    sheet::{self, TableSource},
    writer::{self, WriteRequest, WriteSummary},
};

/// Per-run settings handed to every stage.
#[derive(Debug, Clone, Default)]
pub struct ReconcileContext {
    pub config: ReconcileConfig,
    pub dry_run: bool,
}

impl ReconcileContext {
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            config,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn anchor_key(&self) -> String {
        self.config.anchor_key()
    }
}

#[derive(Debug, Clone)]
pub struct ReconcilePlan {
    pub tally_columns: CanonicalColumns,
    pub target_columns: CanonicalColumns,
    pub mapping: ColumnMapping,
    pub outcome: MatchOutcome,
    pub changes: Vec<CellChange>,
}

pub fn plan(
    ctx: &ReconcileContext,
    tally: &Table,
    target: &Table,
) -> Result<ReconcilePlan, ReconcileError> {
    let tally_columns = CanonicalColumns::from_headers(tally.headers());
    let target_columns = CanonicalColumns::from_headers(target.headers());
    let mapping = ColumnMapping::build(&tally_columns, &target_columns);
    info!(
        "Column mapping: {} matched, {} unmatched",
        mapping.matched_count(),
        mapping.unmatched_count()
    );
    for entry in mapping.entries() {
        match (&entry.tally, &entry.target) {
            (Some(name), None) => warn!("Tally column '{name}' has no target counterpart"),
            (None, Some(name)) => debug!("Target column '{name}' is not in the tally"),
            _ => {}
        }
    }

    let keys = &ctx.config.key_columns;
    let outcome = RowMatcher::new(
        tally,
        &tally_columns,
        target,
        &target_columns,
        keys,
        ctx.config.ambiguity,
    )?
    .run();
    for (role, position) in &outcome.unparseable_course_numbers {
        warn!(
            "{role} row {} has a course number that is not an integer; matching it as 0",
            position + 1
        );
    }
    info!(
        "Matched {} tally row(s); {} target row(s) and {} tally row(s) unmatched",
        outcome.pairs.len(),
        outcome.unmatched_target.len(),
        outcome.unmatched_tally.len()
    );

    let columns = shared_columns(&mapping, &tally_columns, &target_columns, keys);
    let changes = diff_matches(tally, target, &outcome.pairs, &columns);
    info!(
        "{} cell change(s) across {} compared column(s)",
        changes.len(),
        columns.len()
    );

    Ok(ReconcilePlan {
        tally_columns,
        target_columns,
        mapping,
        outcome,
        changes,
    })
}

impl ReconcilePlan {
    pub fn render_report(&self, ctx: &ReconcileContext, tally: &Table, target: &Table) -> String {
        let mut sections = vec![report::render_column_mapping(&self.mapping)];
        sections.push(report::render_duplicates(
            "Duplicate tally rows",
            tally,
            &report::find_duplicate_rows(tally),
        ));
        sections.push(report::render_duplicates(
            "Duplicate target rows",
            target,
            &report::find_duplicate_rows(target),
        ));
        sections.push(report::render_unmatched_target(
            target,
            &self.target_columns,
            &self.mapping,
            &self.outcome.unmatched_target,
        ));
        if ctx.config.report_unmatched_tally {
            sections.push(report::render_unmatched_tally(
                tally,
                &self.outcome.unmatched_tally,
            ));
        }
        if ctx.config.ambiguity != AmbiguityPolicy::FirstMatch {
            sections.push(report::render_ambiguous(&self.outcome.ambiguous));
        }
        if ctx.config.show_changes {
            sections.push(report::render_changes(&self.changes, &self.mapping));
        }
        sections.join("\n")
    }
}

/// Result of one full reconciliation over files.
#[derive(Debug, Clone)]
pub struct ReconcileRun {
    pub plan: ReconcilePlan,
    pub write: WriteSummary,
    pub report: String,
}

pub fn run(
    ctx: &ReconcileContext,
    tally_source: &TableSource,
    target_source: &TableSource,
) -> Result<ReconcileRun> {
    if !io_utils::is_writable_workbook(&target_source.path) {
        bail!(
            "Target {:?} must be a workbook (.xlsx or .xlsm); only those can be updated in place",
            target_source.path
        );
    }
    ctx.config.validate()?;
    let anchor_key = ctx.anchor_key();
    let checksum = io_utils::file_checksum(&target_source.path)
        .with_context(|| format!("Fingerprinting target {:?}", target_source.path))?;

    let tally = sheet::load_table(tally_source, &anchor_key)
        .with_context(|| format!("Loading {} table", TableRole::Tally))?;
    let target = sheet::load_table(target_source, &anchor_key)
        .with_context(|| format!("Loading {} table", TableRole::Target))?;
    info!(
        "Tally {:?}: {} row(s) x {} column(s); target {:?}: {} row(s) x {} column(s)",
        tally_source.path,
        tally.len(),
        tally.width(),
        target_source.path,
        target.len(),
        target.width()
    );

    let plan = plan(ctx, &tally, &target).context("Matching tally rows to target rows")?;
    let request = WriteRequest {
        path: &target_source.path,
        sheet: target_source.sheet.as_deref(),
        anchor_key: &anchor_key,
        expected_checksum: Some(checksum.as_str()),
        dry_run: ctx.dry_run,
    };
    let write = writer::update_target_file(&request, &plan.changes)
        .with_context(|| format!("Updating target {:?}", target_source.path))?;
    let report = plan.render_report(ctx, &tally, &target);
    Ok(ReconcileRun {
        plan,
        write,
        report,
    })
}

pub fn execute(args: &ReconcileArgs) -> Result<()> {
    let mut config = ReconcileConfig::load_or_default(args.config.as_deref())?;
    if let Some(anchor) = &args.anchor {
        config.anchor = anchor.clone();
    }
    if let Some(policy) = args.ambiguity {
        config.ambiguity = policy;
    }
    let ctx = ReconcileContext::new(config).with_dry_run(args.dry_run);

    let tally_source = TableSource {
        path: args.tally.clone(),
        sheet: args.tally_sheet.clone(),
        delimiter: args.delimiter,
        encoding: args.input_encoding.clone(),
    };
    let target_source = TableSource::new(args.target.clone()).with_sheet(args.target_sheet.clone());

    let outcome = run(&ctx, &tally_source, &target_source)?;
    print!("{}", outcome.report);
    if outcome.write.persisted {
        info!(
            "Reconciliation complete: {} cell(s) updated in {:?}",
            outcome.write.applied, args.target
        );
    } else if ctx.dry_run {
        info!(
            "Reconciliation complete: {} cell(s) would change (dry run)",
            outcome.write.applied
        );
    } else {
        info!("Reconciliation complete: target already agrees with tally");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CellValue;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|v| CellValue::from_field(v)).collect())
                .collect(),
        )
    }

    #[test]
    fn plan_produces_room_change_for_matching_section() {
        let tally = table(
            &["Subj", "Crs No", "Sec", "Days", "Room"],
            &[&["CS", "101", "1", "M W", "101"]],
        );
        let target = Table::new(
            ["SUBJ", "crs no", "SEC", "Days", "Room"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            vec![vec![
                CellValue::text("CS"),
                CellValue::Number(101.0),
                CellValue::text("1"),
                CellValue::text("MW"),
                CellValue::Number(205.0),
            ]],
        );

        let plan = plan(&ReconcileContext::default(), &tally, &target).expect("plan");
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].column, "room");
        assert_eq!(plan.changes[0].old_value, CellValue::Number(205.0));
        assert_eq!(plan.changes[0].new_value, CellValue::text("101"));
    }

    #[test]
    fn report_sections_follow_configuration() {
        let tally = table(&["Subj", "Crs No", "Sec", "Days"], &[&["CS", "1", "1", "M"]]);
        let target = table(&["Subj", "Crs No", "Sec", "Days"], &[&["CS", "1", "1", "M"]]);

        let quiet = ReconcileContext::new(ReconcileConfig {
            report_unmatched_tally: false,
            show_changes: false,
            ..ReconcileConfig::default()
        });
        let plan = plan(&quiet, &tally, &target).expect("plan");
        let rendered = plan.render_report(&quiet, &tally, &target);
        assert!(rendered.contains("Column mapping"));
        assert!(rendered.contains("Unmatched target rows"));
        assert!(!rendered.contains("Tally rows without a target match"));
        assert!(!rendered.contains("Ambiguous matches"));
        assert!(!rendered.contains("Planned changes"));

        let loud = ReconcileContext::new(ReconcileConfig {
            ambiguity: AmbiguityPolicy::Warn,
            ..ReconcileConfig::default()
        });
        let rendered = plan.render_report(&loud, &tally, &target);
        assert!(rendered.contains("Ambiguous matches"));
        assert!(rendered.contains("Planned changes"));
    }

    #[test]
    fn missing_key_column_fails_the_plan() {
        let tally = table(&["Subj", "Sec", "Days"], &[&["CS", "1", "M"]]);
        let target = table(&["Subj", "Crs No", "Sec", "Days"], &[&["CS", "1", "1", "M"]]);
        let err = plan(&ReconcileContext::default(), &tally, &target).expect_err("no crsno");
        assert!(err.is_structural());
    }
}
