pub mod cli;
pub mod columns;
pub mod config;
pub mod data;
pub mod differ;
pub mod error;
pub mod io_utils;
pub mod matcher;
pub mod preview;
pub mod reconcile;
pub mod report;
pub mod sheet;
pub mod table;
pub mod values;
pub mod writer;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, info, warn};

use crate::{
    cli::{Cli, Commands},
    columns::{CanonicalColumns, ColumnMapping},
    config::{ReconcileConfig, UniquenessCheck},
    error::TableRole,
    matcher::KeyIndices,
    sheet::TableSource,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("tally_sync", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Reconcile(args) => reconcile::execute(&args),
        Commands::Columns(args) => handle_columns(&args),
        Commands::Duplicates(args) => handle_duplicates(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::InitConfig(args) => handle_init_config(&args),
    }
}

fn handle_columns(args: &cli::ColumnsArgs) -> Result<()> {
    let anchor_key = columns::normalize_column_name(args.anchor.as_str());
    let source = |path: &std::path::Path, sheet: &Option<String>| TableSource {
        path: path.to_path_buf(),
        sheet: sheet.clone(),
        delimiter: args.delimiter,
        encoding: args.input_encoding.clone(),
    };
    let tally = sheet::load_table(&source(&args.tally, &args.tally_sheet), &anchor_key)
        .with_context(|| format!("Loading tally from {:?}", args.tally))?;
    let target = sheet::load_table(&source(&args.target, &args.target_sheet), &anchor_key)
        .with_context(|| format!("Loading target from {:?}", args.target))?;

    let mapping = ColumnMapping::build(
        &CanonicalColumns::from_headers(tally.headers()),
        &CanonicalColumns::from_headers(target.headers()),
    );
    print!("{}", report::render_column_mapping(&mapping));
    info!(
        "Compared {} tally column(s) with {} target column(s)",
        tally.width(),
        target.width()
    );
    Ok(())
}

fn handle_duplicates(args: &cli::DuplicatesArgs) -> Result<()> {
    let mut config = ReconcileConfig::load_or_default(args.config.as_deref())?;
    if let Some(anchor) = &args.anchor {
        config.anchor = anchor.clone();
    }
    if let Some(uniqueness) = args.uniqueness {
        config.uniqueness = uniqueness;
    }
    config.validate()?;
    let source = TableSource {
        path: args.input.clone(),
        sheet: args.sheet.clone(),
        delimiter: args.delimiter,
        encoding: args.input_encoding.clone(),
    };
    let table = sheet::load_table(&source, &config.anchor_key())
        .with_context(|| format!("Loading table from {:?}", args.input))?;

    let full_rows = report::find_duplicate_rows(&table);
    print!(
        "{}",
        report::render_duplicates("Duplicate rows", &table, &full_rows)
    );

    let canonical = CanonicalColumns::from_headers(table.headers());
    let (title, groups) = match config.uniqueness {
        UniquenessCheck::IdentityKey => {
            match KeyIndices::resolve(&canonical, &config.key_columns, TableRole::Tally) {
                Ok(indices) => (
                    "Rows sharing an identity key",
                    matcher::duplicate_identity_keys(&table, &indices),
                ),
                Err(err) => {
                    warn!("Skipping identity-key check: {err}");
                    info!("{} duplicate row(s) in {:?}", full_rows.len(), args.input);
                    return Ok(());
                }
            }
        }
        UniquenessCheck::LeadingColumnsAndRoom => {
            let Some(room) = canonical.position("room") else {
                warn!("Skipping uniqueness check: no 'Room' column in {:?}", args.input);
                info!("{} duplicate row(s) in {:?}", full_rows.len(), args.input);
                return Ok(());
            };
            let mut columns = (0..table.width().min(3)).collect::<Vec<_>>();
            columns.push(room);
            (
                "Rows sharing the first three columns and Room",
                matcher::duplicate_column_values(&table, &columns),
            )
        }
    };
    println!();
    print!("{}", report::render_key_duplicates(title, &table, &groups));
    info!(
        "{} duplicate row(s), {} key group(s) in {:?}",
        full_rows.len(),
        groups.len(),
        args.input
    );
    Ok(())
}

fn handle_init_config(args: &cli::InitConfigArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "{:?} already exists; pass --force to overwrite it",
            args.output
        );
    }
    ReconcileConfig::default()
        .save(&args.output)
        .with_context(|| format!("Writing config to {:?}", args.output))?;
    info!("Default configuration written to {:?}", args.output);
    Ok(())
}
