pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod frame;
pub mod history;
pub mod io_utils;
pub mod loader;
pub mod mapping;
pub mod profile;
pub mod replay;
pub mod session;
pub mod table;
pub mod transfer;
pub mod usage;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, ColumnsArgs, Commands, GlobalArgs, HistoryArgs, TableArgs, TransferArgs},
    config::AppConfig,
    error::MapperError,
    history::HistoryLedger,
    loader::LoadOptions,
    session::MappingSession,
    usage::UsageStatistics,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("column_mapper", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = resolve_config(&cli.global)?;
    match cli.command {
        Commands::Columns(args) => handle_columns(config, &args),
        Commands::Transfer(args) => handle_transfer(config, &args),
        Commands::History(args) => handle_history(&config, &args),
        Commands::Stats => handle_stats(&config),
    }
}

fn resolve_config(global: &GlobalArgs) -> Result<AppConfig> {
    let mut config = match &global.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(history) = &global.history {
        config.history_file = history.clone();
    }
    if let Some(stats) = &global.stats_file {
        config.stats_file = stats.clone();
    }
    config
        .ensure_directories()
        .with_context(|| format!("Creating directory for {:?}", config.history_file))?;
    debug!("Using configuration {config:?}");
    Ok(config)
}

fn open_session(config: AppConfig, tables: &TableArgs) -> Result<MappingSession> {
    let encoding = io_utils::resolve_encoding(tables.input_encoding.as_deref())?;
    let options = LoadOptions {
        delimiter: tables.delimiter,
        encoding,
    };
    let mut session = MappingSession::with_load_options(config, options);
    session
        .load_tables(&tables.source, &tables.destination)
        .context("Failed to load files")?;
    Ok(session)
}

fn handle_columns(config: AppConfig, args: &ColumnsArgs) -> Result<()> {
    let samples = args.samples.unwrap_or(config.sample_values);
    let session = open_session(config, &args.tables)?;
    let mappings = session.mappings();

    let rows = mappings
        .source_columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            vec![
                (idx + 1).to_string(),
                column.clone(),
                session.preview_with(column, samples),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(
        &["#", "source column", "sample"].map(String::from),
        &rows,
    );
    println!();

    let rows = mappings
        .destination_columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| vec![(idx + 1).to_string(), column.clone()])
        .collect::<Vec<_>>();
    table::print_table(&["#", "destination column"].map(String::from), &rows);
    Ok(())
}

fn handle_transfer(config: AppConfig, args: &TransferArgs) -> Result<()> {
    let mut session = open_session(config, &args.tables)?;

    if let Some(number) = args.session {
        let sessions = session
            .list_history_sessions()
            .context("Loading mapping history")?;
        let selected = number
            .checked_sub(1)
            .and_then(|idx| sessions.get(idx))
            .ok_or_else(|| {
                anyhow!(
                    "History session {number} not found; {} session(s) recorded",
                    sessions.len()
                )
            })?;
        session
            .apply_session(selected)
            .with_context(|| format!("Replaying history session {number}"))?;
    } else {
        for (destination, source) in &args.mappings {
            let resolved = session
                .on_mapping_changed(destination, source)
                .with_context(|| format!("Mapping '{destination}' <- '{source}'"))?;
            if resolved.is_none() {
                bail!(
                    "Source column '{source}' not found in {:?}",
                    args.tables.source
                );
            }
        }
    }

    if args.dry_run {
        print!("{}", session.mapping_preview());
        let outcome = session.transfer()?;
        print!("{}", table::render_preview(&outcome.table, args.preview_rows));
        info!(
            "Dry run: {} column(s) would be copied into {} row(s)",
            outcome.copied.len(),
            outcome.table.row_count()
        );
        return Ok(());
    }

    let output = match &args.output {
        Some(path) => path.clone(),
        None => session
            .default_output_path()
            .ok_or(MapperError::TablesNotLoaded)?,
    };
    let outcome = session.commit(&output)?;
    for mapping in &outcome.copied {
        info!("✓ {} ← {}", mapping.destination, mapping.source);
    }
    for mapping in &outcome.skipped {
        warn!(
            "Skipped {} ← {}: source column no longer present",
            mapping.destination, mapping.source
        );
    }
    if let Some(warning) = &outcome.history_warning {
        warn!("{warning}");
    }
    info!(
        "Wrote {} row(s) to {:?}",
        outcome.row_count, outcome.output_path
    );
    Ok(())
}

fn handle_history(config: &AppConfig, args: &HistoryArgs) -> Result<()> {
    let ledger = HistoryLedger::new(config.history_file.clone());
    let sessions = match ledger.load_history() {
        Ok(sessions) => sessions,
        Err(err) if err.is_informational() => {
            println!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    print!("{}", table::render_sessions(&sessions));
    if args.details {
        for (idx, session) in sessions.iter().enumerate() {
            println!();
            println!("Session {}:", idx + 1);
            println!("{}", session.describe());
        }
    }
    info!("Listed {} session(s) from {:?}", sessions.len(), ledger.path());
    Ok(())
}

fn handle_stats(config: &AppConfig) -> Result<()> {
    let stats = UsageStatistics::load(config.stats_file.clone());
    let counters = stats.counters();
    let rows = vec![
        vec!["mappings created".to_string(), counters.mappings_created.to_string()],
        vec!["files processed".to_string(), counters.files_processed.to_string()],
        vec![
            "columns mapped".to_string(),
            counters.total_columns_mapped.to_string(),
        ],
        vec![
            "sessions completed".to_string(),
            counters.sessions_completed.to_string(),
        ],
        vec![
            "last activity".to_string(),
            counters.last_activity.clone().unwrap_or_default(),
        ],
    ];
    table::print_table(&["statistic", "value"].map(String::from), &rows);
    Ok(())
}
