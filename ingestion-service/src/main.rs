use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::Parser;
use d0010_ingest::{config::AppConfig, db, metrics_textfile, observability, ImportOptions, Importer};

/// Import D0010 meter-reading flow files.
///
/// Each file is imported in its own transaction: a file either lands
/// completely (minus any lines reported as skipped) or not at all.
#[derive(Debug, Parser)]
#[command(name = "d0010-import", version)]
struct Args {
    /// Flow files to import, processed in the order given
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Path to the TOML config file
    #[arg(long, value_name = "PATH", env = "D0010_CONFIG")]
    config: Option<PathBuf>,

    /// Database URL, overriding `database.url` from the config
    #[arg(long, value_name = "URL")]
    database_url: Option<String>,

    /// Log per-line debug detail (ignored records, short lines)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    observability::init_tracing(args.verbose);

    let mut cfg = AppConfig::load(args.config.as_deref())?;
    if let Some(url) = args.database_url {
        cfg.database.url = url;
    }

    let textfile = cfg.metrics.textfile_path.clone();
    if textfile.is_some() {
        metrics_textfile::init()?;
    }

    let pool = db::connect(&cfg.database)
        .await
        .map_err(|e| anyhow::anyhow!("failed to open database '{}': {e}", cfg.database.url))?;

    let importer = Importer::new(pool.clone(), ImportOptions::from(&cfg.import));
    let mut failed = 0usize;

    for (path, result) in importer.import_files(args.files.as_slice()).await {
        match result {
            Ok(report) => tracing::info!(
                file = %path.display(),
                imported = report.imported(),
                created = report.created,
                updated = report.updated,
                skipped = report.skipped.len(),
                "successfully imported"
            ),
            Err(e) if e.rolled_back() => {
                failed += 1;
                tracing::error!(file = %path.display(), error = %e, "import failed, no changes kept");
            }
            Err(e) => {
                failed += 1;
                tracing::error!(file = %path.display(), error = %e, "file skipped");
            }
        }
    }

    pool.close().await;

    if let Some(path) = textfile {
        if let Err(e) = metrics_textfile::write_textfile(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to write metrics textfile");
        }
    }

    Ok(if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
