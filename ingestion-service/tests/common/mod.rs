#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use d0010_ingest::{config::DatabaseConfig, db, ImportOptions, Importer};
use sqlx::SqlitePool;
use tempfile::TempDir;

pub const SAMPLE_FLOW: [&str; 4] = [
    "ZHV|P|NDLO001|UDMS|Z|20240101|202401011430|",
    "030|1|1234567890123|S|METER001|20240101|S|kWh|00000|1234.56|",
    "030|1|1234567890123|S|METER001|20240102|S|kWh|00000|1235.67|",
    "ZPT|000003|",
];

pub struct Harness {
    pub dir: TempDir,
    pub pool: SqlitePool,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_options(ImportOptions::default()).await.0
    }

    pub async fn with_options(options: ImportOptions) -> (Self, Importer) {
        let dir = tempfile::tempdir().unwrap();
        let pool = db::connect(&database_config(dir.path())).await.unwrap();
        let importer = Importer::new(pool.clone(), options);
        (Self { dir, pool }, importer)
    }

    /// A second, independent pool on the same database file.
    pub async fn connect_again(&self) -> SqlitePool {
        db::connect(&database_config(self.dir.path())).await.unwrap()
    }

    pub fn importer(&self) -> Importer {
        Importer::new(self.pool.clone(), ImportOptions::default())
    }

    pub fn write_flow_file(&self, name: &str, lines: &[&str]) -> PathBuf {
        write_lines(self.dir.path(), name, lines)
    }
}

fn database_config(dir: &Path) -> DatabaseConfig {
    DatabaseConfig {
        url: format!("sqlite://{}", dir.join("readings.db").display()),
        ..DatabaseConfig::default()
    }
}

pub fn write_lines(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut text = lines.join("\n");
    text.push('\n');
    fs::write(&path, text).unwrap();
    path
}
