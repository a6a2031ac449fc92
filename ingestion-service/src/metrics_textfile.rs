//! Prometheus text rendering of the run's counters, written once at exit
//! for a node-exporter textfile collector to pick up.

use std::{fs, path::Path};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder. Later calls are no-ops.
pub fn init() -> anyhow::Result<()> {
    if PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus metrics recorder: {e}"))?;

    // Ignore error if the handle was already set by a concurrent caller.
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

/// Write the current rendering to `path`, via a sibling temp file so the
/// collector never reads a partial file.
pub fn write_textfile(path: &Path) -> anyhow::Result<()> {
    let handle = PROM_HANDLE
        .get()
        .ok_or_else(|| anyhow::anyhow!("Prometheus recorder not initialized"))?;

    let tmp = path.with_extension("prom.tmp");
    fs::write(&tmp, handle.render())?;
    fs::rename(&tmp, path)?;
    Ok(())
}
