use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

pub const MEMORY_DSN: &str = "sqlite::memory:";

/// Pick the DSN to connect with: `--mock` forces in-memory SQLite,
/// SQLite file paths are made absolute against `base_dir`.
pub fn resolve_dsn(configured: &str, mock: bool, base_dir: &Path) -> Result<String> {
    if mock {
        return Ok(MEMORY_DSN.to_string());
    }
    let dsn = configured.trim();
    if dsn.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if dsn.starts_with("sqlite:") {
        absolutize_sqlite_dsn(dsn, base_dir)
    } else {
        Ok(dsn.to_string())
    }
}

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// In-memory DSNs are kept as-is; backslashes become forward slashes.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
    if db::is_memory_dsn(dsn) {
        return Ok(dsn.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    let mut out = format!("sqlite://{}", p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}
