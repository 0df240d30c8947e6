use crate::config::{LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Targets, fmt};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";

/// Parse a level name; unknown names fall back to INFO, "off"/"none" disable output.
fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" | "" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Returns true if target == prefix or target starts with "prefix::"
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

// -------- rotating file sinks --------

type SharedRotate = Arc<Mutex<FileRotate<AppendTimestamp>>>;

struct FileSink(Option<SharedRotate>);

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &self.0 {
            Some(rot) => rot
                .lock()
                .map_err(|_| std::io::Error::other("log file lock poisoned"))?
                .write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &self.0 {
            Some(rot) => rot
                .lock()
                .map_err(|_| std::io::Error::other("log file lock poisoned"))?
                .flush(),
            None => Ok(()),
        }
    }
}

/// Routes each record to the file of the longest matching subsystem prefix,
/// falling back to the default file.
#[derive(Default)]
struct FileRouter {
    default: Option<SharedRotate>,
    by_prefix: Vec<(String, SharedRotate)>,
}

impl FileRouter {
    fn resolve(&self, target: &str) -> Option<SharedRotate> {
        self.by_prefix
            .iter()
            .filter(|(prefix, _)| matches_prefix(target, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, rot)| rot.clone())
            .or_else(|| self.default.clone())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = FileSink;

    fn make_writer(&'a self) -> Self::Writer {
        FileSink(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        FileSink(self.resolve(meta.target()))
    }
}

/// Relative log paths are resolved against `base_dir` (the server home dir).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

/// Rotation threshold in bytes; absurd sizes clamp instead of overflowing.
fn max_file_bytes(section: &Section) -> usize {
    let bytes = section
        .max_size_mb
        .unwrap_or(100)
        .saturating_mul(1024 * 1024);
    usize::try_from(bytes).unwrap_or(usize::MAX)
}

fn open_rotating(section: &Section, base_dir: &Path) -> std::io::Result<Option<SharedRotate>> {
    if section.file.trim().is_empty() {
        return Ok(None);
    }
    let path = resolve_log_path(section.file.trim(), base_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let max_files = section.max_backups.unwrap_or(3);
    let rot = FileRotate::new(
        &path,
        AppendTimestamp::default(FileLimit::MaxFiles(max_files)),
        ContentLimit::BytesSurpassed(max_file_bytes(section)),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(Some(Arc::new(Mutex::new(rot))))
}

// -------- filters --------

/// Per-subsystem level filters for one sink. The "default" section sets the
/// fallback level for every target no other section claims.
fn build_targets(cfg: &LoggingConfig, level_of: impl Fn(&Section) -> LevelFilter) -> Targets {
    let default_level = cfg
        .get(DEFAULT_SECTION)
        .map(&level_of)
        .unwrap_or(LevelFilter::OFF);

    cfg.iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
        .fold(Targets::new().with_default(default_level), |t, (name, s)| {
            t.with_target(name.clone(), level_of(s))
        })
}

fn file_level(section: &Section) -> LevelFilter {
    if section.file.trim().is_empty() {
        LevelFilter::OFF
    } else {
        parse_level(&section.file_level)
    }
}

fn build_file_router(cfg: &LoggingConfig, base_dir: &Path) -> FileRouter {
    let mut router = FileRouter::default();
    let mut opened: HashMap<PathBuf, SharedRotate> = HashMap::new();

    let mut open = |name: &str, section: &Section| -> Option<SharedRotate> {
        let path = resolve_log_path(section.file.trim(), base_dir);
        if let Some(existing) = opened.get(&path) {
            return Some(existing.clone());
        }
        match open_rotating(section, base_dir) {
            Ok(Some(rot)) => {
                opened.insert(path, rot.clone());
                Some(rot)
            }
            Ok(None) => None,
            Err(e) => {
                eprintln!(
                    "Failed to open log file '{}' for '{}': {}",
                    path.display(),
                    name,
                    e
                );
                None
            }
        }
    };

    for (name, section) in cfg {
        let Some(rot) = open(name, section) else {
            continue;
        };
        if name == DEFAULT_SECTION {
            router.default = Some(rot);
        } else {
            router.by_prefix.push((name.clone(), rot));
        }
    }
    router
}

// -------- public init --------

/// Initialize the global subscriber from a logging configuration.
/// Console output is human readable, file output is JSON lines.
/// `base_dir` resolves relative log file paths (usually `server.home_dir`).
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

    // Bridge `log` → `tracing` before installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let console_layer = fmt::layer()
        .with_ansi(std::io::stdout().is_terminal())
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(build_targets(cfg, |s| parse_level(&s.console_level)));

    let router = build_file_router(cfg, base_dir);
    let file_layer = (!router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(router)
            .with_filter(build_targets(cfg, file_level))
    });

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn section(console: &str, file: &str, file_level: &str) -> Section {
        Section {
            console_level: console.into(),
            file: file.into(),
            file_level: file_level.into(),
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn rotation_size_saturates() {
        let mut s = section("info", "logs/app.log", "debug");
        assert_eq!(max_file_bytes(&s), 1024 * 1024);

        s.max_size_mb = None;
        assert_eq!(max_file_bytes(&s), 100 * 1024 * 1024);

        s.max_size_mb = Some(u64::MAX);
        assert_eq!(max_file_bytes(&s), usize::MAX);

        // opening a sink with an absurd size must not panic
        let tmp = tempdir().unwrap();
        assert!(open_rotating(&s, tmp.path()).unwrap().is_some());
    }

    #[test]
    fn levels_parse_with_info_fallback() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::DEBUG);
        assert_eq!(parse_level("off"), LevelFilter::OFF);
        assert_eq!(parse_level("none"), LevelFilter::OFF);
        assert_eq!(parse_level(""), LevelFilter::INFO);
        assert_eq!(parse_level("verbose"), LevelFilter::INFO);
    }

    #[test]
    fn prefix_matching_respects_module_boundaries() {
        assert!(matches_prefix("classifieds", "classifieds"));
        assert!(matches_prefix("classifieds::api::rest", "classifieds"));
        assert!(!matches_prefix("classifieds_server", "classifieds"));
        assert!(!matches_prefix("sqlx::query", "classifieds"));
    }

    #[test]
    fn file_router_prefers_longest_prefix_then_default() {
        let tmp = tempdir().unwrap();
        let mut cfg = LoggingConfig::new();
        cfg.insert("default".into(), section("info", "logs/app.log", "debug"));
        cfg.insert("sqlx".into(), section("warn", "logs/sql.log", "info"));
        cfg.insert("classifieds".into(), section("info", "", "debug"));

        let router = build_file_router(&cfg, tmp.path());
        assert!(router.default.is_some());
        // sections without a file do not get a writer
        assert_eq!(router.by_prefix.len(), 1);

        let sql = router.resolve("sqlx::query").unwrap();
        let other = router.resolve("classifieds::domain").unwrap();
        assert!(!Arc::ptr_eq(&sql, &other));
        assert!(Arc::ptr_eq(&other, router.default.as_ref().unwrap()));
        assert!(tmp.path().join("logs").is_dir());
    }

    #[test]
    fn sections_sharing_a_file_share_a_writer() {
        let tmp = tempdir().unwrap();
        let mut cfg = LoggingConfig::new();
        cfg.insert("default".into(), section("info", "logs/app.log", "debug"));
        cfg.insert("axum".into(), section("info", "logs/app.log", "debug"));

        let router = build_file_router(&cfg, tmp.path());
        let axum = router.resolve("axum::serve").unwrap();
        assert!(Arc::ptr_eq(&axum, router.default.as_ref().unwrap()));
    }

    #[test]
    fn sink_without_file_swallows_writes() {
        let mut sink = FileSink(None);
        assert_eq!(sink.write(b"dropped").unwrap(), 7);
        sink.flush().unwrap();
    }

    #[test]
    fn empty_router_when_no_files_configured() {
        let tmp = tempdir().unwrap();
        let mut cfg = LoggingConfig::new();
        cfg.insert("default".into(), section("debug", "  ", "debug"));
        assert!(build_file_router(&cfg, tmp.path()).is_empty());
    }
}
