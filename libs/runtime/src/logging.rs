use crate::config::{LoggingConfig, Section};
use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::filter::Targets;

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

// -------- level helpers --------
fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

// -------- rotating writer for files --------
#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for RotWriter {
    type Writer = RotWriterHandle;
    fn make_writer(&'a self) -> Self::Writer {
        RotWriterHandle(self.0.clone())
    }
}

#[derive(Clone)]
struct RotWriterHandle(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriterHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().unwrap().flush()
    }
}

// -------- path resolution helpers --------

/// Resolve a log file path against `base_dir` (home_dir).
/// Absolute paths are kept as-is; relative paths are joined with `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

/// Create a rotating writer for log files, ensuring the parent directory exists.
fn create_rotating_writer(
    log_path: &Path,
    max_bytes: usize,
    max_backups: usize,
) -> Result<RotWriter, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(FileLimit::MaxFiles(max_backups)),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None, // file permissions (Unix only)
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

// -------- target construction --------

/// Build `Targets` filters from the config sections, one for the console and
/// one for the file layer. The "default" section sets the catch-all level;
/// any other section keys are treated as crate/target prefixes.
fn build_targets(cfg: &LoggingConfig, pick: impl Fn(&Section) -> &str) -> Targets {
    let default_level = cfg
        .get("default")
        .and_then(|s| parse_tracing_level(pick(s)))
        .map(LevelFilter::from_level)
        .unwrap_or(LevelFilter::OFF);

    let mut targets = Targets::new().with_default(default_level);
    for (name, section) in cfg.iter().filter(|(k, _)| k.as_str() != "default") {
        let level = parse_tracing_level(pick(section))
            .map(LevelFilter::from_level)
            .unwrap_or(LevelFilter::OFF);
        targets = targets.with_target(name.clone(), level);
    }
    targets
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: LoggingConfig containing the logging sections
/// - `base_dir`: base directory used to resolve relative log file paths (usually server.home_dir)
///
/// Console output is human-readable; the file output (taken from the
/// "default" section, if it names a file) is JSON for log shipping.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` *before* installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        init_default_logging();
        return;
    }

    use tracing_subscriber::{fmt, prelude::*, Registry};

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(build_targets(cfg, |s| &s.console_level));

    let file_writer = cfg.get("default").and_then(|section| {
        if section.file.trim().is_empty() {
            return None;
        }
        let max_bytes = section.max_size_mb.unwrap_or(100) as usize * 1024 * 1024;
        let max_backups = section.max_backups.unwrap_or(3);
        let log_path = resolve_log_path(&section.file, base_dir);
        match create_rotating_writer(&log_path, max_bytes, max_backups) {
            Ok(writer) => Some(writer),
            Err(e) => {
                eprintln!(
                    "Failed to initialize log file '{}': {e}",
                    log_path.to_string_lossy()
                );
                None
            }
        }
    });

    match file_writer {
        Some(writer) => {
            let file_layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(writer)
                .with_filter(build_targets(cfg, |s| &s.file_level));
            let _ = Registry::default()
                .with(console_layer)
                .with(file_layer)
                .try_init();
        }
        None => {
            let _ = Registry::default().with(console_layer).try_init();
        }
    }
}

fn init_default_logging() {
    use tracing_subscriber::fmt;
    let _ = fmt()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}

// =================== tests ===================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;

    #[test]
    fn test_logging_level_parsing() {
        assert_eq!(parse_tracing_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_tracing_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_tracing_level("Info"), Some(Level::INFO));
        assert_eq!(parse_tracing_level("warn"), Some(Level::WARN));
        assert_eq!(parse_tracing_level("ERROR"), Some(Level::ERROR));
        assert_eq!(parse_tracing_level("off"), None);
        assert_eq!(parse_tracing_level("none"), None);
        assert_eq!(parse_tracing_level("invalid"), Some(Level::INFO)); // defaults to INFO
    }

    #[test]
    fn test_file_paths_resolved_against_home_dir() {
        let tmp = tempdir().unwrap();
        let base_dir = tmp.path();

        let resolved = resolve_log_path("logs/test.log", base_dir);
        assert!(resolved.starts_with(base_dir));
        assert!(resolved.ends_with("logs/test.log"));

        let abs = base_dir.join("already-absolute.log");
        let resolved = resolve_log_path(&abs.to_string_lossy(), Path::new("/elsewhere"));
        assert_eq!(resolved, abs);
    }

    #[test]
    fn test_create_rotating_writer_creates_parent() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("nested/dir/app.log");

        let res = create_rotating_writer(&p, 128 * 1024, 2);
        assert!(res.is_ok(), "writer should be created");
        assert!(p.parent().unwrap().exists(), "parent dir must be created");
    }

    #[test]
    fn test_build_targets_uses_default_and_sections() {
        let mut cfg = default_logging_config();
        cfg.insert(
            "commerce".into(),
            Section {
                console_level: "debug".into(),
                file: String::new(),
                file_level: "off".into(),
                max_backups: None,
                max_size_mb: None,
            },
        );

        let targets = build_targets(&cfg, |s| &s.console_level);
        // The "default" section default is info; commerce is debug.
        let rendered = format!("{targets:?}");
        assert!(rendered.contains("commerce"));
    }
}
