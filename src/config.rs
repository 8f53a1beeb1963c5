use std::path::{Path, PathBuf};
use anyhow::Context;
use serde::Deserialize;
use crate::source::SourceKind;

pub const DEFAULT_CONFIG_FILE: &str = "WinPostmortem.toml";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat { Text, Json }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel { Error, Warn, Info, Debug, Trace }

/// Optional settings file. Command-line flags take precedence over every key.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub output_dir: Option<String>,
    pub source: Option<SourceKind>,
    pub evtx_dir: Option<String>,
    pub log_level: Option<LogLevel>,
    pub log_format: Option<LogFormat>,
    pub no_color: Option<bool>,
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.to_string_lossy()))?;
    let cfg = toml::from_str::<AppConfig>(&s).with_context(|| format!("parsing {}", path.to_string_lossy()))?;
    Ok(cfg)
}

/// An explicit `--config` must load; the default file is used only when present. A file that
/// fails to load is replaced by defaults and its error handed back for reporting once logging
/// is up.
pub fn load_config_or_default(explicit: Option<&str>) -> (AppConfig, Option<anyhow::Error>) {
    let path = match explicit {
        Some(p) => Path::new(p),
        None => {
            let def = Path::new(DEFAULT_CONFIG_FILE);
            if !def.is_file() { return (AppConfig::default(), None); }
            def
        }
    };
    match load_config(path) { Ok(c) => (c, None), Err(e) => (AppConfig::default(), Some(e)) }
}

pub fn init_logging(quiet: bool, verbose: u8, level: Option<LogLevel>, format: Option<LogFormat>) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if let Some(lvl) = level {
        let f = match lvl { LogLevel::Error => log::LevelFilter::Error, LogLevel::Warn => log::LevelFilter::Warn, LogLevel::Info => log::LevelFilter::Info, LogLevel::Debug => log::LevelFilter::Debug, LogLevel::Trace => log::LevelFilter::Trace };
        builder.filter_level(f);
    } else if verbose > 0 {
        let f = if verbose >= 3 { log::LevelFilter::Trace } else if verbose == 2 { log::LevelFilter::Debug } else { log::LevelFilter::Info };
        builder.filter_level(f);
    }
    match format.unwrap_or(LogFormat::Text) {
        LogFormat::Json => {
            builder.format(|buf, record| {
                use std::io::Write;
                let obj = serde_json::json!({
                    "ts": chrono::Local::now().to_rfc3339(),
                    "level": record.level().to_string(),
                    "target": record.target(),
                    "msg": record.args().to_string(),
                });
                writeln!(buf, "{}", obj)
            });
        }
        LogFormat::Text => {
            builder.format(|buf, record| {
                use std::io::Write;
                writeln!(buf, "[{:<5} {}] {}", record.level(), chrono::Local::now().format("%H:%M:%S"), record.args())
            });
        }
    }
    if let Err(e) = builder.try_init() { eprintln!("Logger already initialised: {}", e); }
}

/// `%USERPROFILE%\Downloads` on Windows, `$HOME/Downloads` elsewhere.
pub fn default_output_dir() -> PathBuf {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(var).map(|h| PathBuf::from(h).join("Downloads")).unwrap_or_else(|| PathBuf::from("."))
}

/// Creates the requested directory, falling back to `default` and then to the working
/// directory. Failures are warnings only.
pub fn resolve_output_dir(requested: Option<&Path>, default: &Path) -> PathBuf {
    if let Some(p) = requested {
        match std::fs::create_dir_all(p) {
            Ok(()) => return p.to_path_buf(),
            Err(e) => {
                log::warn!("Cannot use output directory {}: {}", p.to_string_lossy(), e);
                crate::status::warn(&format!("Could not create {}, saving to {} instead", p.to_string_lossy(), default.to_string_lossy()));
            }
        }
    }
    match std::fs::create_dir_all(default) {
        Ok(()) => default.to_path_buf(),
        Err(e) => {
            log::warn!("Cannot use default output directory {}: {}", default.to_string_lossy(), e);
            PathBuf::from(".")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("cfg.toml");
        std::fs::write(&p, "output_dir = 'D:/reports'\nsource = 'evtx'\nevtx_dir = 'E:/logs'\nlog_format = 'json'\n").unwrap();
        let c = load_config(&p).unwrap();
        assert_eq!(c.output_dir.as_deref(), Some("D:/reports"));
        assert_eq!(c.source, Some(SourceKind::Evtx));
        assert_eq!(c.log_format, Some(LogFormat::Json));
        assert!(c.no_color.is_none());
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("cfg.toml");
        std::fs::write(&p, "outputdir = 'x'\n").unwrap();
        assert!(load_config(&p).is_err());
        let (cfg, err) = load_config_or_default(Some(&p.to_string_lossy()));
        assert!(cfg.output_dir.is_none());
        assert!(format!("{:#}", err.unwrap()).contains("parsing"));
    }

    #[test]
    fn missing_explicit_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (cfg, err) = load_config_or_default(Some(&dir.path().join("nope.toml").to_string_lossy()));
        assert!(cfg.source.is_none());
        assert!(format!("{:#}", err.unwrap()).contains("reading"));
    }

    #[test]
    fn creates_requested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let want = dir.path().join("a").join("b");
        let got = resolve_output_dir(Some(&want), &dir.path().join("default"));
        assert_eq!(got, want);
        assert!(want.is_dir());
    }

    #[test]
    fn falls_back_when_dir_cannot_be_created() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("blocker");
        std::fs::write(&file, b"x").unwrap();
        let default = dir.path().join("Downloads");
        let got = resolve_output_dir(Some(&file.join("sub")), &default);
        assert_eq!(got, default);
        assert!(default.is_dir());
    }
}
