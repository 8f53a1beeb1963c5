//! The fixed, ordered list of checks each report runs. Every entry becomes one report
//! section, evaluated independently of the others.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::OnceLock;
use crate::record::LogRecord;
use crate::source::{IdFilter, LogQuery};

pub const SYSTEM_LOG: &str = "System";
pub const APPLICATION_LOG: &str = "Application";
pub const KERNEL_POWER: &str = "Microsoft-Windows-Kernel-Power";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CategoryKey {
    ThermalZoneWarning,
    ProcessorThrottle,
    HardwareError,
    TemperatureMention,
    ShutdownDetail,
    PowerSupplyAnomaly,
    GpuDriverTimeout,
    UnexpectedShutdown,
    LegacyUnexpectedShutdown,
    BugcheckBsod,
    RecentCriticalErrors,
    DriverErrors,
    DiskErrors,
    MemoryDiagnostics,
    ApplicationCrashes,
}

/// Checks the structured filter cannot express, applied to each returned record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostFilter {
    /// Case-insensitive substring match on the message.
    MessageContainsAny(&'static [&'static str]),
    /// Provider name or message mentions a driver.
    DriverMention,
    /// Display driver resets, TDRs, and known GPU kernel modules.
    GpuTimeout,
    /// Crash wording in the message, or the Application Error event ID.
    AppCrash,
}

const GPU_MODULES: &[&str] = &["nvlddmkm", "amdkmdag", "amdkmdap", "atikmdag", "atikmpag", "igdkmd64", "igdkmdn64", "igfx", "dxgkrnl", "dxgmms"];

fn gpu_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)display driver|stopped responding and has (successfully )?recovered|\btdr\b|video_tdr|timeout detection and recovery").expect("static regex"))
}

fn crash_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)crash|stopped working|faulting application").expect("static regex"))
}

impl PostFilter {
    pub fn accepts(&self, r: &LogRecord) -> bool {
        match self {
            PostFilter::MessageContainsAny(words) => {
                let m = r.message.to_lowercase();
                words.iter().any(|w| m.contains(&w.to_lowercase()))
            }
            PostFilter::DriverMention => r.provider.to_lowercase().contains("driver") || r.message.to_lowercase().contains("driver"),
            PostFilter::GpuTimeout => {
                if r.provider.contains("Display") || gpu_regex().is_match(&r.message) { return true; }
                let p = r.provider.to_lowercase();
                let m = r.message.to_lowercase();
                GPU_MODULES.iter().any(|g| p.contains(g) || m.contains(g))
            }
            PostFilter::AppCrash => r.event_id == 1000 || crash_regex().is_match(&r.message),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classifier {
    /// Triggered when any record survives filtering.
    Presence,
    /// Records carry a bugcheck payload; triggered only by video-related codes.
    Bugcheck,
}

#[derive(Clone, Debug)]
pub struct QuerySpec {
    pub key: CategoryKey,
    pub label: &'static str,
    pub log: &'static str,
    pub provider: Option<&'static str>,
    pub ids: IdFilter,
    /// Empty accepts every level.
    pub levels: &'static [u8],
    pub lookback_days: Option<i64>,
    pub max_results: usize,
    /// Records printed in the report; the remainder is summarised as a count.
    pub display_limit: usize,
    pub post_filter: Option<PostFilter>,
    pub classifier: Classifier,
    pub found: &'static str,
    pub none_found: &'static str,
}

impl QuerySpec {
    pub fn to_query(&self, now: DateTime<Utc>) -> LogQuery {
        LogQuery {
            log: self.log,
            provider: self.provider,
            ids: self.ids,
            levels: self.levels,
            since: self.lookback_days.map(|d| now - Duration::days(d)),
            max_results: self.max_results,
        }
    }

    pub fn keep(&self, r: &LogRecord) -> bool { self.post_filter.map(|f| f.accepts(r)).unwrap_or(true) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind { Overheating, CrashHang }

impl ReportKind {
    pub fn title(&self) -> &'static str {
        match self { ReportKind::Overheating => "OVERHEATING DIAGNOSTIC REPORT", ReportKind::CrashHang => "CRASH / HANG DIAGNOSTIC REPORT" }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self { ReportKind::Overheating => "Overheating_Report", ReportKind::CrashHang => "Crash_Hang_Report" }
    }

    pub fn catalog(&self) -> &'static [QuerySpec] {
        match self { ReportKind::Overheating => OVERHEAT_CATALOG, ReportKind::CrashHang => HANG_CATALOG }
    }
}

const fn spec(key: CategoryKey, label: &'static str, log: &'static str, provider: Option<&'static str>, ids: IdFilter, max_results: usize, found: &'static str, none_found: &'static str) -> QuerySpec {
    QuerySpec { key, label, log, provider, ids, levels: &[], lookback_days: None, max_results, display_limit: max_results, post_filter: None, classifier: Classifier::Presence, found, none_found }
}

pub static OVERHEAT_CATALOG: &[QuerySpec] = &[
    spec(CategoryKey::ThermalZoneWarning, "THERMAL ZONE WARNINGS", SYSTEM_LOG, Some(KERNEL_POWER), IdFilter::Only(&[2]), 20,
        "Thermal zone warnings found", "No thermal zone warnings found."),
    spec(CategoryKey::ProcessorThrottle, "CPU THROTTLING EVENTS", SYSTEM_LOG, Some("Microsoft-Windows-Kernel-Processor-Power"), IdFilter::Only(&[37, 56]), 20,
        "CPU throttling events found", "No CPU throttling events found."),
    spec(CategoryKey::HardwareError, "HARDWARE ERRORS (WHEA)", SYSTEM_LOG, Some("Microsoft-Windows-WHEA-Logger"), IdFilter::Any, 20,
        "Hardware errors found", "No hardware errors found."),
    QuerySpec {
        display_limit: 20,
        post_filter: Some(PostFilter::MessageContainsAny(&["temperature", "thermal", "overheat", "throttle"])),
        ..spec(CategoryKey::TemperatureMention, "TEMPERATURE-RELATED EVENTS", SYSTEM_LOG, None, IdFilter::Any, 1000,
            "Temperature-related events found", "No temperature-related events found.")
    },
    QuerySpec {
        classifier: Classifier::Bugcheck,
        ..spec(CategoryKey::ShutdownDetail, "UNEXPECTED SHUTDOWN ANALYSIS (EVENT 41)", SYSTEM_LOG, Some(KERNEL_POWER), IdFilter::Only(&[41]), 10,
            "Unexpected shutdowns found", "No unexpected shutdowns found.")
    },
    spec(CategoryKey::PowerSupplyAnomaly, "POWER SUPPLY EVENTS", SYSTEM_LOG, Some(KERNEL_POWER), IdFilter::Except(&[41, 42]), 20,
        "Power events found", "No power supply events found."),
    QuerySpec {
        display_limit: 20,
        post_filter: Some(PostFilter::GpuTimeout),
        ..spec(CategoryKey::GpuDriverTimeout, "GPU DRIVER TIMEOUTS (TDR)", SYSTEM_LOG, None, IdFilter::Any, 1000,
            "GPU driver timeouts found", "No GPU driver timeouts found.")
    },
];

pub static HANG_CATALOG: &[QuerySpec] = &[
    spec(CategoryKey::UnexpectedShutdown, "UNEXPECTED SHUTDOWNS (EVENT 41)", SYSTEM_LOG, None, IdFilter::Only(&[41]), 10,
        "Unexpected shutdowns found", "No unexpected shutdowns found."),
    spec(CategoryKey::LegacyUnexpectedShutdown, "UNEXPECTED SHUTDOWNS (EVENT 6008)", SYSTEM_LOG, None, IdFilter::Only(&[6008]), 10,
        "Unexpected shutdown records found", "No event 6008 records found."),
    spec(CategoryKey::BugcheckBsod, "BLUE SCREEN (BSOD) EVENTS", SYSTEM_LOG, Some("Microsoft-Windows-WER-SystemErrorReporting"), IdFilter::Only(&[1001]), 10,
        "Blue screen events found", "No blue screen events found."),
    QuerySpec {
        levels: &[1, 2],
        lookback_days: Some(7),
        ..spec(CategoryKey::RecentCriticalErrors, "CRITICAL AND ERROR EVENTS (LAST 7 DAYS)", SYSTEM_LOG, None, IdFilter::Any, 50,
            "Critical/error events found", "No critical or error events in the last 7 days.")
    },
    QuerySpec {
        levels: &[2],
        lookback_days: Some(7),
        display_limit: 20,
        post_filter: Some(PostFilter::DriverMention),
        ..spec(CategoryKey::DriverErrors, "DRIVER ERRORS (LAST 7 DAYS)", SYSTEM_LOG, None, IdFilter::Any, 1000,
            "Driver errors found", "No driver errors in the last 7 days.")
    },
    spec(CategoryKey::DiskErrors, "DISK ERRORS", SYSTEM_LOG, Some("Disk"), IdFilter::Any, 20,
        "Disk errors found", "No disk errors found."),
    spec(CategoryKey::MemoryDiagnostics, "MEMORY DIAGNOSTIC RESULTS", SYSTEM_LOG, Some("Microsoft-Windows-MemoryDiagnostics-Results"), IdFilter::Any, 5,
        "Memory diagnostic results found", "No memory diagnostic results found (the Windows Memory Diagnostic has not been run)."),
    QuerySpec {
        levels: &[2],
        lookback_days: Some(7),
        display_limit: 20,
        post_filter: Some(PostFilter::AppCrash),
        ..spec(CategoryKey::ApplicationCrashes, "APPLICATION CRASHES (LAST 7 DAYS)", APPLICATION_LOG, None, IdFilter::Any, 1000,
            "Application crashes found", "No application crashes in the last 7 days.")
    },
];
