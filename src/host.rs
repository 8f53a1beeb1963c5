use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default)]
pub struct SystemSnapshot {
    pub hostname: String,
    pub os_caption: Option<String>,
    pub os_version: Option<String>,
    pub architecture: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub cpu: Option<String>,
    pub memory_mb: Option<u64>,
    pub bios_version: Option<String>,
    pub last_boot: Option<String>,
}

impl SystemSnapshot {
    /// `(label, value)` rows in display order; unknown values read "Unknown".
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let or = |v: &Option<String>| v.clone().unwrap_or_else(|| "Unknown".to_string());
        vec![
            ("Computer Name", self.hostname.clone()),
            ("Operating System", or(&self.os_caption)),
            ("OS Version", or(&self.os_version)),
            ("Architecture", self.architecture.clone()),
            ("Manufacturer", or(&self.manufacturer)),
            ("Model", or(&self.model)),
            ("Processor", or(&self.cpu)),
            ("Installed Memory", self.memory_mb.map(|m| format!("{} MB", m)).unwrap_or_else(|| "Unknown".to_string())),
            ("BIOS Version", or(&self.bios_version)),
            ("Last Boot", or(&self.last_boot)),
        ]
    }
}

pub fn hostname() -> String {
    std::env::var("COMPUTERNAME").or_else(|_| std::env::var("HOSTNAME")).unwrap_or_else(|_| "Unknown".to_string())
}

#[cfg(target_os = "windows")]
pub fn collect_system_snapshot() -> SystemSnapshot {
    use serde::Deserialize;
    use wmi::WMIConnection;
    #[allow(non_snake_case)]
    #[derive(Debug, Deserialize)]
    struct OsRow { Caption: Option<String>, Version: Option<String>, BuildNumber: Option<String>, LastBootUpTime: Option<String> }
    #[allow(non_snake_case)]
    #[derive(Debug, Deserialize)]
    struct CsRow { Manufacturer: Option<String>, Model: Option<String>, TotalPhysicalMemory: Option<u64> }
    #[allow(non_snake_case)]
    #[derive(Debug, Deserialize)]
    struct CpuRow { Name: Option<String> }
    #[allow(non_snake_case)]
    #[derive(Debug, Deserialize)]
    struct BiosRow { SMBIOSBIOSVersion: Option<String> }
    let mut out = SystemSnapshot { hostname: hostname(), architecture: std::env::consts::ARCH.to_string(), ..Default::default() };
    let wmi = match WMIConnection::new() { Ok(w) => w, Err(e) => { log::warn!("WMI unavailable, system information is partial: {}", e); return out } };
    match wmi.raw_query::<OsRow>("SELECT Caption, Version, BuildNumber, LastBootUpTime FROM Win32_OperatingSystem") {
        Ok(rows) => if let Some(r) = rows.into_iter().next() {
            out.os_caption = r.Caption.map(|s| s.trim().to_string());
            out.os_version = match (r.Version, r.BuildNumber) { (Some(v), Some(b)) => Some(format!("{} (build {})", v, b)), (v, _) => v };
            out.last_boot = r.LastBootUpTime.map(|s| format_wmi_datetime(&s));
        },
        Err(e) => log::warn!("Win32_OperatingSystem query failed: {}", e),
    }
    match wmi.raw_query::<CsRow>("SELECT Manufacturer, Model, TotalPhysicalMemory FROM Win32_ComputerSystem") {
        Ok(rows) => if let Some(r) = rows.into_iter().next() {
            out.manufacturer = r.Manufacturer;
            out.model = r.Model;
            out.memory_mb = r.TotalPhysicalMemory.map(|b| b / (1024 * 1024));
        },
        Err(e) => log::warn!("Win32_ComputerSystem query failed: {}", e),
    }
    if let Ok(rows) = wmi.raw_query::<CpuRow>("SELECT Name FROM Win32_Processor") && let Some(r) = rows.into_iter().next() { out.cpu = r.Name.map(|s| s.trim().to_string()); }
    if let Ok(rows) = wmi.raw_query::<BiosRow>("SELECT SMBIOSBIOSVersion FROM Win32_BIOS") && let Some(r) = rows.into_iter().next() { out.bios_version = r.SMBIOSBIOSVersion; }
    out
}

#[cfg(not(target_os = "windows"))]
pub fn collect_system_snapshot() -> SystemSnapshot {
    SystemSnapshot { hostname: hostname(), os_caption: Some(std::env::consts::OS.to_string()), architecture: std::env::consts::ARCH.to_string(), ..Default::default() }
}

/// CIM datetime (`20261019083015.500000+120`) to `2026-10-19 08:30:15`; other input is returned as is.
pub fn format_wmi_datetime(s: &str) -> String {
    let digits = s.get(..14).unwrap_or("");
    match chrono::NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S") {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => s.to_string(),
    }
}

#[derive(Clone, Debug)]
pub struct DumpFile {
    pub path: String,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
}

pub fn system_root() -> PathBuf {
    PathBuf::from(std::env::var("SystemRoot").unwrap_or_else(|_| r"C:\Windows".to_string()))
}

/// Minidumps under `<root>\Minidump` plus the full `<root>\MEMORY.DMP`, newest first.
pub fn find_crash_dumps(root: &Path) -> Vec<DumpFile> {
    let mut gs = globset::GlobSetBuilder::new();
    if let Ok(g) = globset::GlobBuilder::new("*.dmp").case_insensitive(true).literal_separator(false).build() { gs.add(g); }
    let set = match gs.build() { Ok(s) => s, Err(e) => { log::error!("Dump glob failed: {}", e); return vec![] } };
    let mut out: Vec<DumpFile> = vec![];
    let minidump = root.join("Minidump");
    if minidump.is_dir() {
        for de in walkdir::WalkDir::new(&minidump).max_depth(1).into_iter().filter_map(Result::ok) {
            let fp = de.path();
            if !fp.is_file() { continue; }
            if let Some(name) = fp.file_name() && !set.is_match(Path::new(name)) { continue; }
            if let Some(d) = dump_file(fp) { out.push(d); }
        }
    } else {
        log::debug!("No minidump directory at {}", minidump.to_string_lossy());
    }
    let full = root.join("MEMORY.DMP");
    if full.is_file() && let Some(d) = dump_file(&full) { out.push(d); }
    out.sort_by(|a, b| b.modified.cmp(&a.modified));
    out
}

fn dump_file(p: &Path) -> Option<DumpFile> {
    match std::fs::metadata(p) {
        Ok(md) => Some(DumpFile { path: p.to_string_lossy().into_owned(), size_bytes: md.len(), modified: md.modified().ok().map(DateTime::<Local>::from) }),
        Err(e) => { log::warn!("Cannot stat {}: {}", p.to_string_lossy(), e); None }
    }
}
