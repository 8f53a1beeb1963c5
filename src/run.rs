use std::path::{Path, PathBuf};
use anyhow::Context;
use chrono::{DateTime, Local, Utc};
use crate::catalog::ReportKind;
use crate::classify::{CategoryResult, classify};
use crate::host::{self, SystemSnapshot};
use crate::report::{self, ReportHeader};
use crate::source::EventSource;
use crate::status;
use crate::verdict::{self, Verdict};

pub struct RunOptions {
    pub kind: ReportKind,
    pub output_dir: PathBuf,
    /// Tried when `output_dir` refuses the write, before the working directory.
    pub fallback_dir: PathBuf,
    pub now: DateTime<Local>,
    /// Windows directory holding `Minidump\` and `MEMORY.DMP`.
    pub dump_root: PathBuf,
    pub system: fn() -> SystemSnapshot,
}

pub struct RunOutcome {
    pub report_path: Option<PathBuf>,
    pub results: Vec<CategoryResult>,
    pub verdict: Option<Verdict>,
    pub text: String,
}

pub fn report_file_name(kind: ReportKind, now: DateTime<Local>) -> String {
    format!("{}_{}.txt", kind.file_prefix(), now.format("%Y%m%d_%H%M%S"))
}

pub fn write_report(path: &Path, text: &str) -> anyhow::Result<()> {
    std::fs::write(path, text).with_context(|| format!("writing report to {}", path.to_string_lossy()))
}

/// Writes into the first directory that accepts the file: `dirs` in order, then `.`.
pub fn write_report_with_fallback(dirs: &[&Path], file_name: &str, text: &str) -> Option<PathBuf> {
    let mut tried: Vec<PathBuf> = vec![];
    for dir in dirs.iter().copied().chain(std::iter::once(Path::new("."))) {
        if tried.iter().any(|t| t == dir) { continue; }
        tried.push(dir.to_path_buf());
        if let Err(e) = std::fs::create_dir_all(dir) { log::debug!("Cannot create {}: {}", dir.to_string_lossy(), e); }
        let path = dir.join(file_name);
        match write_report(&path, text) {
            Ok(()) => return Some(path),
            Err(e) => {
                log::warn!("{:#}", e);
                status::warn(&format!("Could not save the report in {}: {:#}", dir.to_string_lossy(), e));
            }
        }
    }
    None
}

/// Runs every catalog query in order, renders each section as it completes and writes the
/// finished document once. Query failures end up in the report, never in the return value.
pub fn run_report(opts: &RunOptions, source: &dyn EventSource) -> RunOutcome {
    let catalog = opts.kind.catalog();
    let now_utc: DateTime<Utc> = opts.now.with_timezone(&Utc);
    let system = (opts.system)();
    let out_dir_s = opts.output_dir.to_string_lossy().into_owned();
    let source_name = source.name();
    let mut text = report::render_header(&ReportHeader { title: opts.kind.title(), generated: opts.now, output_dir: &out_dir_s, hostname: &system.hostname, source: &source_name });
    if opts.kind == ReportKind::CrashHang { text.push_str(&report::render_system(&system)); }
    let mut results: Vec<CategoryResult> = Vec::with_capacity(catalog.len());
    for spec in catalog {
        let q = spec.to_query(now_utc);
        let pb = status::spinner(spec.label);
        let outcome = source.query(&q);
        if let Some(pb) = pb { pb.finish_and_clear(); }
        let r = classify(spec, outcome);
        log::info!("{}: {} record(s), triggered={}", spec.label, r.records.len(), r.triggered);
        status::say(&status::category_line(&r));
        text.push_str(&report::render_section(&r));
        results.push(r);
    }
    let verdict = match opts.kind {
        ReportKind::Overheating => {
            let v = verdict::overheat_verdict(&results);
            text.push_str(&report::render_verdict(&v));
            status::say("");
            status::say(&status::verdict_line(&v));
            Some(v)
        }
        ReportKind::CrashHang => {
            let dumps = host::find_crash_dumps(&opts.dump_root);
            status::say(&if dumps.is_empty() { status::paint("[OK]    CRASH DUMP FILES: none found", "32") } else { status::paint(&format!("[FOUND] CRASH DUMP FILES: {}", dumps.len()), "33") });
            text.push_str(&report::render_dumps(&dumps, &opts.dump_root.to_string_lossy()));
            None
        }
    };
    let bin = match opts.kind { ReportKind::Overheating => "OverheatCheck", ReportKind::CrashHang => "HangReport" };
    text.push_str(&report::render_footer(&format!("Run `{} --help` for a guide to reading this report.", bin)));
    let name = report_file_name(opts.kind, opts.now);
    let report_path = write_report_with_fallback(&[opts.output_dir.as_path(), opts.fallback_dir.as_path()], &name, &text);
    match report_path.as_ref() {
        Some(path) => {
            status::say("");
            status::say(&status::paint(&format!("Report saved to: {}", path.to_string_lossy()), "1;36"));
        }
        None => log::error!("Report {} could not be written anywhere", name),
    }
    RunOutcome { report_path, results, verdict, text }
}
