use std::ffi::OsString;
use std::path::PathBuf;
use clap::{ArgAction, ColorChoice, Command, CommandFactory, FromArgMatches, Parser};
use chrono::Local;
use crate::catalog::ReportKind;
use crate::config::{self, LogFormat};
use crate::host;
use crate::run::{RunOptions, run_report};
use crate::source::{self, SourceKind, evtx_file::DEFAULT_EVTX_DIR};
use crate::status;

#[derive(Parser, Debug)]
#[command(color = ColorChoice::Auto)]
pub struct Args {
    /// Folder the report is written to [default: Downloads in your user profile]
    #[arg(long, short = 'o')]
    pub output_dir: Option<String>,
    /// TOML settings file [default: WinPostmortem.toml when present]
    #[arg(long)]
    pub config: Option<String>,
    /// Where events are read from
    #[arg(long, value_enum)]
    pub source: Option<SourceKind>,
    /// Folder holding .evtx files for the offline source
    #[arg(long)]
    pub evtx_dir: Option<String>,
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
    #[arg(short = 'q', long, default_value_t = false)]
    pub quiet: bool,
    #[arg(long, default_value_t = false)]
    pub no_color: bool,
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

const OVERHEAT_GUIDE: &str = "\
What the report checks:
  Thermal zone warnings (Kernel-Power 2) and CPU throttling (Kernel-Processor-Power 37/56)
  decide the verdict. Hardware errors (WHEA), crash codes 116/292 in unexpected shutdowns and
  GPU driver timeouts are reported as advisories only.

Reading the verdict:
  OVERHEATING EVIDENCE FOUND   Windows logged thermal events. Clean and re-paste first.
  NO OVERHEATING EVIDENCE      Nothing thermal in the logs. A machine that cuts power from
                               heat often logs nothing, so measure temperatures under load.

Examples:
  OverheatCheck
  OverheatCheck --output-dir D:\\Reports
  OverheatCheck --source evtx --evtx-dir E:\\Windows\\System32\\winevt\\Logs";

const HANG_GUIDE: &str = "\
Interpretation guide:
  Event 41 (Kernel-Power)   The machine restarted without a clean shutdown. BugcheckCode 0
                            means power loss or a hard hang; any other code was a blue screen.
  Event 6008 (EventLog)     The previous shutdown was unexpected.
  Event 1001 (WER)          A blue screen was recorded; the bugcheck code names the cause.
  Driver errors             Repeated errors naming one driver (.sys) point at that driver.
  Disk errors               Bad blocks (7) or controller timeouts (153) suggest a failing disk.
  Memory diagnostics        Results of the Windows Memory Diagnostic, if it was run.
  Application crashes       The faulting module identifies the crashing program.
  Crash dump files          Open .dmp files with WinDbg (!analyze -v) for the root cause.

Examples:
  HangReport
  HangReport --output-dir D:\\Reports
  HangReport --source evtx --evtx-dir E:\\Windows\\System32\\winevt\\Logs";

pub fn command_for(kind: ReportKind) -> Command {
    let cmd = Args::command();
    match kind {
        ReportKind::Overheating => cmd
            .name("OverheatCheck")
            .about("Checks the Windows event logs for overheating evidence and writes a report")
            .long_about("Queries the System event log for thermal zone warnings, CPU throttling, hardware errors, unexpected shutdowns and GPU driver timeouts, then writes a plain-text report with a verdict and recommended actions. Nothing on the system is changed.")
            .after_long_help(OVERHEAT_GUIDE),
        ReportKind::CrashHang => cmd
            .name("HangReport")
            .about("Collects crash and hang evidence from the Windows event logs into a report")
            .long_about("Queries the System and Application event logs for unexpected shutdowns, blue screens, driver, disk and memory errors and application crashes, lists crash dump files and writes everything to a plain-text report. Nothing on the system is changed.")
            .after_long_help(HANG_GUIDE),
    }
}

pub fn try_parse_from<I, T>(kind: ReportKind, itr: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let m = command_for(kind).try_get_matches_from(itr)?;
    Args::from_arg_matches(&m)
}

/// Entry point shared by both binaries. Returns normally on every outcome except a
/// command-line error, where clap prints the message and exits.
pub fn main_for(kind: ReportKind) {
    let args = match try_parse_from(kind, std::env::args_os()) { Ok(a) => a, Err(e) => e.exit() };
    let (cfg, cfg_err) = config::load_config_or_default(args.config.as_deref());
    config::init_logging(args.quiet, args.verbose, cfg.log_level, args.log_format.or(cfg.log_format));
    status::init(args.no_color || cfg.no_color.unwrap_or(false), args.quiet);
    if let Some(e) = cfg_err {
        log::warn!("Ignoring config: {:#}", e);
        status::warn(&format!("Ignoring config file: {:#}", e));
    }
    let source_kind = args.source.or(cfg.source).unwrap_or(SourceKind::Auto);
    let evtx_dir = args.evtx_dir.clone().or(cfg.evtx_dir.clone()).unwrap_or_else(|| DEFAULT_EVTX_DIR.to_string());
    log::debug!("source={:?} evtx_dir={}", source_kind, evtx_dir);
    let src = source::open_source(source_kind, &evtx_dir);
    let requested = args.output_dir.clone().or(cfg.output_dir.clone()).map(PathBuf::from);
    let fallback_dir = config::default_output_dir();
    let output_dir = config::resolve_output_dir(requested.as_deref(), &fallback_dir);
    status::say(&status::paint(kind.title(), "1"));
    status::say(&format!("Saving report to {}", output_dir.to_string_lossy()));
    status::say("");
    let opts = RunOptions { kind, output_dir, fallback_dir, now: Local::now(), dump_root: host::system_root(), system: host::collect_system_snapshot };
    let outcome = run_report(&opts, src.as_ref());
    if outcome.report_path.is_none() { status::warn("The report could not be saved in any folder."); }
}
