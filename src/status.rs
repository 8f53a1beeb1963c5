//! Condensed progress written to the interactive terminal while the report is built.

use std::sync::OnceLock;
use std::time::Duration;
use is_terminal::IsTerminal;
use crate::classify::CategoryResult;
use crate::verdict::Verdict;

static ENABLE_COLOR: OnceLock<bool> = OnceLock::new();
static QUIET: OnceLock<bool> = OnceLock::new();

pub fn init(no_color: bool, quiet: bool) {
    let term = std::env::var("TERM").unwrap_or_default();
    let no_color_env = std::env::var_os("NO_COLOR").is_some();
    let color_default = std::io::stdout().is_terminal() && !no_color_env && term != "dumb";
    let _ = ENABLE_COLOR.set(color_default && !no_color);
    let _ = QUIET.set(quiet);
}

fn quiet() -> bool { *QUIET.get().unwrap_or(&false) }

pub fn paint(s: &str, code: &str) -> String {
    if *ENABLE_COLOR.get().unwrap_or(&false) { format!("\x1b[{}m{}\x1b[0m", code, s) } else { s.to_string() }
}

pub fn say(line: &str) { if !quiet() { println!("{}", line); } }

pub fn warn(line: &str) { if !quiet() { eprintln!("{}", paint(line, "33")); } }

/// Spinner shown while a query is outstanding; hidden when output is not interactive.
pub fn spinner(label: &str) -> Option<indicatif::ProgressBar> {
    if quiet() || !std::io::stdout().is_terminal() { return None; }
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_message(format!("Checking {}", label.to_lowercase()));
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

pub fn category_line(r: &CategoryResult) -> String {
    if let Some(f) = r.failure.as_ref() {
        return paint(&format!("[ERROR] {}: could not read logs ({})", r.spec.label, f), "90");
    }
    if r.found() {
        let code = if r.triggered { "1;31" } else { "33" };
        paint(&format!("[FOUND] {}: {} ({})", r.spec.label, r.spec.found, r.records.len()), code)
    } else {
        paint(&format!("[OK]    {}: {}", r.spec.label, r.spec.none_found), "32")
    }
}

pub fn verdict_line(v: &Verdict) -> String {
    if v.triggered { paint("VERDICT: Overheating evidence FOUND", "1;31") } else { paint("VERDICT: No overheating evidence found in the logs", "1;32") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OVERHEAT_CATALOG;
    use crate::classify::classify;
    use crate::source::{QueryError, fake::rec};

    #[test]
    fn category_lines_by_outcome() {
        let s = &OVERHEAT_CATALOG[0];
        assert!(category_line(&classify(s, Ok(vec![]))).contains("[OK]"));
        let found = category_line(&classify(s, Ok(vec![rec("Microsoft-Windows-Kernel-Power", 2, 3, "")])));
        assert!(found.contains("[FOUND]"));
        assert!(found.contains("(1)"));
        assert!(category_line(&classify(s, Err(QueryError::Unsupported))).contains("[ERROR]"));
    }
}
