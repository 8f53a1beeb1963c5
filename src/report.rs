use chrono::{DateTime, Local};
use comfy_table::{ContentArrangement, Table, presets};
use crate::classify::CategoryResult;
use crate::host::{DumpFile, SystemSnapshot};
use crate::record::LogRecord;
use crate::verdict::Verdict;

const WIDTH: usize = 80;

pub struct ReportHeader<'a> {
    pub title: &'a str,
    pub generated: DateTime<Local>,
    pub output_dir: &'a str,
    pub hostname: &'a str,
    pub source: &'a str,
}

fn rule(c: char) -> String { std::iter::repeat_n(c, WIDTH).collect() }

fn section_title(s: &mut String, title: &str) {
    s.push('\n');
    s.push_str(title);
    s.push('\n');
    s.push_str(&rule('='));
    s.push('\n');
}

pub fn render_header(h: &ReportHeader) -> String {
    let mut s = String::new();
    s.push_str(&rule('='));
    s.push('\n');
    s.push_str(&format!("  {}\n", h.title));
    s.push_str(&rule('='));
    s.push('\n');
    s.push_str(&format!("Generated:     {}\n", h.generated.format("%Y-%m-%d %H:%M:%S")));
    s.push_str(&format!("Computer:      {}\n", h.hostname));
    s.push_str(&format!("Output folder: {}\n", h.output_dir));
    s.push_str(&format!("Event source:  {}\n", h.source));
    s
}

fn render_record(s: &mut String, r: &LogRecord) {
    s.push_str(&format!("[{}] Event {} | {} | {}\n", r.time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"), r.event_id, r.level_name(), r.provider));
    let msg = r.message_line();
    s.push_str(&format!("  Message: {}\n", if msg.is_empty() { "(no message text)".to_string() } else { msg }));
}

/// One catalog section. Empty and failed categories keep their header and say so.
pub fn render_section(r: &CategoryResult) -> String {
    let mut s = String::new();
    section_title(&mut s, r.spec.label);
    if r.records.is_empty() {
        s.push_str(r.spec.none_found);
        s.push('\n');
        if let Some(f) = r.failure.as_ref() { s.push_str(&format!("(Could not read the event log: {})\n", f)); }
        return s;
    }
    s.push_str(&format!("{}: {}\n\n", r.spec.found, r.records.len()));
    for (i, rec) in r.records.iter().enumerate().take(r.spec.display_limit) {
        render_record(&mut s, rec);
        if let Some(d) = r.bugchecks.get(i) {
            s.push_str(&format!("  BugcheckCode: {}\n", d.code));
            s.push_str(&format!("  BugcheckParameter1: {}\n", d.parameter));
            s.push_str(&format!("  Interpretation: {}\n", d.interpretation));
        }
        s.push('\n');
    }
    if r.records.len() > r.spec.display_limit {
        s.push_str(&format!("... and {} more not shown\n", r.records.len() - r.spec.display_limit));
    }
    s
}

pub fn render_system(sys: &SystemSnapshot) -> String {
    let mut s = String::new();
    section_title(&mut s, "SYSTEM INFORMATION");
    for (k, v) in sys.rows() { s.push_str(&format!("{:<18}{}\n", format!("{}:", k), v)); }
    s
}

fn human_size(b: u64) -> String {
    if b >= 1024 * 1024 { format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)) } else { format!("{:.1} KB", b as f64 / 1024.0) }
}

pub fn render_dumps(dumps: &[DumpFile], searched: &str) -> String {
    let mut s = String::new();
    section_title(&mut s, "CRASH DUMP FILES");
    if dumps.is_empty() {
        s.push_str(&format!("No crash dump files found in {}.\n", searched));
        return s;
    }
    s.push_str(&format!("Crash dump files found: {}\n\n", dumps.len()));
    let mut table = Table::new();
    table.load_preset(presets::ASCII_BORDERS_ONLY_CONDENSED).set_content_arrangement(ContentArrangement::Disabled);
    table.set_header(vec!["File", "Size", "Modified"]);
    for d in dumps {
        let modified = d.modified.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()).unwrap_or_else(|| "Unknown".to_string());
        table.add_row(vec![d.path.clone(), human_size(d.size_bytes), modified]);
    }
    s.push_str(&table.to_string());
    s.push('\n');
    s
}

pub fn render_verdict(v: &Verdict) -> String {
    let mut s = String::new();
    section_title(&mut s, "SUMMARY AND RECOMMENDATIONS");
    s.push_str(if v.triggered { "VERDICT: OVERHEATING EVIDENCE FOUND\n\n" } else { "VERDICT: NO OVERHEATING EVIDENCE FOUND IN THE LOGS\n\n" });
    for l in &v.summary_lines { s.push_str(&format!("- {}\n", l)); }
    s.push_str(if v.triggered { "\nRecommended actions:\n" } else { "\nRecommended next steps:\n" });
    for (i, a) in v.recommended_actions.iter().enumerate() { s.push_str(&format!("{}. {}\n", i + 1, a)); }
    s
}

pub fn render_footer(help_hint: &str) -> String {
    let mut s = String::new();
    s.push('\n');
    s.push_str(&rule('='));
    s.push('\n');
    s.push_str(help_hint);
    s.push('\n');
    s.push_str("END OF REPORT\n");
    s.push_str(&rule('='));
    s.push('\n');
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OVERHEAT_CATALOG;
    use crate::classify::classify;
    use crate::source::{QueryError, fake::rec};

    #[test]
    fn empty_section_keeps_header_and_sentence() {
        let s = render_section(&classify(&OVERHEAT_CATALOG[1], Ok(vec![])));
        assert!(s.contains("CPU THROTTLING EVENTS\n"));
        assert!(s.contains(&rule('=')));
        assert!(s.contains("No CPU throttling events found."));
    }

    #[test]
    fn failed_section_adds_diagnostic() {
        let s = render_section(&classify(&OVERHEAT_CATALOG[0], Err(QueryError::LogNotFound("System".to_string()))));
        assert!(s.contains("No thermal zone warnings found."));
        assert!(s.contains("Could not read the event log"));
    }

    #[test]
    fn bugcheck_fields_follow_record() {
        let mut r = rec("Microsoft-Windows-Kernel-Power", 41, 1, "The system has rebooted\nwithout cleanly shutting down first.");
        r.raw_xml = Some("<Event><EventData><Data Name=\"BugcheckCode\">0</Data><Data Name=\"BugcheckParameter1\">0x0</Data></EventData></Event>".to_string());
        let s = render_section(&classify(&OVERHEAT_CATALOG[4], Ok(vec![r])));
        assert!(s.contains("Event 41 | Critical | Microsoft-Windows-Kernel-Power"));
        assert!(s.contains("Message: The system has rebooted without cleanly shutting down first."));
        assert!(s.contains("BugcheckCode: 0\n"));
        assert!(s.contains("Interpretation: Clean shutdown or power loss (NOT a crash/overheat)"));
    }

    #[test]
    fn display_limit_summarises_rest() {
        let recs: Vec<_> = (0..25).map(|i| rec("Display", 4101, 3, &format!("Display driver reset {}", i))).collect();
        let s = render_section(&classify(&OVERHEAT_CATALOG[6], Ok(recs)));
        assert!(s.contains("GPU driver timeouts found: 25"));
        assert!(s.contains("... and 5 more not shown"));
        assert_eq!(s.matches("Event 4101").count(), 20);
    }

    #[test]
    fn dumps_table_lists_files() {
        let d = DumpFile { path: r"C:\Windows\Minidump\a.dmp".to_string(), size_bytes: 2 * 1024 * 1024, modified: None };
        let s = render_dumps(&[d], r"C:\Windows");
        assert!(s.contains("a.dmp"));
        assert!(s.contains("2.0 MB"));
        assert!(render_dumps(&[], r"C:\Windows").contains("No crash dump files found"));
    }

    #[test]
    fn verdict_block_numbers_actions() {
        let v = Verdict { triggered: true, summary_lines: vec!["x".to_string()], recommended_actions: vec!["a".to_string(), "b".to_string()] };
        let s = render_verdict(&v);
        assert!(s.contains("VERDICT: OVERHEATING EVIDENCE FOUND"));
        assert!(s.contains("1. a\n2. b\n"));
    }
}
