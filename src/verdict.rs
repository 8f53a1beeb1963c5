use crate::catalog::CategoryKey;
use crate::classify::CategoryResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub triggered: bool,
    pub summary_lines: Vec<String>,
    pub recommended_actions: Vec<String>,
}

pub const OVERHEAT_ACTIONS: &[&str] = &[
    "Clean dust from the CPU heatsink, GPU cooler and all case fans",
    "Measure real temperatures under load with HWMonitor, HWiNFO or Core Temp",
    "Reapply thermal paste if the CPU exceeds 85°C under load",
    "Improve case airflow (intake at the front, exhaust at the rear and top)",
    "Verify every fan spins and ramps up under load (BIOS fan curves included)",
];

pub const MONITORING_ACTIONS: &[&str] = &[
    "Monitor temperatures in real time with HWMonitor or HWiNFO while reproducing the crash",
    "Safe under load: CPU below 85°C, GPU below 83°C",
    "If temperatures stay in range, investigate drivers, power supply and memory instead",
];

/// Advisory lines in report order. Only the first two categories decide the verdict; the
/// rest have frequent non-thermal causes.
const SUMMARY_RULES: &[(CategoryKey, bool, &str)] = &[
    (CategoryKey::ThermalZoneWarning, true, "Thermal zone warnings detected — System is OVERHEATING!"),
    (CategoryKey::ProcessorThrottle, true, "CPU throttling events detected — processor slowed down to shed heat"),
    (CategoryKey::HardwareError, false, "Hardware errors (WHEA) logged — can be heat related, but also failing hardware"),
    (CategoryKey::ShutdownDetail, false, "Crash codes pointing at the video driver found in unexpected shutdowns"),
    (CategoryKey::GpuDriverTimeout, false, "GPU driver timeouts detected — possible GPU overheating or driver fault"),
];

fn triggered(results: &[CategoryResult], key: CategoryKey) -> bool { results.iter().any(|r| r.spec.key == key && r.triggered) }

pub fn overheat_verdict(results: &[CategoryResult]) -> Verdict {
    let mut summary_lines: Vec<String> = vec![];
    let mut decisive = false;
    for (key, decides, line) in SUMMARY_RULES {
        if triggered(results, *key) {
            summary_lines.push(line.to_string());
            decisive |= *decides;
        }
    }
    if decisive {
        return Verdict { triggered: true, summary_lines, recommended_actions: OVERHEAT_ACTIONS.iter().map(|s| s.to_string()).collect() };
    }
    let mut lines = vec![
        "No thermal evidence (thermal zone warnings or CPU throttling) found in the event logs".to_string(),
        "Note: this does NOT rule out overheating. A hard crash can power the machine off before anything is written to the log".to_string(),
    ];
    lines.extend(summary_lines);
    Verdict { triggered: false, summary_lines: lines, recommended_actions: MONITORING_ACTIONS.iter().map(|s| s.to_string()).collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{OVERHEAT_CATALOG, QuerySpec};
    use crate::classify::classify;
    use crate::source::fake::rec;

    fn results(hit: &[CategoryKey]) -> Vec<CategoryResult> {
        OVERHEAT_CATALOG.iter().map(|s: &'static QuerySpec| {
            let recs = if hit.contains(&s.key) { vec![rec(s.provider.unwrap_or("Display"), 4101, 3, "Display driver thermal event")] } else { vec![] };
            let mut r = classify(s, Ok(recs));
            if s.key == CategoryKey::ShutdownDetail { r.triggered = hit.contains(&s.key); }
            r
        }).collect()
    }

    #[test]
    fn thermal_only_gives_one_line_and_five_actions() {
        let v = overheat_verdict(&results(&[CategoryKey::ThermalZoneWarning]));
        assert!(v.triggered);
        assert_eq!(v.summary_lines, vec!["Thermal zone warnings detected — System is OVERHEATING!".to_string()]);
        assert_eq!(v.recommended_actions.len(), 5);
    }

    #[test]
    fn throttle_alone_triggers() {
        assert!(overheat_verdict(&results(&[CategoryKey::ProcessorThrottle])).triggered);
    }

    #[test]
    fn advisory_categories_do_not_flip_verdict() {
        let v = overheat_verdict(&results(&[CategoryKey::HardwareError, CategoryKey::GpuDriverTimeout, CategoryKey::ShutdownDetail]));
        assert!(!v.triggered);
        assert!(v.summary_lines.iter().any(|l| l.contains("WHEA")));
        assert!(v.summary_lines.iter().any(|l| l.contains("GPU driver timeouts")));
        assert!(v.recommended_actions.iter().any(|a| a.contains("CPU below 85°C, GPU below 83°C")));
    }

    #[test]
    fn nothing_found_carries_caveat() {
        let v = overheat_verdict(&results(&[]));
        assert!(!v.triggered);
        assert!(v.summary_lines.iter().any(|l| l.contains("does NOT rule out overheating")));
        assert_eq!(v.recommended_actions.len(), MONITORING_ACTIONS.len());
    }
}
