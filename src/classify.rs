use crate::bugcheck::{self, BugcheckDetail};
use crate::catalog::{Classifier, QuerySpec};
use crate::record::LogRecord;
use crate::source::QueryError;

#[derive(Clone, Debug)]
pub struct CategoryResult {
    pub spec: &'static QuerySpec,
    pub records: Vec<LogRecord>,
    /// Backend diagnostic when the query failed; the category is then empty.
    pub failure: Option<String>,
    pub triggered: bool,
    /// Parallel to `records` for bugcheck categories, empty otherwise.
    pub bugchecks: Vec<BugcheckDetail>,
}

impl CategoryResult {
    pub fn found(&self) -> bool { !self.records.is_empty() }
}

/// Applies the post-filter and decides the trigger for one category's query outcome.
pub fn classify(spec: &'static QuerySpec, outcome: Result<Vec<LogRecord>, QueryError>) -> CategoryResult {
    let (records, failure) = match outcome {
        Ok(v) => (v.into_iter().filter(|r| spec.keep(r)).collect::<Vec<_>>(), None),
        Err(e) => { log::warn!("{}: {}", spec.label, e); (vec![], Some(e.to_string())) }
    };
    let (triggered, bugchecks) = match spec.classifier {
        Classifier::Presence => (!records.is_empty(), vec![]),
        Classifier::Bugcheck => {
            let details: Vec<BugcheckDetail> = records.iter().map(bugcheck::decode).collect();
            (details.iter().any(|d| d.overheat_related), details)
        }
    };
    CategoryResult { spec, records, failure, triggered, bugchecks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CategoryKey, OVERHEAT_CATALOG, HANG_CATALOG};
    use crate::source::fake::rec;

    fn spec_for(key: CategoryKey) -> &'static QuerySpec { OVERHEAT_CATALOG.iter().chain(HANG_CATALOG).find(|s| s.key == key).unwrap() }

    fn kp41(code: &str) -> LogRecord {
        let mut r = rec("Microsoft-Windows-Kernel-Power", 41, 1, "");
        r.raw_xml = Some(format!("<Event><EventData><Data Name=\"BugcheckCode\">{}</Data><Data Name=\"BugcheckParameter1\">0x0</Data></EventData></Event>", code));
        r
    }

    #[test]
    fn presence_triggers_on_any_record() {
        let s = spec_for(CategoryKey::ThermalZoneWarning);
        assert!(classify(s, Ok(vec![rec("Microsoft-Windows-Kernel-Power", 2, 3, "")])).triggered);
        assert!(!classify(s, Ok(vec![])).triggered);
    }

    #[test]
    fn post_filter_runs_before_trigger() {
        let s = spec_for(CategoryKey::TemperatureMention);
        let r = classify(s, Ok(vec![rec("Service Control Manager", 7036, 4, "The service entered the running state."), rec("ACPI", 86, 3, "Thermal zone passive cooling")]));
        assert_eq!(r.records.len(), 1);
        assert!(r.triggered);
        let r = classify(s, Ok(vec![rec("Service Control Manager", 7036, 4, "The service entered the running state.")]));
        assert!(r.records.is_empty());
        assert!(!r.triggered);
    }

    #[test]
    fn code_zero_record_does_not_trigger() {
        let r = classify(spec_for(CategoryKey::ShutdownDetail), Ok(vec![kp41("0")]));
        assert!(r.found());
        assert!(!r.triggered);
        assert_eq!(r.bugchecks.len(), 1);
    }

    #[test]
    fn video_code_triggers_even_among_others() {
        let r = classify(spec_for(CategoryKey::ShutdownDetail), Ok(vec![kp41("0"), kp41("159"), kp41("116")]));
        assert!(r.triggered);
        assert_eq!(r.bugchecks.len(), 3);
        assert!(!classify(spec_for(CategoryKey::ShutdownDetail), Ok(vec![kp41("159")])).triggered);
    }

    #[test]
    fn failure_is_empty_with_diagnostic() {
        let r = classify(spec_for(CategoryKey::DiskErrors), Err(QueryError::AccessDenied("System".to_string())));
        assert!(!r.triggered);
        assert!(r.records.is_empty());
        assert!(r.failure.unwrap().contains("access denied"));
    }
}
