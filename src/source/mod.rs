use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::record::LogRecord;

pub mod evtx_file;
#[cfg(windows)]
pub mod live;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdFilter {
    Any,
    Only(&'static [u32]),
    Except(&'static [u32]),
}

impl IdFilter {
    pub fn accepts(&self, id: u32) -> bool {
        match self { IdFilter::Any => true, IdFilter::Only(ids) => ids.contains(&id), IdFilter::Except(ids) => !ids.contains(&id) }
    }
}

/// The backend-facing half of a catalog entry, with the lookback resolved to a timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct LogQuery {
    pub log: &'static str,
    pub provider: Option<&'static str>,
    pub ids: IdFilter,
    pub levels: &'static [u8],
    pub since: Option<DateTime<Utc>>,
    pub max_results: usize,
}

impl LogQuery {
    pub fn matches(&self, r: &LogRecord) -> bool {
        if let Some(p) = self.provider && !p.eq_ignore_ascii_case(&r.provider) { return false; }
        if !self.ids.accepts(r.event_id) { return false; }
        if !self.levels.is_empty() && !self.levels.contains(&r.level) { return false; }
        if let Some(s) = self.since && r.time < s { return false; }
        true
    }

    /// Structured XPath filter understood by the Windows event log service.
    pub fn xpath(&self) -> String {
        let mut conds: Vec<String> = vec![];
        if let Some(p) = self.provider { conds.push(format!("Provider[@Name='{}']", p)); }
        match self.ids {
            IdFilter::Any => {}
            IdFilter::Only(ids) => conds.push(format!("({})", ids.iter().map(|i| format!("EventID={}", i)).collect::<Vec<_>>().join(" or "))),
            IdFilter::Except(ids) => conds.push(ids.iter().map(|i| format!("EventID!={}", i)).collect::<Vec<_>>().join(" and ")),
        }
        if !self.levels.is_empty() { conds.push(format!("({})", self.levels.iter().map(|l| format!("Level={}", l)).collect::<Vec<_>>().join(" or "))); }
        if let Some(s) = self.since {
            let ts = s.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
            conds.push(format!("TimeCreated[@SystemTime>='{}']", ts));
        }
        if conds.is_empty() { "*".to_string() } else { format!("*[System[{}]]", conds.join(" and ")) }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("event log '{0}' was not found")]
    LogNotFound(String),
    #[error("access denied reading '{0}' (try running as Administrator)")]
    AccessDenied(String),
    #[error("live event log queries are not supported on this platform")]
    Unsupported,
    #[error("event log API error {code} on '{log}'")]
    Api { log: String, code: u32 },
    #[error("failed to read {path}: {msg}")]
    Evtx { path: String, msg: String },
}

/// Anything that can answer catalog queries. Results are newest first and capped at
/// `max_results`.
pub trait EventSource {
    fn name(&self) -> String;
    fn query(&self, q: &LogQuery) -> Result<Vec<LogRecord>, QueryError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind { Auto, Live, Evtx }

/// Tries `primary`, and answers from `secondary` when the primary rejects the query.
pub struct FallbackSource<A, B> {
    pub primary: A,
    pub secondary: B,
}

impl<A: EventSource, B: EventSource> EventSource for FallbackSource<A, B> {
    fn name(&self) -> String { format!("{} (fallback: {})", self.primary.name(), self.secondary.name()) }

    fn query(&self, q: &LogQuery) -> Result<Vec<LogRecord>, QueryError> {
        match self.primary.query(q) {
            Ok(v) => Ok(v),
            Err(e) => {
                log::info!("{} failed for {}: {}; trying {}", self.primary.name(), q.log, e, self.secondary.name());
                self.secondary.query(q).map_err(|e2| { log::debug!("{} also failed: {}", self.secondary.name(), e2); e })
            }
        }
    }
}

/// Source used on platforms without the live API; every query fails with `Unsupported`.
pub struct UnsupportedLive;

impl EventSource for UnsupportedLive {
    fn name(&self) -> String { "Windows Event Log API".to_string() }
    fn query(&self, _q: &LogQuery) -> Result<Vec<LogRecord>, QueryError> { Err(QueryError::Unsupported) }
}

pub fn open_source(kind: SourceKind, evtx_dir: &str) -> Box<dyn EventSource> {
    let files = || evtx_file::EvtxDirSource::new(evtx_dir);
    match kind {
        SourceKind::Evtx => Box::new(files()),
        SourceKind::Live => Box::new(new_live()),
        SourceKind::Auto => Box::new(FallbackSource { primary: new_live(), secondary: files() }),
    }
}

#[cfg(windows)]
fn new_live() -> live::LiveSource { live::LiveSource::new() }

#[cfg(not(windows))]
fn new_live() -> UnsupportedLive { UnsupportedLive }
