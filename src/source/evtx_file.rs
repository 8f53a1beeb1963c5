use std::path::PathBuf;
use evtx::EvtxParser;
use crate::record::LogRecord;
use super::{EventSource, LogQuery, QueryError};

pub const DEFAULT_EVTX_DIR: &str = r"C:\Windows\System32\winevt\Logs";

/// Reads the `<log>.evtx` files the event log service keeps on disk. Works without the live
/// API (and on copies taken from another machine), but reading the system's own files
/// usually requires Administrator rights.
pub struct EvtxDirSource {
    dir: PathBuf,
}

impl EvtxDirSource {
    pub fn new(dir: &str) -> Self { Self { dir: PathBuf::from(dir) } }

    pub fn path_for(&self, log: &str) -> PathBuf { self.dir.join(format!("{}.evtx", log.replace('/', "%4"))) }
}

impl EventSource for EvtxDirSource {
    fn name(&self) -> String { format!("EVTX files in {}", self.dir.to_string_lossy()) }

    fn query(&self, q: &LogQuery) -> Result<Vec<LogRecord>, QueryError> {
        let path = self.path_for(q.log);
        let path_s = path.to_string_lossy().into_owned();
        if !path.is_file() { return Err(QueryError::LogNotFound(path_s)); }
        let mut parser = EvtxParser::from_path(&path).map_err(|e| {
            let msg = e.to_string();
            if msg.to_lowercase().contains("denied") { QueryError::AccessDenied(path_s.clone()) } else { QueryError::Evtx { path: path_s.clone(), msg } }
        })?;
        let mut out: Vec<LogRecord> = vec![];
        let mut scanned: usize = 0;
        for r in parser.records() {
            scanned += 1;
            let r = match r { Ok(r) => r, Err(e) => { log::debug!("Skipping unreadable record in {}: {}", path_s, e); continue } };
            let xml = r.data;
            if let Some(mut item) = crate::event_xml::parse_record(&xml) && q.matches(&item) {
                if let Some(msg) = crate::decoder::decode_event(&item.provider, item.event_id, &xml) { item.message = msg; }
                out.push(item);
            }
        }
        log::debug!("{}: scanned {} records, {} matched", path_s, scanned, out.len());
        out.sort_by(|a, b| b.time.cmp(&a.time));
        out.truncate(q.max_results);
        Ok(out)
    }
}
