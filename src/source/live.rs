use std::cell::RefCell;
use std::collections::HashMap;
use std::ptr;
use windows_sys::Win32::System::EventLog::*;
use windows_sys::Win32::Foundation::GetLastError;
use crate::record::LogRecord;
use super::{EventSource, LogQuery, QueryError};

const ERROR_ACCESS_DENIED: u32 = 5;
const ERROR_INSUFFICIENT_BUFFER: u32 = 122;
const ERROR_NO_MORE_ITEMS: u32 = 259;
const ERROR_EVT_CHANNEL_NOT_FOUND: u32 = 15007;

struct Handle(EVT_HANDLE);
impl Drop for Handle { fn drop(&mut self) { unsafe { EvtClose(self.0); } } }

fn w(s: &str) -> Vec<u16> { let mut v = s.encode_utf16().collect::<Vec<u16>>(); v.push(0); v }

/// Queries the running event log service through `EvtQuery`, newest events first.
pub struct LiveSource {
    publishers: RefCell<HashMap<String, Option<Handle>>>,
}

impl LiveSource {
    pub fn new() -> Self { Self { publishers: RefCell::new(HashMap::new()) } }

    fn format_message(&self, provider: &str, ev: EVT_HANDLE) -> Option<String> {
        let mut cache = self.publishers.borrow_mut();
        let meta = cache.entry(provider.to_string()).or_insert_with(|| {
            let h = unsafe { EvtOpenPublisherMetadata(0, w(provider).as_ptr(), ptr::null(), 0, 0) };
            if h == 0 { log::debug!("No publisher metadata for {}: {}", provider, unsafe { GetLastError() }); None } else { Some(Handle(h)) }
        });
        let meta = meta.as_ref()?;
        unsafe { format_event_message(meta.0, ev) }
    }
}

impl Default for LiveSource {
    fn default() -> Self { Self::new() }
}

impl EventSource for LiveSource {
    fn name(&self) -> String { "Windows Event Log API".to_string() }

    fn query(&self, q: &LogQuery) -> Result<Vec<LogRecord>, QueryError> {
        let xpath = q.xpath();
        log::debug!("EvtQuery {} {}", q.log, xpath);
        let h = unsafe { EvtQuery(0, w(q.log).as_ptr(), w(&xpath).as_ptr(), (EvtQueryChannelPath | EvtQueryReverseDirection) as u32) };
        if h == 0 {
            let code = unsafe { GetLastError() };
            return Err(match code {
                ERROR_EVT_CHANNEL_NOT_FOUND => QueryError::LogNotFound(q.log.to_string()),
                ERROR_ACCESS_DENIED => QueryError::AccessDenied(q.log.to_string()),
                _ => QueryError::Api { log: q.log.to_string(), code },
            });
        }
        let h = Handle(h);
        let mut out = Vec::new();
        let mut arr: [EVT_HANDLE; 64] = [0; 64];
        'outer: loop {
            let mut returned: u32 = 0;
            let ok = unsafe { EvtNext(h.0, arr.len() as u32, arr.as_mut_ptr(), 1000, 0, &mut returned) };
            if ok == 0 {
                let code = unsafe { GetLastError() };
                if code != ERROR_NO_MORE_ITEMS && code != 0 { log::error!("EvtNext error on {}: {}", q.log, code); }
                break;
            }
            if returned == 0 { break; }
            let batch: Vec<Handle> = arr.iter().take(returned as usize).map(|&ev| Handle(ev)).collect();
            for ev in &batch {
                if out.len() >= q.max_results { break 'outer; }
                if let Some(xml) = unsafe { render_xml(ev.0) } && let Some(mut item) = crate::event_xml::parse_record(&xml) {
                    if let Some(msg) = self.format_message(&item.provider, ev.0).or_else(|| crate::decoder::decode_event(&item.provider, item.event_id, &xml)) { item.message = msg; }
                    out.push(item);
                }
            }
        }
        Ok(out)
    }
}

unsafe fn render_xml(ev: EVT_HANDLE) -> Option<String> {
    let mut used: u32 = 0;
    let mut count: u32 = 0;
    let ok = unsafe { EvtRender(0, ev, EvtRenderEventXml as u32, 0, ptr::null_mut(), &mut used, &mut count) };
    let need = if ok == 0 { used } else { 0 };
    if need == 0 { return None; }
    let mut buf: Vec<u16> = vec![0u16; (need as usize).div_ceil(2)];
    if unsafe { EvtRender(0, ev, EvtRenderEventXml as u32, need, buf.as_mut_ptr() as *mut _, &mut used, &mut count) } != 0 {
        let s = String::from_utf16_lossy(&buf);
        Some(s.trim_matches(char::from(0)).to_string())
    } else { None }
}

unsafe fn format_event_message(meta: EVT_HANDLE, ev: EVT_HANDLE) -> Option<String> {
    let mut used: u32 = 0;
    let flags = EvtFormatMessageEvent as u32;
    let ok = unsafe { EvtFormatMessage(meta, ev, 0, 0, ptr::null(), flags, 0, ptr::null_mut(), &mut used) };
    if ok != 0 || used == 0 { return None; }
    let code = unsafe { GetLastError() };
    if code != ERROR_INSUFFICIENT_BUFFER { return None; }
    let mut buf: Vec<u16> = vec![0u16; used as usize];
    if unsafe { EvtFormatMessage(meta, ev, 0, 0, ptr::null(), flags, used, buf.as_mut_ptr(), &mut used) } == 0 { return None; }
    let s = String::from_utf16_lossy(&buf).trim_matches(char::from(0)).trim().to_string();
    if s.is_empty() { None } else { Some(s) }
}
