use std::collections::HashMap;
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event as XmlEvent;
use crate::record::LogRecord;

/// `<EventData><Data Name="..">value</Data></EventData>` pairs, in document order.
pub fn event_data_pairs(xml: &str) -> Vec<(String, String)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_event_data = false;
    let mut cur_name: Option<String> = None;
    let mut out: Vec<(String, String)> = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(XmlEvent::Start(e)) => {
                let en = e.name();
                let name = String::from_utf8_lossy(en.as_ref()).into_owned();
                if name == "EventData" || name == "UserData" { in_event_data = true; }
                else if in_event_data && name == "Data" {
                    cur_name = None;
                    for a in e.attributes().flatten() {
                        if a.key.as_ref() == b"Name" && let Ok(val) = a.unescape_value() {
                            cur_name = Some(val.to_string());
                        }
                    }
                }
            }
            Ok(XmlEvent::End(e)) => {
                let en = e.name();
                let name = en.as_ref();
                if name == b"EventData" || name == b"UserData" { in_event_data = false; }
                if name == b"Data" { cur_name = None; }
            }
            Ok(XmlEvent::Text(t)) => {
                if in_event_data && let Some(n) = cur_name.as_ref() {
                    let v = t.unescape().map(|c| c.into_owned()).unwrap_or_else(|_| String::from_utf8_lossy(t.as_ref()).into_owned());
                    let v = v.trim().to_string();
                    if !v.is_empty() { out.push((n.clone(), v)); }
                }
            }
            Ok(XmlEvent::Eof) => break,
            Err(e) => { log::debug!("EventData parse stopped: {}", e); break; }
            _ => {}
        }
        buf.clear();
    }
    out
}

/// Substring scan used when the document is not well-formed XML.
pub fn event_data_pairs_fallback(xml: &str) -> Vec<(String, String)> {
    let mut res = Vec::new();
    let mut rest = xml;
    while let Some(i) = rest.find("<Data ") {
        rest = rest.get(i + 6..).unwrap_or("");
        if let Some(ns) = rest.find("Name=")
            && let Some(after) = rest.get(ns + 5..)
            && let Some(quote) = after.chars().next()
            && let Some(after) = after.get(quote.len_utf8()..)
            && let Some(ne) = after.find(quote)
            && let Some(gt) = after.get(ne..).and_then(|t| t.find('>'))
            && let Some(val_part) = after.get(ne + gt + 1..)
            && let Some(ve) = val_part.find("</Data>")
        {
            let name = after.get(..ne).unwrap_or("");
            res.push((name.to_string(), val_part.get(..ve).unwrap_or("").trim().to_string()));
            rest = val_part.get(ve + 7..).unwrap_or("");
            continue;
        }
        break;
    }
    res
}

pub fn event_data_pairs_or_fallback(xml: &str) -> Vec<(String, String)> {
    let m = event_data_pairs(xml);
    if m.is_empty() { event_data_pairs_fallback(xml) } else { m }
}

pub fn event_data_map(xml: &str) -> HashMap<String, String> {
    event_data_pairs_or_fallback(xml).into_iter().collect()
}

/// Builds a record from the `<System>` block of a rendered event. The message is left to the
/// caller; it is seeded with the EventData values so that offline records still carry text.
pub fn parse_record(xml: &str) -> Option<LogRecord> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut time_opt: Option<DateTime<Utc>> = None;
    let mut level_opt: Option<u8> = None;
    let mut provider = String::new();
    let mut event_id_opt: Option<u32> = None;
    let mut cur = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(XmlEvent::Start(e)) | Ok(XmlEvent::Empty(e)) => {
                cur = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if cur == "TimeCreated" {
                    for a in e.attributes().flatten() {
                        if a.key.as_ref() == b"SystemTime" && let Ok(v) = a.unescape_value() && let Some(dt) = parse_system_time(&v) { time_opt = Some(dt); }
                    }
                } else if cur == "Provider" {
                    for a in e.attributes().flatten() {
                        if a.key.as_ref() == b"Name" && let Ok(v) = a.unescape_value() { provider = v.to_string(); }
                    }
                }
            }
            Ok(XmlEvent::Text(t)) => {
                let v = String::from_utf8_lossy(t.as_ref()).into_owned();
                if cur == "Level" { if let Ok(n) = v.trim().parse::<u8>() { level_opt = Some(n); } }
                else if cur == "EventID" { if let Ok(n) = v.trim().parse::<u32>() { event_id_opt = Some(n); } }
            }
            Ok(XmlEvent::End(_)) => cur.clear(),
            Ok(XmlEvent::Eof) => break,
            Err(e) => { log::debug!("Event XML rejected: {}", e); return None; }
            _ => {}
        }
        buf.clear();
    }
    let time = time_opt?;
    let event_id = event_id_opt?;
    let message = event_data_pairs_or_fallback(xml).into_iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join(", ");
    Some(LogRecord { time, event_id, provider, level: level_opt.unwrap_or(0), message, raw_xml: Some(xml.to_string()) })
}

pub fn parse_system_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) { return Some(dt.with_timezone(&Utc)); }
    let mut alt = s.replace(' ', "T");
    if !alt.ends_with('Z') && !alt.contains('+') { alt.push('Z'); }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&alt) { return Some(dt.with_timezone(&Utc)); }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") { return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)); }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const KP41: &str = "<Event xmlns=\"http://schemas.microsoft.com/win/2004/08/events/event\"><System><Provider Name=\"Microsoft-Windows-Kernel-Power\" Guid=\"{331c3b3a}\"/><EventID>41</EventID><Level>1</Level><TimeCreated SystemTime=\"2026-10-01T08:15:30.1234567Z\"/><Channel>System</Channel></System><EventData><Data Name=\"BugcheckCode\">0</Data><Data Name=\"BugcheckParameter1\">0x0</Data><Data Name=\"SleepInProgress\">false</Data></EventData></Event>";

    #[test]
    fn parses_eventdata_pairs_in_order() {
        let m = event_data_pairs(KP41);
        assert_eq!(m[0], ("BugcheckCode".to_string(), "0".to_string()));
        assert_eq!(m[1], ("BugcheckParameter1".to_string(), "0x0".to_string()));
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn fallback_parses_truncated_document() {
        let xml = "<Event><EventData><Data Name=\"BugcheckCode\">116</Data><Data Name='BugcheckParameter1'>0xffff</Data>";
        let m = event_data_map(xml);
        assert_eq!(m.get("BugcheckCode").unwrap(), "116");
        assert_eq!(m.get("BugcheckParameter1").unwrap(), "0xffff");
    }

    #[test]
    fn fallback_survives_cut_off_attributes() {
        assert!(event_data_pairs_fallback("<Event><EventData><Data Name=").is_empty());
        assert!(event_data_pairs_fallback("<Data Name=\u{201c}x").is_empty());
        assert!(event_data_pairs_fallback("<Data Name=\u{201c}Code\u{201c}>7</Data>").iter().any(|(k, v)| k == "Code" && v == "7"));
        assert!(event_data_pairs_fallback("<Data Name=\"BugcheckCode\">1").is_empty());
        assert!(event_data_pairs_fallback("<Data ").is_empty());
    }

    #[test]
    fn parse_record_reads_system_block() {
        let r = parse_record(KP41).unwrap();
        assert_eq!(r.event_id, 41);
        assert_eq!(r.level, 1);
        assert_eq!(r.provider, "Microsoft-Windows-Kernel-Power");
        assert_eq!(r.time.format("%Y-%m-%d %H:%M:%S").to_string(), "2026-10-01 08:15:30");
        assert!(r.message.contains("BugcheckCode=0"));
        assert!(r.raw_xml.is_some());
    }

    #[test]
    fn parse_record_requires_time_and_id() {
        assert!(parse_record("<Event><System><EventID>7</EventID></System></Event>").is_none());
        assert!(parse_record("not xml at all").is_none());
    }

    #[test]
    fn system_time_variants() {
        assert!(parse_system_time("2025-11-30T12:00:00Z").is_some());
        assert!(parse_system_time("2025-11-30 12:00:00").is_some());
        assert!(parse_system_time("yesterday").is_none());
    }
}
