//! Bugcheck payload of Kernel-Power event 41 records.

use crate::record::LogRecord;

pub const UNAVAILABLE: &str = "unavailable";

/// Codes that point at the display driver (TDR failure and hang).
pub const VIDEO_CODES: &[&str] = &["116", "292"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BugcheckDetail {
    pub code: String,
    pub parameter: String,
    pub interpretation: String,
    pub overheat_related: bool,
}

/// Pulls `BugcheckCode` and `BugcheckParameter1` out of the event's XML payload.
pub fn extract(xml: &str) -> Option<(String, String)> {
    let m = crate::event_xml::event_data_map(xml);
    let code = m.get("BugcheckCode")?.trim().to_string();
    if code.is_empty() { return None; }
    let param = m.get("BugcheckParameter1").map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).unwrap_or_else(|| UNAVAILABLE.to_string());
    Some((code, param))
}

pub fn interpret(code: &str) -> String {
    match code {
        "0" => "Clean shutdown or power loss (NOT a crash/overheat)".to_string(),
        "116" => "Video driver timeout (TDR) - possible GPU overheat or driver fault".to_string(),
        "292" => "Video driver hang detected - possible GPU overheat".to_string(),
        UNAVAILABLE => "Bugcheck data unavailable".to_string(),
        other => format!("System crash (bugcheck code {})", other),
    }
}

pub fn decode(r: &LogRecord) -> BugcheckDetail {
    let (code, parameter) = r.raw_xml.as_deref().and_then(extract).unwrap_or_else(|| (UNAVAILABLE.to_string(), UNAVAILABLE.to_string()));
    let interpretation = interpret(&code);
    let overheat_related = VIDEO_CODES.contains(&code.as_str());
    BugcheckDetail { code, parameter, interpretation, overheat_related }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fake::rec;

    fn with_xml(xml: &str) -> LogRecord {
        let mut r = rec("Microsoft-Windows-Kernel-Power", 41, 1, "The system has rebooted without cleanly shutting down first.");
        r.raw_xml = Some(xml.to_string());
        r
    }

    #[test]
    fn code_zero_is_not_a_trigger() {
        let d = decode(&with_xml("<Event><EventData><Data Name=\"BugcheckCode\">0</Data><Data Name=\"BugcheckParameter1\">0x0</Data></EventData></Event>"));
        assert_eq!(d.code, "0");
        assert_eq!(d.parameter, "0x0");
        assert_eq!(d.interpretation, "Clean shutdown or power loss (NOT a crash/overheat)");
        assert!(!d.overheat_related);
    }

    #[test]
    fn video_codes_trigger() {
        for code in ["116", "292"] {
            let d = decode(&with_xml(&format!("<Event><EventData><Data Name=\"BugcheckCode\">{}</Data></EventData></Event>", code)));
            assert!(d.overheat_related);
            assert!(d.interpretation.contains("Video driver"));
            assert_eq!(d.parameter, UNAVAILABLE);
        }
    }

    #[test]
    fn other_codes_are_generic_crashes() {
        let d = decode(&with_xml("<Event><EventData><Data Name=\"BugcheckCode\">159</Data><Data Name=\"BugcheckParameter1\">0x3</Data></EventData></Event>"));
        assert_eq!(d.interpretation, "System crash (bugcheck code 159)");
        assert!(!d.overheat_related);
    }

    #[test]
    fn missing_payload_uses_placeholders() {
        let d = decode(&rec("Microsoft-Windows-Kernel-Power", 41, 1, ""));
        assert_eq!(d.code, UNAVAILABLE);
        assert_eq!(d.parameter, UNAVAILABLE);
        assert_eq!(d.interpretation, "Bugcheck data unavailable");
        let d = decode(&with_xml("<Event><EventData><Data Name=\"SleepInProgress\">false</Data></EventData></Event>"));
        assert_eq!(d.code, UNAVAILABLE);
        assert!(extract("<<<garbage").is_none());
    }

    #[test]
    fn truncated_payload_degrades_to_unavailable() {
        for xml in ["<Event><EventData><Data Name=", "<Event><EventData><Data Name=\"Bugcheck", "<Event><EventData><Data Name=\u{201c}"] {
            let d = decode(&with_xml(xml));
            assert_eq!(d.code, UNAVAILABLE);
            assert_eq!(d.interpretation, "Bugcheck data unavailable");
            assert!(!d.overheat_related);
        }
    }
}
