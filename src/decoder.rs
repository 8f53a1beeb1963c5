//! Readable messages for events read without their publisher's message tables (offline
//! `.evtx` files, or providers whose metadata cannot be opened).

use std::collections::HashMap;

pub fn decode_event(provider: &str, event_id: u32, xml: &str) -> Option<String> {
    let m: HashMap<String, String> = crate::event_xml::event_data_map(xml);
    let get = |k: &str| m.get(k).cloned().unwrap_or_default();
    match provider {
        "Microsoft-Windows-Kernel-Power" => match event_id {
            41 => Some("The system has rebooted without cleanly shutting down first.".to_string()),
            42 => Some("The system is entering sleep.".to_string()),
            105 => {
                let ac = get("AcOnline");
                if ac.is_empty() { Some("Power source change.".to_string()) } else { Some(format!("Power source change (AC online: {}).", ac)) }
            }
            109 => Some("The kernel power manager has initiated a shutdown transition.".to_string()),
            2 | 86 | 88 => {
                let zone = get("ThermalZoneDeviceInstance");
                let temp = get("CurrentTemperature");
                let mut s = "Thermal zone reported a temperature threshold event".to_string();
                if !zone.is_empty() { s.push_str(&format!(" on {}", zone)); }
                if !temp.is_empty() { s.push_str(&format!(" (temperature {})", temp)); }
                s.push('.');
                Some(s)
            }
            _ => None,
        },
        "Microsoft-Windows-Kernel-Processor-Power" => match event_id {
            37 => {
                let cpu = get("Group");
                let pct = get("PercentOfMaxFrequency");
                if pct.is_empty() { Some("The speed of a processor is being limited by system firmware.".to_string()) }
                else { Some(format!("The speed of processor group {} is being limited by system firmware ({}% of maximum).", cpu, pct)) }
            }
            56 => Some("Processor power management reported a thermal or power capability change.".to_string()),
            _ => None,
        },
        "EventLog" => {
            if event_id == 6008 {
                let t = get("param1");
                let d = get("param2");
                if t.is_empty() { return Some("The previous system shutdown was unexpected.".to_string()); }
                return Some(format!("The previous system shutdown at {} on {} was unexpected.", t, d));
            }
            None
        }
        "Microsoft-Windows-WER-SystemErrorReporting" => {
            let bug = if m.contains_key("BugcheckCode") { get("BugcheckCode") } else { get("param1") };
            let dump = get("param2");
            if bug.is_empty() { return None; }
            if dump.is_empty() { Some(format!("The computer has rebooted from a bugcheck: {}.", bug)) } else { Some(format!("The computer has rebooted from a bugcheck: {}. Dump saved in: {}.", bug, dump)) }
        }
        "Microsoft-Windows-WHEA-Logger" => match event_id {
            18 => {
                let src = get("ErrorSource");
                let apic = m.get("ApicId").or_else(|| m.get("ProcessorAPICID")).cloned().unwrap_or_default();
                let ev = if apic.is_empty() { src } else { format!("{} APIC {}", src, apic) };
                Some(format!("A fatal hardware error has occurred ({}).", ev))
            }
            17 | 19 => {
                let comp = get("Component");
                let src = get("ErrorSource");
                let ev = if comp.is_empty() { src } else { comp };
                Some(format!("A corrected hardware error has occurred ({}).", ev))
            }
            47 => Some("A corrected memory error has occurred.".to_string()),
            _ => Some(format!("Hardware error reported by WHEA (event {}).", event_id)),
        },
        "Display" => {
            if event_id == 4101 {
                let drv = get("param1");
                if drv.is_empty() { return Some("Display driver stopped responding and has successfully recovered.".to_string()); }
                return Some(format!("Display driver {} stopped responding and has successfully recovered.", drv));
            }
            None
        }
        "Disk" => {
            let dev = m.get("DeviceName").or_else(|| m.get("param1")).cloned().unwrap_or_default();
            match event_id {
                7 => Some(format!("The device, {}, has a bad block.", dev)),
                11 => Some(format!("The driver detected a controller error on {}.", dev)),
                51 => Some("An error was detected on device during a paging operation.".to_string()),
                153 => Some(format!("The IO operation on {} was retried.", dev)),
                157 => Some(format!("Disk {} has been surprise removed.", dev)),
                _ => if dev.is_empty() { None } else { Some(format!("Disk event {} on {}.", event_id, dev)) },
            }
        }
        "Microsoft-Windows-MemoryDiagnostics-Results" => match event_id {
            1101 => Some("The Windows Memory Diagnostic tested the computer's memory and detected no errors.".to_string()),
            1102 => Some("The Windows Memory Diagnostic tested the computer's memory and detected hardware errors.".to_string()),
            1201 => Some("The Windows Memory Diagnostic tested the computer's memory and detected no errors.".to_string()),
            1202 => Some("The Windows Memory Diagnostic tested the computer's memory and detected hardware errors.".to_string()),
            _ => None,
        },
        "Application Error" => {
            if event_id != 1000 { return None; }
            let app = m.get("AppName").or_else(|| m.get("param1")).cloned().unwrap_or_default();
            let module = m.get("ModuleName").or_else(|| m.get("param4")).cloned().unwrap_or_default();
            let code = m.get("ExceptionCode").or_else(|| m.get("param7")).cloned().unwrap_or_default();
            Some(format!("Faulting application name: {}, faulting module name: {}, exception code: {} (application crash).", app, module, code))
        }
        "Application Hang" => {
            if event_id != 1002 { return None; }
            let app = m.get("AppName").or_else(|| m.get("param1")).cloned().unwrap_or_default();
            Some(format!("The program {} stopped interacting with Windows and was closed.", app))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_power_41_maps_message() {
        let xml = "<Event><EventData><Data Name=\"BugcheckCode\">0</Data></EventData></Event>";
        let msg = decode_event("Microsoft-Windows-Kernel-Power", 41, xml).unwrap();
        assert!(msg.contains("without cleanly shutting down"));
    }

    #[test]
    fn eventlog_6008_includes_time() {
        let xml = "<Event><EventData><Data>12:01:02 AM</Data></EventData></Event>";
        let msg = decode_event("EventLog", 6008, xml).unwrap();
        assert!(msg.contains("unexpected"));
        let xml = "<Event><EventData><Data Name=\"param1\">12:01:02 AM</Data><Data Name=\"param2\">10/1/2026</Data></EventData></Event>";
        let msg = decode_event("EventLog", 6008, xml).unwrap();
        assert!(msg.contains("12:01:02 AM on 10/1/2026"));
    }

    #[test]
    fn display_4101_mentions_stopped_responding() {
        let xml = "<Event><EventData><Data Name=\"param1\">nvlddmkm</Data></EventData></Event>";
        let msg = decode_event("Display", 4101, xml).unwrap();
        assert!(msg.contains("nvlddmkm"));
        assert!(msg.contains("stopped responding"));
    }

    #[test]
    fn application_error_mentions_crash() {
        let xml = "<Event><EventData><Data Name=\"AppName\">game.exe</Data><Data Name=\"ModuleName\">d3d11.dll</Data></EventData></Event>";
        let msg = decode_event("Application Error", 1000, xml).unwrap();
        assert!(msg.contains("game.exe"));
        assert!(msg.contains("crash"));
    }

    #[test]
    fn unknown_provider_is_none() {
        assert!(decode_event("Schannel", 36887, "<Event/>").is_none());
    }
}
