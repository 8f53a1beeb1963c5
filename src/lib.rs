//! Read-only Windows diagnostics: queries the event logs for overheating, crash and hang
//! evidence and writes a plain-text report.

pub mod record;
pub mod event_xml;
pub mod decoder;
pub mod source;
pub mod catalog;
pub mod bugcheck;
pub mod classify;
pub mod verdict;
pub mod host;
pub mod status;
pub mod report;
pub mod config;
pub mod run;
pub mod cli;
