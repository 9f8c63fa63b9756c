//! Athletics Hub - event log
//! JSONL audit stream, one file per UTC day.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event types ───────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct ToolCallEvent {
    pub ts:          String,
    pub event:       &'static str,   // "TOOL_CALL"
    pub tool:        String,
    pub sport:       Option<String>,
    pub ok:          bool,
    pub duration_ms: u64,
    pub message:     String,
}

#[derive(Serialize, Debug)]
pub struct ScrapeStatusEvent {
    pub ts:      String,
    pub event:   &'static str,       // "SCRAPE_STATUS"
    pub sport:   String,
    pub entity:  String,             // roster | schedule | stats | news
    pub url:     String,
    pub format:  Option<String>,     // None = no known template on the page
    pub ok:      bool,
    pub items:   usize,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("athletics-logger-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn appends_one_json_line_per_event() {
        let dir = scratch_dir("append");
        let logger = EventLogger::new(&dir);

        for ok in [true, false] {
            logger
                .log(&ToolCallEvent {
                    ts: now_iso(),
                    event: "TOOL_CALL",
                    tool: "get_roster".to_string(),
                    sport: Some("softball".to_string()),
                    ok,
                    duration_ms: 12,
                    message: "ok".to_string(),
                })
                .unwrap();
        }

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let raw = fs::read_to_string(dir.join(format!("{date}.jsonl"))).unwrap();
        let lines: Vec<_> = raw.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "TOOL_CALL");
        assert_eq!(first["sport"], "softball");
        assert_eq!(first["ok"], true);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_format_serializes_as_null() {
        let ev = ScrapeStatusEvent {
            ts: now_iso(),
            event: "SCRAPE_STATUS",
            sport: "football".to_string(),
            entity: "roster".to_string(),
            url: "https://example.com/sports/football/roster".to_string(),
            format: None,
            ok: true,
            items: 0,
            message: "no template".to_string(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert!(json["format"].is_null());
        assert_eq!(json["items"], 0);
    }
}
