//! Event log of coordinator calls.
//!
//! Each analysis or comparison is recorded with its timing and result. When a
//! path is configured the whole log is rewritten as pretty JSON after every
//! record, so the file can be inspected with `--event-stats`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, error, warn};

/// Kind of coordinator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Analysis,
    Comparison,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Analysis => write!(f, "analysis"),
            EventType::Comparison => write!(f, "comparison"),
        }
    }
}

/// One recorded call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub user_input: String,
    /// Seconds.
    pub processing_time: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Aggregate figures over all recorded events.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventStats {
    pub total_events: usize,
    pub successful_events: usize,
    pub failed_events: usize,
    /// Percentage.
    pub success_rate: f64,
    pub event_types: BTreeMap<EventType, usize>,
    pub average_processing_time: f64,
}

impl EventStats {
    pub fn from_events(events: &[Event]) -> Self {
        if events.is_empty() {
            return Self::default();
        }

        let total_events = events.len();
        let successful_events = events.iter().filter(|e| e.success).count();

        let mut event_types = BTreeMap::new();
        for event in events {
            *event_types.entry(event.event_type).or_insert(0) += 1;
        }

        let total_time: f64 = events.iter().map(|e| e.processing_time).sum();

        Self {
            total_events,
            successful_events,
            failed_events: total_events - successful_events,
            success_rate: (successful_events as f64 / total_events as f64) * 100.0,
            event_types,
            average_processing_time: total_time / total_events as f64,
        }
    }
}

/// Details of a finished call, as handed to [`EventLog::record`].
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event_type: EventType,
    pub user_input: String,
    pub processing_time: f64,
    pub success: bool,
    pub error_message: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

/// In-memory event list with optional JSON persistence.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
    path: Option<PathBuf>,
    next_seq: AtomicU64,
}

impl EventLog {
    /// Log kept in memory only.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Log persisted to `path`, continuing any events already stored there.
    ///
    /// An unreadable file is moved aside to `<path>.corrupt` before the log
    /// takes it over. If that fails too, the log stays in memory only.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (events, path) = match Self::load(&path) {
            Ok(events) => (events, Some(path)),
            Err(e) => {
                let backup = corrupt_backup_path(&path);
                match std::fs::rename(&path, &backup) {
                    Ok(()) => {
                        warn!(
                            "Unreadable event log {} moved to {}: {:#}",
                            path.display(),
                            backup.display(),
                            e
                        );
                        (Vec::new(), Some(path))
                    }
                    Err(rename_err) => {
                        error!(
                            "Unreadable event log {} ({:#}) could not be moved aside ({}); events will not be saved",
                            path.display(),
                            e,
                            rename_err
                        );
                        (Vec::new(), None)
                    }
                }
            }
        };

        Self {
            next_seq: AtomicU64::new(events.len() as u64),
            events: Mutex::new(events),
            path,
        }
    }

    /// Read events from a JSON file. A missing file is an empty log.
    pub fn load(path: &Path) -> Result<Vec<Event>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event log: {}", path.display()))?;
        let events = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse event log: {}", path.display()))?;
        Ok(events)
    }

    /// Append an event and persist the log. Persistence errors are logged, not returned.
    pub fn record(&self, record: EventRecord) -> Event {
        let timestamp = Utc::now();
        let event = Event {
            event_id: format!(
                "event_{}_{}",
                timestamp.timestamp_millis(),
                self.next_seq.fetch_add(1, Ordering::Relaxed)
            ),
            timestamp,
            event_type: record.event_type,
            user_input: record.user_input,
            processing_time: record.processing_time,
            success: record.success,
            error_message: record.error_message,
            metadata: record.metadata,
        };

        debug!(
            "Event {}: {} - {}",
            event.event_id,
            event.event_type,
            if event.success { "SUCCESS" } else { "FAILED" }
        );

        let mut events = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.clone());

        if let Some(ref path) = self.path {
            if let Err(e) = save(path, &events) {
                error!("Failed to save events: {}", e);
            }
        }

        event
    }

    /// Recorded events, optionally filtered by type and limited to the most recent `limit`.
    pub fn events(&self, event_type: Option<EventType>, limit: Option<usize>) -> Vec<Event> {
        let events = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let filtered: Vec<Event> = events
            .iter()
            .filter(|e| event_type.map_or(true, |t| e.event_type == t))
            .cloned()
            .collect();

        match limit {
            Some(n) if n < filtered.len() => filtered[filtered.len() - n..].to_vec(),
            _ => filtered,
        }
    }

    pub fn stats(&self) -> EventStats {
        EventStats::from_events(&self.events(None, None))
    }
}

fn corrupt_backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

fn save(path: &Path, events: &[Event]) -> Result<()> {
    let json = serde_json::to_string_pretty(events).context("Failed to serialize events")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write event log: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(event_type: EventType, success: bool, seconds: f64) -> EventRecord {
        EventRecord {
            event_type,
            user_input: "Analyze player: Player X".to_string(),
            processing_time: seconds,
            success,
            error_message: if success { None } else { Some("boom".to_string()) },
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_stats() {
        let log = EventLog::in_memory();
        log.record(record(EventType::Analysis, true, 1.0));
        log.record(record(EventType::Analysis, false, 2.0));
        log.record(record(EventType::Comparison, true, 3.0));

        let stats = log.stats();

        assert_eq!(stats.total_events, 3);
        assert_eq!(stats.successful_events, 2);
        assert_eq!(stats.failed_events, 1);
        assert!((stats.success_rate - 66.666).abs() < 0.01);
        assert_eq!(stats.event_types.get(&EventType::Analysis), Some(&2));
        assert_eq!(stats.average_processing_time, 2.0);
    }

    #[test]
    fn test_empty_stats() {
        assert_eq!(EventLog::in_memory().stats(), EventStats::default());
    }

    #[test]
    fn test_filter_and_limit() {
        let log = EventLog::in_memory();
        log.record(record(EventType::Analysis, true, 1.0));
        log.record(record(EventType::Comparison, true, 1.0));
        log.record(record(EventType::Analysis, false, 1.0));

        assert_eq!(log.events(Some(EventType::Analysis), None).len(), 2);
        let latest = log.events(None, Some(1));
        assert_eq!(latest.len(), 1);
        assert!(!latest[0].success);
    }

    #[test]
    fn test_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        let log = EventLog::with_file(&path);
        log.record(record(EventType::Comparison, false, 0.5));

        let stored = EventLog::load(&path).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].error_message.as_deref(), Some("boom"));

        let reopened = EventLog::with_file(&path);
        reopened.record(record(EventType::Analysis, true, 0.5));
        assert_eq!(EventLog::load(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_unreadable_log_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        let truncated = r#"[{"event_id": "old", "timestamp": "#;
        std::fs::write(&path, truncated).unwrap();

        let log = EventLog::with_file(&path);
        log.record(record(EventType::Analysis, true, 0.1));

        let backup = dir.path().join("events.json.corrupt");
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), truncated);
        assert_eq!(EventLog::load(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_event_ids_are_unique() {
        let log = EventLog::in_memory();
        for _ in 0..50 {
            log.record(record(EventType::Analysis, true, 0.0));
        }

        let ids: std::collections::HashSet<String> =
            log.events(None, None).into_iter().map(|e| e.event_id).collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_event_ids_continue_after_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        let first = EventLog::with_file(&path).record(record(EventType::Analysis, true, 0.0));
        let second = EventLog::with_file(&path).record(record(EventType::Analysis, true, 0.0));

        assert!(first.event_id.ends_with("_0"));
        assert!(second.event_id.ends_with("_1"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EventLog::load(&dir.path().join("none.json")).unwrap().is_empty());
    }
}
