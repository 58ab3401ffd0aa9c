// ABOUTME: Run-log records, scan filters, and the monthly shard key that routes records to files.
// ABOUTME: A record's shard is fixed by its request time and never by the time of a later operation.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle state of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Success,
    Failure,
}

/// One line of the run history. Created once by an append and mutated in
/// place by later updates (typically status and completion fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLog {
    pub id: String,
    pub request_time: DateTime<Utc>,
    pub status: RunStatus,
    /// Kind of run, e.g. `generate` or `upscale`.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Payload fields without a dedicated slot, e.g. `seed` or `cfgScale`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunLog {
    /// A freshly started run with no outcome yet.
    pub fn started(id: String, category: String, request_time: DateTime<Utc>, input: Value) -> Self {
        Self {
            id,
            request_time,
            status: RunStatus::Running,
            category,
            subtype: None,
            provider: None,
            model: None,
            input,
            output: None,
            error: None,
            completion_time: None,
            duration_ms: None,
            extra: Map::new(),
        }
    }

    pub fn shard(&self) -> ShardKey {
        ShardKey::for_time(&self.request_time)
    }
}

/// Equality filters applied during scans. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunLogFilter {
    pub category: Option<String>,
    pub subtype: Option<String>,
    pub status: Option<RunStatus>,
}

impl RunLogFilter {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn status(mut self, status: RunStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, log: &RunLog) -> bool {
        if let Some(category) = &self.category
            && &log.category != category
        {
            return false;
        }
        if let Some(subtype) = &self.subtype
            && log.subtype.as_ref() != Some(subtype)
        {
            return false;
        }
        if let Some(status) = self.status
            && log.status != status
        {
            return false;
        }
        true
    }
}

/// A calendar month (UTC) identifying one shard file, `YYYY-MM.jsonl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShardKey {
    pub year: i32,
    pub month: u32,
}

impl ShardKey {
    pub const EXTENSION: &'static str = "jsonl";

    pub fn for_time(time: &DateTime<Utc>) -> Self {
        Self {
            year: time.year(),
            month: time.month(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self, Self::EXTENSION)
    }

    /// Parse a shard file name such as `2025-03.jsonl`. Anything else is `None`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".jsonl")?;
        let (year, month) = stem.split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        let year: i32 = year.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { year, month })
    }
}

impl fmt::Display for ShardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
