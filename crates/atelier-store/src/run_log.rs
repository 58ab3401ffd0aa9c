// ABOUTME: Append-only run history sharded into one JSONL file per calendar month.
// ABOUTME: Supports O(1) append, in-place update by id within a shard, and time-ordered scans.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use atelier_core::{RunLog, RunLogFilter, ShardKey};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::atomic::write_atomic;

/// Directory under the data root holding the shard files.
pub const RUN_LOG_DIR: &str = "run-logs";

/// Fields an update may never change: they identify the record and its shard.
const IMMUTABLE_FIELDS: [&str; 2] = ["id", "requestTime"];

/// Errors that can occur during run log operations.
#[derive(Debug, Error)]
pub enum RunLogError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("update would leave run {id} unreadable: {source}")]
    InvalidUpdate {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Monthly-sharded JSONL run log rooted at a single directory.
///
/// Writers to the same shard (append, update, delete) are serialized FIFO
/// through a per-shard queue. Scans take no lock: rewrites are atomic
/// renames, and a torn trailing line from an in-flight append is skipped
/// like any other malformed line. Lines are handled as bytes, so a tear
/// inside a multibyte character only costs that line.
#[derive(Clone)]
pub struct LogStore {
    inner: Arc<Inner>,
}

struct Inner {
    dir: PathBuf,
    shard_queues: StdMutex<HashMap<ShardKey, Arc<Mutex<()>>>>,
}

impl LogStore {
    /// Log store at `<root>/run-logs`.
    pub fn open(root: &Path) -> Self {
        Self::new(root.join(RUN_LOG_DIR))
    }

    pub fn new(dir: PathBuf) -> Self {
        Self {
            inner: Arc::new(Inner {
                dir,
                shard_queues: StdMutex::new(HashMap::new()),
            }),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    pub fn shard_path(&self, key: ShardKey) -> PathBuf {
        self.inner.shard_path(key)
    }

    /// Append one record to the shard owning its `request_time`.
    pub async fn append(&self, record: &RunLog) -> Result<(), RunLogError> {
        let key = record.shard();
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        self.enqueue(key, move |inner| async move { inner.append_line(key, line).await })
            .await
    }

    /// Merge `fields` into the record `id` inside the shard owning
    /// `request_time`. Keys are replaced whole; `id` and `requestTime` are
    /// never changed. Returns whether a record was rewritten; a missing
    /// shard or unknown id is a no-op that returns `false`. A merge that
    /// would no longer decode as a [`RunLog`] fails with
    /// [`RunLogError::InvalidUpdate`] and leaves the shard untouched.
    pub async fn update(
        &self,
        id: &str,
        mut fields: Map<String, Value>,
        request_time: DateTime<Utc>,
    ) -> Result<bool, RunLogError> {
        for key in IMMUTABLE_FIELDS {
            if fields.remove(key).is_some() {
                tracing::warn!("ignoring update to immutable field {} on run {}", key, id);
            }
        }

        let key = ShardKey::for_time(&request_time);
        let id = id.to_string();
        self.enqueue(key, move |inner| async move { inner.rewrite(key, &id, &fields).await })
            .await
    }

    /// Records from the last `days` days, newest first.
    pub async fn get_recent(
        &self,
        days: u32,
        filter: &RunLogFilter,
    ) -> Result<Vec<RunLog>, RunLogError> {
        self.get_recent_at(Utc::now(), days, filter).await
    }

    /// Records with `request_time >= now - days`, newest first, reading only
    /// the shards on disk whose month lies between the cutoff and `now`.
    /// A window reaching past the earliest representable time has no cutoff.
    pub async fn get_recent_at(
        &self,
        now: DateTime<Utc>,
        days: u32,
        filter: &RunLogFilter,
    ) -> Result<Vec<RunLog>, RunLogError> {
        let cutoff =
            Duration::try_days(i64::from(days)).and_then(|span| now.checked_sub_signed(span));
        let newest = ShardKey::for_time(&now);
        let oldest = cutoff.as_ref().map(ShardKey::for_time);

        let mut logs = Vec::new();
        for key in self.list_shards().await? {
            if key > newest || oldest.is_some_and(|oldest| key < oldest) {
                continue;
            }
            let records = read_shard(&self.shard_path(key)).await?;
            logs.extend(records.into_iter().filter(|log| {
                cutoff.is_none_or(|cutoff| log.request_time >= cutoff) && filter.matches(log)
            }));
        }

        sort_newest_first(&mut logs);
        Ok(logs)
    }

    /// Every record in every shard, newest first.
    pub async fn get_all(&self, filter: &RunLogFilter) -> Result<Vec<RunLog>, RunLogError> {
        let mut logs = Vec::new();
        for key in self.list_shards().await? {
            let records = read_shard(&self.shard_path(key)).await?;
            logs.extend(records.into_iter().filter(|log| filter.matches(log)));
        }

        sort_newest_first(&mut logs);
        Ok(logs)
    }

    /// Look up one record in the shard owning `request_time`.
    pub async fn find(
        &self,
        id: &str,
        request_time: DateTime<Utc>,
    ) -> Result<Option<RunLog>, RunLogError> {
        let path = self.shard_path(ShardKey::for_time(&request_time));
        let records = read_shard(&path).await?;
        Ok(records.into_iter().find(|log| log.id == id))
    }

    /// Remove every shard file. Returns how many were removed.
    pub async fn delete_all(&self) -> Result<usize, RunLogError> {
        let mut removed = 0;
        for key in self.list_shards().await? {
            let deleted = self
                .enqueue(key, move |inner| async move {
                    match fs::remove_file(inner.shard_path(key)).await {
                        Ok(()) => Ok(true),
                        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                        Err(e) => Err(RunLogError::from(e)),
                    }
                })
                .await?;
            if deleted {
                removed += 1;
            }
        }

        tracing::info!("deleted {} run-log shards from {}", removed, self.dir().display());
        Ok(removed)
    }

    /// Shard keys present on disk, newest month first.
    async fn list_shards(&self) -> Result<Vec<ShardKey>, RunLogError> {
        let mut entries = match fs::read_dir(self.dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if let Some(key) = ShardKey::from_file_name(&name.to_string_lossy()) {
                keys.push(key);
            }
        }

        keys.sort_unstable_by(|a, b| b.cmp(a));
        Ok(keys)
    }

    /// Wait for this shard's queue, then run `job` on a spawned task that
    /// holds the queue until it finishes.
    async fn enqueue<R, F, Fut>(&self, key: ShardKey, job: F) -> Result<R, RunLogError>
    where
        F: FnOnce(Arc<Inner>) -> Fut,
        Fut: Future<Output = Result<R, RunLogError>> + Send + 'static,
        R: Send + 'static,
    {
        let ticket = self.inner.shard_queue(key).lock_owned().await;
        let work = job(Arc::clone(&self.inner));
        tokio::spawn(async move {
            let _ticket = ticket;
            work.await
        })
        .await?
    }
}

impl Inner {
    fn shard_path(&self, key: ShardKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    fn shard_queue(&self, key: ShardKey) -> Arc<Mutex<()>> {
        let mut queues = self
            .shard_queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(queues.entry(key).or_default())
    }

    async fn append_line(&self, key: ShardKey, line: String) -> Result<(), RunLogError> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.shard_path(key);
        if !fs::try_exists(&path).await? {
            tracing::info!("starting run-log shard {}", path.display());
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path).await?;
        file.write_all(line.as_bytes()).await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn rewrite(
        &self,
        key: ShardKey,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<bool, RunLogError> {
        let path = self.shard_path(key);
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("no shard {} for run {}, nothing to update", key, id);
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::with_capacity(content.len() + 256);
        let mut matched = false;
        for line in content.split_inclusive(|b| *b == b'\n') {
            let body = line.strip_suffix(b"\n").unwrap_or(line);
            match merge_line(body, id, fields)? {
                Some(updated) => {
                    out.extend_from_slice(&updated);
                    matched = true;
                }
                None => out.extend_from_slice(body),
            }
            out.push(b'\n');
        }

        if !matched {
            tracing::debug!("run {} not found in shard {}", id, key);
            return Ok(false);
        }

        write_atomic(&path, &out).await?;
        tracing::debug!("updated run {} in shard {}", id, key);
        Ok(true)
    }
}

/// The re-serialized line if `body` decodes to an object whose `id` is `id`,
/// with `fields` merged in. Any other line yields `None` and is kept verbatim.
/// The merged object must still decode as a [`RunLog`].
fn merge_line(
    body: &[u8],
    id: &str,
    fields: &Map<String, Value>,
) -> Result<Option<Vec<u8>>, RunLogError> {
    let Ok(mut value) = serde_json::from_slice::<Value>(body) else {
        return Ok(None);
    };
    let Some(object) = value.as_object_mut() else {
        return Ok(None);
    };
    if object.get("id").and_then(Value::as_str) != Some(id) {
        return Ok(None);
    }

    for (key, field) in fields {
        object.insert(key.clone(), field.clone());
    }
    if let Err(source) = serde_json::from_value::<RunLog>(value.clone()) {
        tracing::warn!("rejecting update to run {}: {}", id, source);
        return Err(RunLogError::InvalidUpdate {
            id: id.to_string(),
            source,
        });
    }
    Ok(Some(serde_json::to_vec(&value)?))
}

/// Decode every well-formed record in a shard. A missing shard is empty;
/// malformed lines are skipped.
async fn read_shard(path: &Path) -> Result<Vec<RunLog>, RunLogError> {
    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for line in content.split(|b| *b == b'\n') {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<RunLog>(line) {
            Ok(record) => records.push(record),
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!("skipped {} malformed lines in {}", skipped, path.display());
    }
    Ok(records)
}

fn sort_newest_first(logs: &mut [RunLog]) {
    logs.sort_by(|a, b| b.request_time.cmp(&a.request_time));
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::RunStatus;
    use chrono::TimeZone;
    use futures::future::join_all;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn run(id: &str, request_time: DateTime<Utc>) -> RunLog {
        RunLog::started(
            id.to_string(),
            "generate".to_string(),
            request_time,
            json!({"prompt": format!("prompt for {id}")}),
        )
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn ids(logs: &[RunLog]) -> Vec<&str> {
        logs.iter().map(|l| l.id.as_str()).collect()
    }

    #[tokio::test]
    async fn append_routes_to_request_month() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());

        store.append(&run("a", at(2025, 3, 15))).await.unwrap();

        let shard = dir.path().join("run-logs").join("2025-03.jsonl");
        let content = std::fs::read_to_string(&shard).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.ends_with('\n'));
    }

    #[tokio::test]
    async fn update_rewrites_only_the_owning_shard() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());

        store.append(&run("a", at(2025, 3, 15))).await.unwrap();
        store.append(&run("b", at(2025, 4, 2))).await.unwrap();
        let april = store.shard_path(ShardKey { year: 2025, month: 4 });
        let april_before = std::fs::read(&april).unwrap();

        let updated = store
            .update("a", fields(json!({"status": "SUCCESS"})), at(2025, 3, 15))
            .await
            .unwrap();
        assert!(updated);

        let a = store.find("a", at(2025, 3, 15)).await.unwrap().unwrap();
        assert_eq!(a.status, RunStatus::Success);
        assert_eq!(std::fs::read(&april).unwrap(), april_before);
    }

    #[tokio::test]
    async fn update_uses_request_time_not_clock() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());
        store.append(&run("old", at(2024, 11, 30))).await.unwrap();

        // Wrong month: silently nothing to do.
        let missed = store
            .update("old", fields(json!({"status": "FAILURE"})), at(2024, 12, 1))
            .await
            .unwrap();
        assert!(!missed);

        let hit = store
            .update(
                "old",
                fields(json!({
                    "status": "FAILURE",
                    "error": "provider timeout",
                    "completionTime": "2024-11-30T00:01:00Z"
                })),
                at(2024, 11, 30),
            )
            .await
            .unwrap();
        assert!(hit);

        let log = store.find("old", at(2024, 11, 30)).await.unwrap().unwrap();
        assert_eq!(log.status, RunStatus::Failure);
        assert_eq!(log.error.as_deref(), Some("provider timeout"));
        assert_eq!(log.completion_time, Some(Utc.with_ymd_and_hms(2024, 11, 30, 0, 1, 0).unwrap()));
    }

    #[tokio::test]
    async fn update_on_missing_shard_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());

        let updated = store
            .update("ghost", fields(json!({"status": "SUCCESS"})), at(2025, 1, 1))
            .await
            .unwrap();
        assert!(!updated);
        assert!(!store.dir().exists());
    }

    #[tokio::test]
    async fn update_cannot_move_a_record() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());
        store.append(&run("a", at(2025, 3, 15))).await.unwrap();

        store
            .update(
                "a",
                fields(json!({"id": "b", "requestTime": "2025-06-01T00:00:00Z", "model": "sdxl"})),
                at(2025, 3, 15),
            )
            .await
            .unwrap();

        let log = store.find("a", at(2025, 3, 15)).await.unwrap().unwrap();
        assert_eq!(log.request_time, at(2025, 3, 15));
        assert_eq!(log.model.as_deref(), Some("sdxl"));
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped_and_preserved() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());
        for (i, day) in [3, 9, 21].into_iter().enumerate() {
            store.append(&run(&format!("r{i}"), at(2025, 5, day))).await.unwrap();
        }

        let shard = store.shard_path(ShardKey { year: 2025, month: 5 });
        let garbage = r#"{"id":"r9","requestTime":"2025-05-1"#;
        {
            let mut file = std::fs::OpenOptions::new().append(true).open(&shard).unwrap();
            writeln!(file, "{garbage}").unwrap();
        }
        store.append(&run("r3", at(2025, 5, 25))).await.unwrap();

        let all = store.get_all(&RunLogFilter::default()).await.unwrap();
        assert_eq!(all.len(), 4);
        let recent = store
            .get_recent_at(at(2025, 5, 31), 30, &RunLogFilter::default())
            .await
            .unwrap();
        assert_eq!(recent.len(), 4);

        store
            .update("r1", fields(json!({"status": "SUCCESS"})), at(2025, 5, 9))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&shard).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[3], garbage);
        assert!(lines[1].contains("\"SUCCESS\""));
    }

    #[tokio::test]
    async fn non_utf8_lines_are_skipped_and_preserved() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());
        store.append(&run("a", at(2025, 6, 2))).await.unwrap();

        let shard = store.shard_path(ShardKey { year: 2025, month: 6 });
        let torn: &[u8] = b"{\"id\":\"b\",\"p\":\"caf\xC3\n";
        {
            let mut file = std::fs::OpenOptions::new().append(true).open(&shard).unwrap();
            file.write_all(torn).unwrap();
        }
        store.append(&run("c", at(2025, 6, 3))).await.unwrap();

        let all = store.get_all(&RunLogFilter::default()).await.unwrap();
        assert_eq!(ids(&all), vec!["c", "a"]);
        assert!(store.find("a", at(2025, 6, 2)).await.unwrap().is_some());

        let updated = store
            .update("a", fields(json!({"status": "SUCCESS"})), at(2025, 6, 2))
            .await
            .unwrap();
        assert!(updated);

        let content = std::fs::read(&shard).unwrap();
        let lines: Vec<&[u8]> = content.split_inclusive(|b| *b == b'\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], torn);
        let a = store.find("a", at(2025, 6, 2)).await.unwrap().unwrap();
        assert_eq!(a.status, RunStatus::Success);
    }

    #[tokio::test]
    async fn update_that_breaks_the_record_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());
        store.append(&run("a", at(2025, 3, 15))).await.unwrap();
        let shard = store.shard_path(ShardKey { year: 2025, month: 3 });
        let before = std::fs::read(&shard).unwrap();

        let err = store
            .update("a", fields(json!({"status": "failed", "durationMs": 12.5})), at(2025, 3, 15))
            .await
            .unwrap_err();
        assert!(matches!(err, RunLogError::InvalidUpdate { ref id, .. } if id == "a"));

        assert_eq!(std::fs::read(&shard).unwrap(), before);
        let a = store.find("a", at(2025, 3, 15)).await.unwrap().unwrap();
        assert_eq!(a.status, RunStatus::Running);
        assert_eq!(a.duration_ms, None);
    }

    #[tokio::test]
    async fn free_form_fields_are_returned_by_scans() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());
        let mut first = run("a", at(2025, 3, 15));
        first.extra.insert("sampler".to_string(), json!("euler"));
        store.append(&first).await.unwrap();

        store
            .update("a", fields(json!({"seed": 42})), at(2025, 3, 15))
            .await
            .unwrap();

        let a = store.find("a", at(2025, 3, 15)).await.unwrap().unwrap();
        assert_eq!(a.extra.get("seed"), Some(&json!(42)));
        assert_eq!(a.extra.get("sampler"), Some(&json!("euler")));
        let all = store.get_all(&RunLogFilter::default()).await.unwrap();
        assert_eq!(all[0].extra, a.extra);
    }

    #[tokio::test]
    async fn get_recent_with_huge_window_reads_every_shard() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());
        store.append(&run("ancient", at(1999, 1, 1))).await.unwrap();
        store.append(&run("recent", at(2025, 3, 1))).await.unwrap();
        store.append(&run("future", at(2025, 4, 1))).await.unwrap();

        let now = at(2025, 3, 10);
        let recent = store
            .get_recent_at(now, u32::MAX, &RunLogFilter::default())
            .await
            .unwrap();
        assert_eq!(ids(&recent), vec!["recent", "ancient"]);

        let last_week = store
            .get_recent_at(now, 7, &RunLogFilter::default())
            .await
            .unwrap();
        assert!(last_week.is_empty());
    }

    #[tokio::test]
    async fn get_recent_filters_within_boundary_month() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());

        store.append(&run("jan-early", at(2025, 1, 5))).await.unwrap();
        store.append(&run("jan-late", at(2025, 1, 28))).await.unwrap();
        store.append(&run("feb", at(2025, 2, 14))).await.unwrap();
        store.append(&run("mar", at(2025, 3, 1))).await.unwrap();

        // 45 days before 2025-03-10 is 2025-01-24.
        let recent = store
            .get_recent_at(at(2025, 3, 10), 45, &RunLogFilter::default())
            .await
            .unwrap();
        assert_eq!(ids(&recent), vec!["mar", "feb", "jan-late"]);
    }

    #[tokio::test]
    async fn get_recent_applies_filters() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());

        let mut upscale = run("up", at(2025, 2, 10));
        upscale.category = "upscale".to_string();
        store.append(&upscale).await.unwrap();
        store.append(&run("gen-1", at(2025, 2, 11))).await.unwrap();
        store.append(&run("gen-2", at(2025, 2, 12))).await.unwrap();
        store
            .update("gen-1", fields(json!({"status": "SUCCESS"})), at(2025, 2, 11))
            .await
            .unwrap();

        let now = at(2025, 2, 20);
        let generated = store
            .get_recent_at(now, 30, &RunLogFilter::default().category("generate"))
            .await
            .unwrap();
        assert_eq!(ids(&generated), vec!["gen-2", "gen-1"]);

        let succeeded = store
            .get_recent_at(now, 30, &RunLogFilter::default().status(RunStatus::Success))
            .await
            .unwrap();
        assert_eq!(ids(&succeeded), vec!["gen-1"]);
    }

    #[tokio::test]
    async fn get_all_scans_every_shard_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());

        store.append(&run("b", at(2024, 12, 31))).await.unwrap();
        store.append(&run("d", at(2025, 2, 1))).await.unwrap();
        store.append(&run("a", at(2023, 6, 1))).await.unwrap();
        store.append(&run("c", at(2025, 1, 1))).await.unwrap();
        std::fs::write(store.dir().join("README.txt"), "not a shard").unwrap();

        let all = store.get_all(&RunLogFilter::default()).await.unwrap();
        assert_eq!(ids(&all), vec!["d", "c", "b", "a"]);
    }

    #[tokio::test]
    async fn scans_without_directory_are_empty() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());

        assert!(store.get_all(&RunLogFilter::default()).await.unwrap().is_empty());
        assert!(
            store
                .get_recent(7, &RunLogFilter::default())
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(store.delete_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_all_removes_every_shard() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());
        store.append(&run("a", at(2025, 1, 1))).await.unwrap();
        store.append(&run("b", at(2025, 2, 1))).await.unwrap();

        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert!(store.get_all(&RunLogFilter::default()).await.unwrap().is_empty());

        // The store keeps working after a wipe.
        store.append(&run("c", at(2025, 3, 1))).await.unwrap();
        assert_eq!(store.get_all(&RunLogFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_appends_and_updates_keep_every_line() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path());
        let month = at(2025, 7, 1);

        store.append(&run("target", month)).await.unwrap();

        let appends = (0..30).map(|i| {
            let store = store.clone();
            async move { store.append(&run(&format!("r{i}"), at(2025, 7, 1 + i % 28))).await }
        });
        let updates = (0..10).map(|i| {
            let store = store.clone();
            async move {
                store
                    .update("target", fields(json!({"durationMs": i})), month)
                    .await
                    .map(|_| ())
            }
        });
        let (appended, updated) = tokio::join!(join_all(appends), join_all(updates));
        for result in appended.into_iter().chain(updated) {
            result.unwrap();
        }

        let all = store.get_all(&RunLogFilter::default()).await.unwrap();
        assert_eq!(all.len(), 31);
        let target = store.find("target", month).await.unwrap().unwrap();
        assert!(target.duration_ms.is_some());
    }
}
