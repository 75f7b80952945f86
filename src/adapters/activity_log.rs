use crate::domain::ports::{ActivityLog, LogEntry};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 組出一行活動日誌：`PID: <pid>, TID: <tid> - <message> [Store: ..] [Category: ..]`
pub fn format_line(entry: &LogEntry) -> String {
    let mut line = format!(
        "PID: {}, TID: {} - {}",
        std::process::id(),
        current_tid(),
        entry.message
    );
    if let Some(shop) = &entry.shop {
        line.push_str(&format!(" [Store: {}]", shop));
    }
    if let Some(category) = &entry.category {
        line.push_str(&format!(" [Category: {}]", category));
    }
    line
}

/// 在 tokio 任務中回傳任務 id，否則回傳 OS 執行緒 id
fn current_tid() -> String {
    match tokio::task::try_id() {
        Some(id) => id.to_string(),
        None => {
            let raw = format!("{:?}", std::thread::current().id());
            raw.trim_start_matches("ThreadId(")
                .trim_end_matches(')')
                .to_string()
        }
    }
}

/// 每位顧客一個 `<client>.log`，所有寫入共用一把鎖
#[derive(Debug)]
pub struct FileActivityLog {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileActivityLog {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    pub fn path_for(&self, client: &str) -> PathBuf {
        self.dir.join(format!("{}.log", client))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn append(&self, path: &Path, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)
    }
}

impl ActivityLog for FileActivityLog {
    fn record(&self, entry: &LogEntry) {
        let line = format_line(entry);
        tracing::debug!(client = %entry.client, "{}", line);

        // 鎖中毒時仍繼續寫，日誌不能因為其他分支 panic 而中斷
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = self.append(&self.path_for(&entry.client), &line) {
            tracing::error!("❌ Failed to write activity log for {}: {}", entry.client, e);
        }
    }
}

/// 只留在記憶體的日誌，供測試檢查輸出
#[derive(Debug, Default)]
pub struct MemoryActivityLog {
    lines: Mutex<Vec<LogEntry>>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.message).collect()
    }
}

impl ActivityLog for MemoryActivityLog {
    fn record(&self, entry: &LogEntry) {
        tracing::debug!(client = %entry.client, "{}", entry.message);
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(entry.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_format_line_with_scope() {
        let entry = LogEntry::new("john", "Accessed Store Store1")
            .shop("Store1")
            .category("Store1/lights");
        let line = format_line(&entry);
        assert!(line.starts_with(&format!("PID: {}, TID: ", std::process::id())));
        assert!(line.ends_with(" - Accessed Store Store1 [Store: Store1] [Category: Store1/lights]"));
    }

    #[test]
    fn test_concurrent_writes_never_interleave() {
        let temp_dir = TempDir::new().unwrap();
        let log = Arc::new(FileActivityLog::new(temp_dir.path()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        log.record(&LogEntry::new("john", format!("worker {} line {}", t, i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = fs::read_to_string(log.path_for("john")).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 400);
        assert!(lines
            .iter()
            .all(|l| l.starts_with("PID: ") && l.contains(" - worker ")));
    }

    #[test]
    fn test_one_file_per_client() {
        let temp_dir = TempDir::new().unwrap();
        let log = FileActivityLog::new(temp_dir.path().join("logs")).unwrap();
        log.record(&LogEntry::new("alice", "hello"));
        log.record(&LogEntry::new("bob", "hi"));

        assert!(log.path_for("alice").exists());
        assert!(log.path_for("bob").exists());
    }
}
