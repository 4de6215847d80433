use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Completed,
    Error,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Error)
    }
}

/// Progress card state for one dropped file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadTask {
    /// Storage key, also the map key
    pub key: String,
    pub preview_url: String,
    pub display_name: String,
    pub description: Option<String>,
    /// 0..=100, only 100 once the store acknowledged the bytes
    pub progress: u8,
    pub status: UploadStatus,
    pub error_message: Option<String>,
}

impl UploadTask {
    pub fn pending(
        key: impl Into<String>,
        preview_url: impl Into<String>,
        display_name: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            preview_url: preview_url.into(),
            display_name: display_name.into(),
            description,
            progress: 0,
            status: UploadStatus::Pending,
            error_message: None,
        }
    }
}

/// Shared key → task map. Every transition is guarded so that a task only
/// moves `pending → uploading → {completed | error}` (or `pending → error`),
/// and progress never goes backwards.
#[derive(Debug, Clone, Default)]
pub struct ProgressMap {
    tasks: Arc<DashMap<String, UploadTask>>,
}

impl ProgressMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, task: UploadTask) {
        self.tasks.insert(task.key.clone(), task);
    }

    pub fn get(&self, key: &str) -> Option<UploadTask> {
        self.tasks.get(key).map(|t| t.value().clone())
    }

    /// Dismisses a progress card.
    pub fn remove(&self, key: &str) -> Option<UploadTask> {
        self.tasks.remove(key).map(|(_, task)| task)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All tasks ordered by key.
    pub fn snapshot(&self) -> Vec<UploadTask> {
        let mut tasks: Vec<UploadTask> = self.tasks.iter().map(|t| t.value().clone()).collect();
        tasks.sort_by(|a, b| a.key.cmp(&b.key));
        tasks
    }

    pub fn start(&self, key: &str) -> bool {
        match self.tasks.get_mut(key) {
            Some(mut task) if task.status == UploadStatus::Pending => {
                task.status = UploadStatus::Uploading;
                true
            }
            _ => false,
        }
    }

    /// Applies a progress event. Stale or out-of-order values are dropped and
    /// 100 is reserved for [`complete`](Self::complete).
    pub fn advance(&self, key: &str, percent: u8) -> bool {
        let percent = percent.min(99);
        match self.tasks.get_mut(key) {
            Some(mut task) if task.status == UploadStatus::Uploading && percent > task.progress => {
                task.progress = percent;
                true
            }
            _ => false,
        }
    }

    pub fn complete(&self, key: &str) -> bool {
        match self.tasks.get_mut(key) {
            Some(mut task) if task.status == UploadStatus::Uploading => {
                task.status = UploadStatus::Completed;
                task.progress = 100;
                true
            }
            _ => false,
        }
    }

    pub fn fail(&self, key: &str, message: impl Into<String>) -> bool {
        match self.tasks.get_mut(key) {
            Some(mut task) if !task.status.is_terminal() => {
                task.status = UploadStatus::Error;
                task.error_message = Some(message.into());
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(key: &str) -> ProgressMap {
        let map = ProgressMap::new();
        map.insert(UploadTask::pending(key, "mem://a", "a.png", None));
        map
    }

    #[test]
    fn test_progress_is_monotonic() {
        let map = map_with("k");
        assert!(!map.advance("k", 10), "pending tasks ignore progress");
        assert!(map.start("k"));

        let mut seen = Vec::new();
        for p in [5, 30, 20, 30, 75, 60, 100] {
            map.advance("k", p);
            seen.push(map.get("k").unwrap().progress);
        }
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{:?}", seen);
        assert_eq!(*seen.last().unwrap(), 99);

        assert!(map.complete("k"));
        assert_eq!(map.get("k").unwrap().progress, 100);
        assert!(!map.advance("k", 50));
        assert_eq!(map.get("k").unwrap().progress, 100);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let map = map_with("k");
        map.start("k");
        assert!(map.fail("k", "boom"));
        assert!(!map.complete("k"));
        assert!(!map.start("k"));

        let task = map.get("k").unwrap();
        assert_eq!(task.status, UploadStatus::Error);
        assert_eq!(task.error_message.as_deref(), Some("boom"));

        assert!(map.remove("k").is_some());
        assert!(map.is_empty());
    }

    #[test]
    fn test_pending_can_fail_without_uploading() {
        let map = map_with("k");
        assert!(map.fail("k", "presign failed"));
        assert_eq!(map.get("k").unwrap().status, UploadStatus::Error);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&UploadStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
