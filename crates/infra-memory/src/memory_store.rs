// In-Memory TaskStore Implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use taskhive_core::config::StoreConfig;
use taskhive_core::domain::{DomainError, Task, TaskFilter, TaskId, TaskStats, TaskStatus};
use taskhive_core::error::{AppError, Result};
use taskhive_core::port::{TaskMutation, TaskStore, TimeProvider};
use tokio::sync::RwLock;
use tracing::debug;

/// Stored record, `seq` preserves insertion order
struct Entry {
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct Inner {
    tasks: HashMap<TaskId, Entry>,
    next_seq: u64,
}

impl Inner {
    /// Live entries in insertion order
    fn ordered(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.tasks.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries
    }
}

/// TaskStore backed by a `HashMap` behind one `RwLock`
///
/// Every write holds the lock for its whole read-check-write and never
/// awaits inside it.
pub struct InMemoryTaskStore {
    inner: RwLock<Inner>,
    time_provider: Arc<dyn TimeProvider>,
    max_size: usize,
}

impl InMemoryTaskStore {
    pub fn new(time_provider: Arc<dyn TimeProvider>, max_size: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            time_provider,
            max_size,
        }
    }

    pub fn from_config(time_provider: Arc<dyn TimeProvider>, config: &StoreConfig) -> Self {
        Self::new(time_provider, config.max_queue_size)
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: &Task) -> Result<()> {
        let mut inner = self.inner.write().await;

        if inner.tasks.len() >= self.max_size {
            return Err(AppError::CapacityExceeded { max: self.max_size });
        }
        if inner.tasks.contains_key(&task.id) {
            return Err(AppError::Conflict(format!("Task {} already exists", task.id)));
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.tasks.insert(
            task.id.clone(),
            Entry {
                seq,
                task: task.clone(),
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>> {
        let inner = self.inner.read().await;
        Ok(inner.tasks.get(id).map(|e| e.task.clone()))
    }

    async fn modify(&self, id: &str, mutation: TaskMutation) -> Result<Task> {
        let now = self.time_provider.now_millis();
        let mut inner = self.inner.write().await;

        let entry = inner
            .tasks
            .get_mut(id)
            .ok_or_else(|| AppError::task_not_found(id))?;

        // Work on a copy so a rejected mutation leaves no trace
        let mut draft = entry.task.clone();
        mutation(&mut draft)?;
        draft.updated_at = now;
        entry.task = draft.clone();

        Ok(draft)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.tasks.remove(id).is_some())
    }

    async fn delete_unless(&self, id: &str, forbidden: &[TaskStatus]) -> Result<Task> {
        let mut inner = self.inner.write().await;

        let status = inner
            .tasks
            .get(id)
            .map(|e| e.task.status)
            .ok_or_else(|| AppError::task_not_found(id))?;
        if forbidden.contains(&status) {
            return Err(DomainError::InvalidStateTransition {
                from: status.to_string(),
                to: "DELETED".to_string(),
            }
            .into());
        }

        inner
            .tasks
            .remove(id)
            .map(|e| e.task)
            .ok_or_else(|| AppError::task_not_found(id))
    }

    async fn list(&self, filter: &TaskFilter, limit: usize, offset: usize) -> Result<Vec<Task>> {
        let inner = self.inner.read().await;

        let mut matched: Vec<&Entry> = inner
            .tasks
            .values()
            .filter(|e| filter.matches(&e.task))
            .collect();
        // Newest first, later insertion first on equal timestamps
        matched.sort_by(|a, b| {
            b.task
                .created_at
                .cmp(&a.task.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });

        Ok(matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|e| e.task.clone())
            .collect())
    }

    async fn find_by_statuses(&self, statuses: &[TaskStatus]) -> Result<Vec<Task>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ordered()
            .into_iter()
            .filter(|e| statuses.contains(&e.task.status))
            .map(|e| e.task.clone())
            .collect())
    }

    async fn statistics(&self) -> Result<TaskStats> {
        let inner = self.inner.read().await;
        Ok(TaskStats::from_tasks(inner.tasks.values().map(|e| &e.task)))
    }

    async fn delete_finished_before(&self, cutoff_millis: i64) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.tasks.len();
        inner
            .tasks
            .retain(|_, e| !(e.task.status.is_terminal() && e.task.updated_at < cutoff_millis));
        let deleted = (before - inner.tasks.len()) as u64;

        debug!(deleted = deleted, cutoff = cutoff_millis, "Removed finished tasks");
        Ok(deleted)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.read().await.tasks.len())
    }

    fn capacity(&self) -> usize {
        self.max_size
    }
}
