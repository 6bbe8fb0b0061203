// Handler Registry - TaskType -> TaskHandler binding

use crate::domain::TaskType;
use crate::error::{AppError, Result};
use crate::port::TaskHandler;
use std::collections::HashMap;
use std::sync::Arc;

/// One handler per task type, fixed after startup
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TaskType, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler
    ///
    /// # Errors
    /// `AppError::Conflict` if `task_type` already has a handler
    pub fn register(&mut self, task_type: TaskType, handler: Arc<dyn TaskHandler>) -> Result<()> {
        if self.handlers.contains_key(&task_type) {
            return Err(AppError::Conflict(format!(
                "Handler already registered for task type: {}",
                task_type
            )));
        }
        self.handlers.insert(task_type, handler);
        Ok(())
    }

    pub fn get(&self, task_type: TaskType) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&task_type).cloned()
    }

    /// Registered types in declaration order
    pub fn registered_types(&self) -> Vec<TaskType> {
        let mut types: Vec<TaskType> = self.handlers.keys().copied().collect();
        types.sort();
        types
    }

    /// Types that would end Failed with `UnregisteredHandler`
    pub fn missing_types(&self) -> Vec<TaskType> {
        TaskType::ALL
            .into_iter()
            .filter(|t| !self.handlers.contains_key(t))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
