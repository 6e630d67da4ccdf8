use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::jobs::error::{JobError, JobResult};
use crate::jobs::types::JobTask;

type TaskFactory = Box<dyn Fn(JsonValue) -> JobResult<Box<dyn JobTask>> + Send + Sync>;

/// Registry for mapping job types to task implementations
#[derive(Default)]
pub struct JobRegistry {
    factories: HashMap<String, TaskFactory>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task type with the registry
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: JobTask + DeserializeOwned + 'static,
    {
        let factory: TaskFactory = Box::new(|payload: JsonValue| {
            let task: T = serde_json::from_value(payload)?;
            Ok(Box::new(task) as Box<dyn JobTask>)
        });

        self.factories.insert(T::task_type().to_string(), factory);
        self
    }

    pub fn contains(&self, task_type: &str) -> bool {
        self.factories.contains_key(task_type)
    }

    /// Create a task instance from job type and payload
    pub fn create_task(&self, task_type: &str, payload: JsonValue) -> JobResult<Box<dyn JobTask>> {
        let factory = self
            .factories
            .get(task_type)
            .ok_or_else(|| JobError::UnknownTask(task_type.to_string()))?;

        factory(payload)
    }
}
