//! Task checklist stored as a JSON array of titles.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::data_dir;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TaskError {
    #[error("task title must not be empty")]
    EmptyTitle,

    #[error("no task numbered {0}")]
    NotFound(usize),
}

/// Ordered list of task titles. Titles are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskList {
    tasks: Vec<String>,
}

impl TaskList {
    /// `<data_dir>/tasks.json`
    pub fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("tasks.json"))
    }

    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from(&Self::path()?)
    }

    /// A missing file is an empty list.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Append a task. Returns false if an identical title already exists.
    pub fn add(&mut self, title: &str) -> Result<bool, TaskError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        if self.tasks.iter().any(|t| t == title) {
            return Ok(false);
        }
        self.tasks.push(title.to_string());
        Ok(true)
    }

    /// Remove the task at 1-based position `number`.
    pub fn remove(&mut self, number: usize) -> Result<String, TaskError> {
        if number == 0 || number > self.tasks.len() {
            return Err(TaskError::NotFound(number));
        }
        Ok(self.tasks.remove(number - 1))
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
