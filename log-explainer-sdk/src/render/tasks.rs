//! Task list view state
//!
//! Expanded and copied state is keyed by position plus id, so two tasks
//! that arrive with the same id still toggle independently.

use std::collections::HashSet;

use super::tone::PriorityTone;
use crate::services::explainer::Task;

/// Title shown for a task without one
pub const UNTITLED: &str = "Untitled";

/// Text shown for a task without a description
pub const NO_DESCRIPTION: &str = "No description";

/// State key of the task at `index`
pub fn task_key(index: usize, task: &Task) -> String {
    format!("{}-{}", index, task.id)
}

/// Expand/collapse and copy feedback for a rendered task list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListState {
    expanded: HashSet<String>,
    copied: Option<String>,
}

impl TaskListState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State with every task that has a description expanded
    pub fn expanded_all(tasks: &[Task]) -> Self {
        let expanded = tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.description().is_some())
            .map(|(index, task)| task_key(index, task))
            .collect();

        Self {
            expanded,
            copied: None,
        }
    }

    /// Flip the expanded state of a key; returns the new state
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.expanded.remove(key) {
            false
        } else {
            self.expanded.insert(key.to_string());
            true
        }
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.contains(key)
    }

    /// Text for the title copy action; marks it as copied
    pub fn copy_title(&mut self, index: usize, task: &Task) -> String {
        self.copied = Some(format!("{}-title", task_key(index, task)));
        task.title.clone()
    }

    /// Text for the description copy action; `None` without a description
    pub fn copy_description(&mut self, index: usize, task: &Task) -> Option<String> {
        let description = task.description()?.to_string();
        self.copied = Some(format!("{}-desc", task_key(index, task)));
        Some(description)
    }

    /// Key of the last copy action, until cleared
    pub fn copied(&self) -> Option<&str> {
        self.copied.as_deref()
    }

    pub fn clear_copied(&mut self) {
        self.copied = None;
    }

    /// Render the list as text
    pub fn render(&self, tasks: &[Task]) -> String {
        let mut lines = Vec::new();

        for (index, task) in tasks.iter().enumerate() {
            let tone = PriorityTone::from_priority(task.priority());
            let title = if task.title.trim().is_empty() {
                UNTITLED
            } else {
                task.title.trim()
            };

            let mut line = format!("{} {}", tone.icon(), title);
            if let Some(priority) = task.priority() {
                line.push_str(&format!(" (priority: {})", priority));
            }
            lines.push(line);

            let key = task_key(index, task);
            match task.description() {
                Some(description) if self.is_expanded(&key) => {
                    lines.extend(description.lines().map(|l| format!("    {}", l)));
                }
                Some(_) => lines.push("    (collapsed)".to_string()),
                None => lines.push(format!("    {}", NO_DESCRIPTION)),
            }
        }

        lines.join("\n")
    }
}
