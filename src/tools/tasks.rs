//! Bounded task list with single-active-item validation.
//!
//! The model replaces the whole list on every update; nothing is merged
//! or diffed. Validation is atomic: any violation leaves the stored
//! list exactly as it was.

use serde_json::Value;

use super::ToolError;

/// Maximum number of items a list may hold.
pub const MAX_TASKS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Case-insensitive parse from the wire spelling.
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskItem {
    pub content: String,
    pub status: TaskStatus,
    /// Present-tense label shown while the item is in progress.
    pub active_form: String,
}

/// Validates and stores the session's task list.
#[derive(Debug, Default)]
pub struct TaskList {
    items: Vec<TaskItem>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[TaskItem] {
        &self.items
    }

    /// Validate the entire candidate list, then replace the stored list
    /// wholesale and return the rendered view. On any violation nothing
    /// is committed.
    pub fn update(&mut self, items: &Value) -> Result<String, ToolError> {
        let entries = items
            .as_array()
            .ok_or_else(|| ToolError::Validation("items must be an ordered list".to_string()))?;

        let mut validated = Vec::with_capacity(entries.len());
        let mut in_progress = 0usize;

        for (index, entry) in entries.iter().enumerate() {
            let object = entry.as_object().ok_or_else(|| {
                ToolError::Validation(format!("item {index} must be an object"))
            })?;

            let content = object
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or("")
                .trim();
            if content.is_empty() {
                return Err(ToolError::Validation(format!("item {index}: content required")));
            }

            let status_raw = object
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("pending");
            let status = TaskStatus::parse(status_raw).ok_or_else(|| {
                ToolError::Validation(format!("item {index}: invalid status '{status_raw}'"))
            })?;
            if status == TaskStatus::InProgress {
                in_progress += 1;
            }

            let active_form = object
                .get("activeForm")
                .and_then(Value::as_str)
                .unwrap_or("")
                .trim();
            if active_form.is_empty() {
                return Err(ToolError::Validation(format!(
                    "item {index}: activeForm required"
                )));
            }

            validated.push(TaskItem {
                content: content.to_string(),
                status,
                active_form: active_form.to_string(),
            });
        }

        if validated.len() > MAX_TASKS {
            return Err(ToolError::Validation(format!(
                "at most {MAX_TASKS} tasks allowed"
            )));
        }
        if in_progress > 1 {
            return Err(ToolError::Validation(
                "only one task can be in_progress".to_string(),
            ));
        }

        self.items = validated;
        Ok(self.render())
    }

    /// Deterministic text view: completed, in-progress (with its active
    /// form), and pending items, then a completed/total count.
    pub fn render(&self) -> String {
        if self.items.is_empty() {
            return "No tasks.".to_string();
        }

        let mut lines = Vec::with_capacity(self.items.len() + 1);
        for item in &self.items {
            lines.push(match item.status {
                TaskStatus::Completed => format!("[x] {}", item.content),
                TaskStatus::InProgress => {
                    format!("[>] {} <- {}", item.content, item.active_form)
                }
                TaskStatus::Pending => format!("[ ] {}", item.content),
            });
        }

        let completed = self
            .items
            .iter()
            .filter(|item| item.status == TaskStatus::Completed)
            .count();
        lines.push(format!("\n({}/{} completed)", completed, self.items.len()));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(content: &str, status: &str) -> Value {
        json!({"content": content, "status": status, "activeForm": format!("Doing {content}")})
    }

    #[test]
    fn valid_list_commits_and_renders_the_count() {
        let mut list = TaskList::new();
        let rendered = list
            .update(&json!([
                item("one", "completed"),
                item("two", "in_progress"),
                item("three", "pending"),
            ]))
            .unwrap();

        assert!(rendered.contains("[x] one"));
        assert!(rendered.contains("[>] two <- Doing two"));
        assert!(rendered.contains("[ ] three"));
        assert!(rendered.ends_with("(1/3 completed)"));
        assert_eq!(list.items().len(), 3);
    }

    #[test]
    fn status_parses_case_insensitively() {
        let mut list = TaskList::new();
        list.update(&json!([item("one", "In_Progress")])).unwrap();
        assert_eq!(list.items()[0].status, TaskStatus::InProgress);
    }

    #[test]
    fn twenty_one_items_fail_and_leave_the_stored_list_alone() {
        let mut list = TaskList::new();
        list.update(&json!([item("kept", "pending")])).unwrap();

        let oversized: Vec<Value> = (0..21).map(|i| item(&format!("t{i}"), "pending")).collect();
        let err = list.update(&Value::Array(oversized)).unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)), "got: {err:?}");

        assert_eq!(list.items().len(), 1);
        assert_eq!(list.items()[0].content, "kept");
    }

    #[test]
    fn twenty_items_is_accepted() {
        let mut list = TaskList::new();
        let items: Vec<Value> = (0..20).map(|i| item(&format!("t{i}"), "pending")).collect();
        list.update(&Value::Array(items)).unwrap();
        assert_eq!(list.items().len(), 20);
    }

    #[test]
    fn two_in_progress_items_commit_nothing() {
        let mut list = TaskList::new();
        let err = list
            .update(&json!([item("a", "in_progress"), item("b", "in_progress")]))
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)), "got: {err:?}");
        assert!(list.items().is_empty());
    }

    #[test]
    fn blank_content_is_rejected() {
        let mut list = TaskList::new();
        let err = list
            .update(&json!([{"content": "   ", "status": "pending", "activeForm": "Doing"}]))
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)), "got: {err:?}");
    }

    #[test]
    fn missing_active_form_is_rejected() {
        let mut list = TaskList::new();
        let err = list
            .update(&json!([{"content": "a", "status": "pending"}]))
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)), "got: {err:?}");
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut list = TaskList::new();
        let err = list.update(&json!([item("a", "paused")])).unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)), "got: {err:?}");
    }

    #[test]
    fn non_array_input_is_rejected() {
        let mut list = TaskList::new();
        let err = list.update(&json!({"not": "a list"})).unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)), "got: {err:?}");
    }

    #[test]
    fn update_replaces_wholesale() {
        let mut list = TaskList::new();
        list.update(&json!([item("old", "pending")])).unwrap();
        list.update(&json!([item("new", "pending")])).unwrap();

        assert_eq!(list.items().len(), 1);
        assert_eq!(list.items()[0].content, "new");
    }

    #[test]
    fn empty_list_renders_placeholder() {
        assert_eq!(TaskList::new().render(), "No tasks.");
    }
}
