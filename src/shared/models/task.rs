use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::agent_model::AgentModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    NeedsHelp,
    NeedsReview,
    Completed,
    Cancelled,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::NeedsHelp => "NEEDS_HELP",
            TaskStatus::NeedsReview => "NEEDS_REVIEW",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Cancelled => "CANCELLED",
            TaskStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Cancelled | TaskStatus::Failed
        )
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(TaskStatus::Pending),
            "RUNNING" => Ok(TaskStatus::Running),
            "NEEDS_HELP" => Ok(TaskStatus::NeedsHelp),
            "NEEDS_REVIEW" => Ok(TaskStatus::NeedsReview),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "CANCELLED" => Ok(TaskStatus::Cancelled),
            "FAILED" => Ok(TaskStatus::Failed),
            other => Err(format!("Unknown task status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
            TaskPriority::Urgent => "URGENT",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(TaskPriority::Low),
            "MEDIUM" => Ok(TaskPriority::Medium),
            "HIGH" => Ok(TaskPriority::High),
            "URGENT" => Ok(TaskPriority::Urgent),
            other => Err(format!("Unknown task priority '{other}'")),
        }
    }
}

/// Who is driving the desktop for a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskControl {
    #[default]
    Assistant,
    User,
}

impl TaskControl {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskControl::Assistant => "ASSISTANT",
            TaskControl::User => "USER",
        }
    }
}

impl FromStr for TaskControl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASSISTANT" => Ok(TaskControl::Assistant),
            "USER" => Ok(TaskControl::User),
            other => Err(format!("Unknown task control '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "USER",
            MessageRole::Assistant => "ASSISTANT",
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(MessageRole::User),
            "ASSISTANT" => Ok(MessageRole::Assistant),
            other => Err(format!("Unknown message role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub control: TaskControl,
    pub model: AgentModel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(req: CreateTaskRequest) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: req.description,
            status: TaskStatus::Pending,
            priority: req.priority.unwrap_or_default(),
            control: TaskControl::Assistant,
            model: req.model.unwrap_or_else(AgentModel::builtin_default),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMessage {
    pub id: String,
    pub task_id: String,
    pub role: MessageRole,
    pub content: Value, // [{ "type": "text", "text": "..." }, ...]
    pub created_at: DateTime<Utc>,
}

impl TaskMessage {
    pub fn user_text(task_id: &str, text: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            role: MessageRole::User,
            content: serde_json::json!([{ "type": "text", "text": text }]),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(deserialize_with = "deserialize_required_text")]
    pub description: String,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub model: Option<AgentModel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddTaskMessageRequest {
    #[serde(deserialize_with = "deserialize_required_text")]
    pub message: String,
}

/// Filter and window for listing tasks; both bounds already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub statuses: Vec<TaskStatus>,
    pub page: i64,
    pub limit: i64,
}

impl TaskFilter {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub total: i64,
    pub total_pages: i64,
}

impl TaskPage {
    pub fn new(tasks: Vec<Task>, total: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            tasks,
            total,
            total_pages,
        }
    }
}

fn deserialize_required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    if value.trim().is_empty() {
        return Err(serde::de::Error::custom("value is required and cannot be empty"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parsing_and_terminal_states() {
        assert_eq!("needs_help".parse::<TaskStatus>(), Ok(TaskStatus::NeedsHelp));
        assert_eq!(" RUNNING ".parse::<TaskStatus>(), Ok(TaskStatus::Running));
        assert!("DONE".parse::<TaskStatus>().is_err());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::NeedsReview.is_terminal());
    }

    #[test]
    fn test_as_str_matches_serde() {
        for status in [TaskStatus::Pending, TaskStatus::NeedsReview, TaskStatus::Failed] {
            assert_eq!(serde_json::to_value(status).unwrap(), status.as_str());
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
        }
        assert_eq!(serde_json::to_value(TaskPriority::Urgent).unwrap(), "URGENT");
        assert_eq!(serde_json::to_value(TaskControl::User).unwrap(), "USER");
    }

    #[test]
    fn test_new_task_defaults() {
        let req: CreateTaskRequest =
            serde_json::from_value(json!({ "description": "Open the browser" })).unwrap();
        let task = Task::new(req);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.control, TaskControl::Assistant);
        assert_eq!(task.model, AgentModel::builtin_default());
    }

    #[test]
    fn test_create_request_validation() {
        assert!(serde_json::from_value::<CreateTaskRequest>(json!({ "description": "  " })).is_err());
        assert!(serde_json::from_value::<CreateTaskRequest>(json!({})).is_err());
        assert!(serde_json::from_value::<CreateTaskRequest>(
            json!({ "description": "x", "priority": "SOMEDAY" })
        )
        .is_err());
    }

    #[test]
    fn test_page_math() {
        assert_eq!(TaskPage::new(vec![], 0, 10).total_pages, 0);
        assert_eq!(TaskPage::new(vec![], 10, 10).total_pages, 1);
        assert_eq!(TaskPage::new(vec![], 11, 10).total_pages, 2);
        let filter = TaskFilter {
            statuses: vec![],
            page: 3,
            limit: 20,
        };
        assert_eq!(filter.offset(), 40);
    }

    #[test]
    fn test_user_text_message_shape() {
        let msg = TaskMessage::user_text("t1", "hello");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content[0]["text"], "hello");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["taskId"], "t1");
    }
}
