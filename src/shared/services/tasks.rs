use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{ServiceError, ServiceResult};
use crate::shared::models::{
    AddTaskMessageRequest, CreateTaskRequest, Task, TaskControl, TaskFilter, TaskMessage,
    TaskPage, TaskStatus,
};
use crate::shared::store::TaskRepository;

#[derive(Clone)]
pub struct TasksService {
    repo: Arc<dyn TaskRepository>,
}

fn not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Task with id {id} not found."))
}

impl TasksService {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, req: CreateTaskRequest) -> ServiceResult<Task> {
        let task = Task::new(req);
        self.repo.insert(&task).await?;
        info!(id = %task.id, model = %task.model.name, "Created task");
        Ok(task)
    }

    pub async fn list(&self, filter: &TaskFilter) -> ServiceResult<TaskPage> {
        let (tasks, total) = self.repo.list(filter).await?;
        Ok(TaskPage::new(tasks, total, filter.limit))
    }

    pub async fn find(&self, id: &str) -> ServiceResult<Task> {
        self.repo.find(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        if !self.repo.delete(id).await? {
            return Err(not_found(id));
        }
        info!(id = %id, "Deleted task");
        Ok(())
    }

    /// Hand the desktop to the user.
    pub async fn take_over(&self, id: &str) -> ServiceResult<Task> {
        let task = self.find(id).await?;
        if task.status.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "Task {id} is {} and cannot be taken over.",
                task.status.as_str()
            )));
        }
        self.save(task, |t| t.control = TaskControl::User).await
    }

    /// Give control back to the assistant after a takeover.
    pub async fn resume(&self, id: &str) -> ServiceResult<Task> {
        let task = self.find(id).await?;
        if task.control != TaskControl::User {
            return Err(ServiceError::Conflict(format!(
                "Task {id} is not under user control."
            )));
        }
        self.save(task, |t| t.control = TaskControl::Assistant).await
    }

    pub async fn cancel(&self, id: &str) -> ServiceResult<Task> {
        let task = self.find(id).await?;
        if task.status.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "Task {id} is already {}.",
                task.status.as_str()
            )));
        }
        self.save(task, |t| {
            t.status = TaskStatus::Cancelled;
            t.control = TaskControl::Assistant;
        })
        .await
    }

    /// Store a user message; a task waiting on help goes back to running.
    pub async fn add_message(&self, id: &str, req: AddTaskMessageRequest) -> ServiceResult<Task> {
        let task = self.find(id).await?;
        self.repo
            .insert_message(&TaskMessage::user_text(&task.id, &req.message))
            .await?;

        if task.status == TaskStatus::NeedsHelp {
            return self.save(task, |t| t.status = TaskStatus::Running).await;
        }
        Ok(task)
    }

    pub async fn messages(&self, id: &str, page: i64, limit: i64) -> ServiceResult<Vec<TaskMessage>> {
        // 404 for unknown tasks rather than an empty list
        self.find(id).await?;
        Ok(self
            .repo
            .list_messages(id, limit, (page - 1).saturating_mul(limit))
            .await?)
    }

    async fn save<F>(&self, mut task: Task, change: F) -> ServiceResult<Task>
    where
        F: FnOnce(&mut Task),
    {
        change(&mut task);
        task.updated_at = Utc::now();
        if !self.repo.update(&task).await? {
            return Err(not_found(&task.id));
        }
        info!(
            id = %task.id,
            status = task.status.as_str(),
            control = task.control.as_str(),
            "Updated task"
        );
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::store::MemoryTasks;
    use serde_json::json;

    fn service() -> (TasksService, Arc<MemoryTasks>) {
        let repo = Arc::new(MemoryTasks::new());
        (TasksService::new(repo.clone()), repo)
    }

    async fn create(svc: &TasksService, description: &str) -> Task {
        let req: CreateTaskRequest =
            serde_json::from_value(json!({ "description": description })).unwrap();
        svc.create(req).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (svc, _) = service();
        let task = create(&svc, "Open Firefox").await;
        assert_eq!(svc.find(&task.id).await.unwrap(), task);
        assert!(matches!(svc.find("nope").await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_pages() {
        let (svc, _) = service();
        for i in 0..5 {
            create(&svc, &format!("task {i}")).await;
        }
        let filter = TaskFilter {
            statuses: vec![],
            page: 2,
            limit: 2,
        };
        let page = svc.list(&filter).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_takeover_and_resume() {
        let (svc, _) = service();
        let task = create(&svc, "Fill the form").await;

        assert!(matches!(svc.resume(&task.id).await, Err(ServiceError::Conflict(_))));

        let taken = svc.take_over(&task.id).await.unwrap();
        assert_eq!(taken.control, TaskControl::User);

        let resumed = svc.resume(&task.id).await.unwrap();
        assert_eq!(resumed.control, TaskControl::Assistant);
        assert_eq!(svc.find(&task.id).await.unwrap().control, TaskControl::Assistant);
    }

    #[tokio::test]
    async fn test_cancel_is_terminal() {
        let (svc, _) = service();
        let task = create(&svc, "Download report").await;

        let cancelled = svc.cancel(&task.id).await.unwrap();
        assert_eq!(cancelled.status, TaskStatus::Cancelled);

        assert!(matches!(svc.cancel(&task.id).await, Err(ServiceError::Conflict(_))));
        assert!(matches!(svc.take_over(&task.id).await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_add_message_resumes_needs_help() {
        let (svc, repo) = service();
        let mut task = create(&svc, "Log in").await;
        task.status = TaskStatus::NeedsHelp;
        repo.update(&task).await.unwrap();

        let req: AddTaskMessageRequest =
            serde_json::from_value(json!({ "message": "the password is in 1Password" })).unwrap();
        let updated = svc.add_message(&task.id, req).await.unwrap();
        assert_eq!(updated.status, TaskStatus::Running);

        let messages = svc.messages(&task.id, 1, 10).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content[0]["text"], "the password is in 1Password");
    }

    #[tokio::test]
    async fn test_delete_then_not_found() {
        let (svc, _) = service();
        let task = create(&svc, "Temporary").await;
        svc.delete(&task.id).await.unwrap();
        assert!(matches!(svc.delete(&task.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            svc.messages(&task.id, 1, 10).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
