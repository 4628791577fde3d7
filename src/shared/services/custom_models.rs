use std::sync::Arc;

use tracing::info;

use super::{ServiceError, ServiceResult};
use crate::shared::models::{
    AgentModel, CreateCustomModelRequest, CustomModel, ModelCatalog, UpdateCustomModelRequest,
};
use crate::shared::store::CustomModelRepository;

/// Registry of user-defined model configurations. Holds no state of its own;
/// every call reads or writes the repository.
#[derive(Clone)]
pub struct CustomModelsService {
    repo: Arc<dyn CustomModelRepository>,
}

fn not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Custom model with id {id} not found."))
}

impl CustomModelsService {
    pub fn new(repo: Arc<dyn CustomModelRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> ServiceResult<Vec<CustomModel>> {
        Ok(self.repo.list().await?)
    }

    pub async fn list_agent_models(&self) -> ServiceResult<Vec<AgentModel>> {
        let models = self.repo.list().await?;
        Ok(models.iter().map(CustomModel::to_agent_model).collect())
    }

    /// Everything the model picker offers: built-in default, stored models,
    /// then configured models not shadowed by a stored one.
    pub async fn available_models(&self, catalog: &ModelCatalog) -> ServiceResult<Vec<AgentModel>> {
        let persisted = self.list_agent_models().await?;
        Ok(catalog.combine(persisted))
    }

    pub async fn create(&self, req: CreateCustomModelRequest) -> ServiceResult<CustomModel> {
        let model = CustomModel::new(req);
        self.repo.insert(&model).await?;
        info!(id = %model.id, name = %model.name, provider = %model.provider, "Created custom model");
        Ok(model)
    }

    pub async fn update(
        &self,
        id: &str,
        req: UpdateCustomModelRequest,
    ) -> ServiceResult<CustomModel> {
        if !req.is_empty() {
            if !self.repo.update(id, &req).await? {
                return Err(not_found(id));
            }
            info!(id = %id, "Updated custom model");
        }
        self.repo.find(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn remove(&self, id: &str) -> ServiceResult<()> {
        if !self.repo.delete(id).await? {
            return Err(not_found(id));
        }
        info!(id = %id, "Deleted custom model");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::store::MemoryCustomModels;
    use serde_json::json;

    fn service() -> CustomModelsService {
        CustomModelsService::new(Arc::new(MemoryCustomModels::new()))
    }

    fn create_req(value: serde_json::Value) -> CreateCustomModelRequest {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_create_normalizes_provider() {
        let svc = service();
        let a = svc
            .create(create_req(json!({ "provider": "OpenAI", "name": "gpt", "title": "GPT" })))
            .await
            .unwrap();
        let b = svc
            .create(create_req(json!({ "provider": "", "name": "local", "title": "Local" })))
            .await
            .unwrap();
        let c = svc
            .create(create_req(json!({ "name": "bare", "title": "Bare" })))
            .await
            .unwrap();
        assert_eq!(a.provider, "openai");
        assert_eq!(b.provider, "custom");
        assert_eq!(c.provider, "custom");

        let names: Vec<_> = svc.list().await.unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["gpt", "local", "bare"]);
    }

    #[tokio::test]
    async fn test_update_title_only_leaves_other_fields() {
        let svc = service();
        let created = svc
            .create(create_req(json!({
                "provider": "Acme",
                "name": "acme-large",
                "title": "Acme Large",
                "contextWindow": 32000
            })))
            .await
            .unwrap();

        let req: UpdateCustomModelRequest =
            serde_json::from_value(json!({ "title": "Acme XL" })).unwrap();
        let updated = svc.update(&created.id, req).await.unwrap();

        assert_eq!(updated.title, "Acme XL");
        assert_eq!(updated.provider, "acme");
        assert_eq!(updated.name, "acme-large");
        assert_eq!(updated.context_window, Some(32000));
        assert_eq!(svc.list().await.unwrap()[0], updated);
    }

    #[tokio::test]
    async fn test_concurrent_updates_keep_both_fields() {
        let svc = service();
        let created = svc
            .create(create_req(json!({ "name": "m", "title": "M", "contextWindow": 1000 })))
            .await
            .unwrap();

        let title: UpdateCustomModelRequest =
            serde_json::from_value(json!({ "title": "Renamed" })).unwrap();
        let window: UpdateCustomModelRequest =
            serde_json::from_value(json!({ "contextWindow": 64000 })).unwrap();
        let (a, b) = tokio::join!(svc.update(&created.id, title), svc.update(&created.id, window));
        a.unwrap();
        b.unwrap();

        let stored = svc.list().await.unwrap().remove(0);
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.context_window, Some(64000));
        assert_eq!(stored.name, "m");
    }

    #[tokio::test]
    async fn test_empty_update_returns_stored_row() {
        let svc = service();
        let created = svc
            .create(create_req(json!({ "name": "m", "title": "M" })))
            .await
            .unwrap();
        let same = svc
            .update(&created.id, UpdateCustomModelRequest::default())
            .await
            .unwrap();
        assert_eq!(same, created);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let svc = service();
        let err = svc
            .update("00000000-0000-0000-0000-000000000000", UpdateCustomModelRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let svc = service();
        let created = svc
            .create(create_req(json!({ "name": "tmp", "title": "Tmp" })))
            .await
            .unwrap();

        svc.remove(&created.id).await.unwrap();
        let err = svc.remove(&created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(matches!(
            svc.remove("never-existed").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_available_models_prefers_persisted() {
        let svc = service();
        svc.create(create_req(json!({ "provider": "Custom", "name": "gpt", "title": "Stored GPT" })))
            .await
            .unwrap();
        let catalog = ModelCatalog::from_env_value(Some(
            r#"[{"name": "gpt", "title": "Env GPT"}, {"name": "env-only"}]"#,
        ));

        let models = svc.available_models(&catalog).await.unwrap();
        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["claude-code", "gpt", "env-only"]);
        assert_eq!(models[1].title, "Stored GPT");
        assert_eq!(models[1].provider, "custom");
    }
}
