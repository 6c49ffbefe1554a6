//! Stage-template repository: persisted templates plus the built-in
//! `pick_pack` fallback used for selection totality (spec §4.4.1, P2).

use async_trait::async_trait;

use crate::domain::ids::TemplateId;
use crate::domain::stage_template::StageTemplate;

#[derive(Debug, thiserror::Error)]
pub enum TemplateStoreError {
    #[error("template {0} not found")]
    NotFound(TemplateId),
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get(&self, template_id: TemplateId) -> Result<StageTemplate, TemplateStoreError>;
    async fn list_active(&self, path_type: &str) -> Result<Vec<StageTemplate>, TemplateStoreError>;
    async fn list_all(&self) -> Result<Vec<StageTemplate>, TemplateStoreError>;
    async fn default_for(&self, path_type: &str) -> Result<Option<StageTemplate>, TemplateStoreError>;
}

/// In-memory template repository: used by this module's own tests, and as
/// the storage backend for the `dev` feature build (spec §6.5 "local
/// development, no external services").
pub mod in_memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryTemplateStore {
        templates: Mutex<HashMap<TemplateId, StageTemplate>>,
    }

    impl InMemoryTemplateStore {
        pub fn seed(&self, template: StageTemplate) {
            self.templates.lock().unwrap().insert(template.template_id, template);
        }
    }

    #[async_trait]
    impl TemplateStore for InMemoryTemplateStore {
        async fn get(&self, template_id: TemplateId) -> Result<StageTemplate, TemplateStoreError> {
            self.templates
                .lock()
                .unwrap()
                .get(&template_id)
                .cloned()
                .ok_or(TemplateStoreError::NotFound(template_id))
        }

        async fn list_active(&self, path_type: &str) -> Result<Vec<StageTemplate>, TemplateStoreError> {
            Ok(self
                .templates
                .lock()
                .unwrap()
                .values()
                .filter(|t| t.active && t.path_type == path_type)
                .cloned()
                .collect())
        }

        async fn list_all(&self) -> Result<Vec<StageTemplate>, TemplateStoreError> {
            Ok(self.templates.lock().unwrap().values().cloned().collect())
        }

        async fn default_for(&self, path_type: &str) -> Result<Option<StageTemplate>, TemplateStoreError> {
            Ok(self
                .templates
                .lock()
                .unwrap()
                .values()
                .find(|t| t.path_type == path_type && t.is_default)
                .cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::in_memory::InMemoryTemplateStore;
    use super::*;

    #[tokio::test]
    async fn seeded_template_is_found() {
        let store = InMemoryTemplateStore::default();
        let tmpl = StageTemplate::built_in_pick_pack();
        let id = tmpl.template_id;
        store.seed(tmpl);
        let fetched = store.get(id).await.unwrap();
        assert_eq!(fetched.template_id, id);
    }

    #[tokio::test]
    async fn missing_template_errors() {
        let store = InMemoryTemplateStore::default();
        let err = store.get(TemplateId::new()).await.unwrap_err();
        assert!(matches!(err, TemplateStoreError::NotFound(_)));
    }
}
