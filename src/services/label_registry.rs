//! Category label registry.
//!
//! Maps label names to remote label IDs, creating missing labels on first
//! use and caching the mapping for the registry's lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::domain::{Category, LabelId, LabelVisibility};
use crate::providers::email::{MessageStore, ProviderError};

/// Resolves label names to IDs against a [`MessageStore`].
///
/// Lookup is list-then-create. Concurrent callers asking for the same name
/// are serialized by a per-name lock held across the whole sequence, so one
/// registry never creates a label twice. Separate processes sharing a
/// mailbox can still race.
pub struct LabelRegistry<S: MessageStore + ?Sized> {
    store: Arc<S>,
    visibility: LabelVisibility,
    cache: RwLock<HashMap<String, LabelId>>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: MessageStore + ?Sized> LabelRegistry<S> {
    /// Creates an empty registry over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            visibility: LabelVisibility::shown(),
            cache: RwLock::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the label ID for `name`, creating the label if the store does
    /// not have one.
    ///
    /// Returns `None` if the store fails. The failure is logged; callers
    /// should skip the custom label and carry on with the rest of the plan.
    pub async fn resolve_or_create(&self, name: &str) -> Option<LabelId> {
        if let Some(id) = self.cached(name) {
            return Some(id);
        }

        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        // Another caller may have finished while we waited.
        if let Some(id) = self.cached(name) {
            return Some(id);
        }

        match self.lookup_or_create(name).await {
            Ok(id) => {
                self.cache
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(name.to_string(), id.clone());
                Some(id)
            }
            Err(e) => {
                tracing::warn!(label = name, error = %e, "label resolution failed, skipping custom label");
                None
            }
        }
    }

    /// Resolves the label named after `category`.
    pub async fn resolve_category(&self, category: Category) -> Option<LabelId> {
        self.resolve_or_create(category.as_str()).await
    }

    /// Returns the cached ID for `name` without touching the store.
    pub fn cached(&self, name: &str) -> Option<LabelId> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn lock_for(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    async fn lookup_or_create(&self, name: &str) -> Result<LabelId, ProviderError> {
        let labels = self.store.list_labels().await?;
        // Only user labels count; a built-in label never stands in for a
        // category label.
        if let Some(existing) = labels.into_iter().find(|l| !l.is_system && l.name == name) {
            tracing::debug!(label = name, id = %existing.id, "found existing label");
            return Ok(existing.id);
        }

        let created = self.store.create_label(name, &self.visibility).await?;
        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::{EmailId, Label, MessageRef, MutationPlan, RemoteMessage};
    use crate::providers::email::{MessageFormat, Result};

    #[derive(Default)]
    struct MockLabelStore {
        labels: RwLock<Vec<Label>>,
        list_calls: AtomicUsize,
        create_calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl MockLabelStore {
        fn with_label(self, id: &str, name: &str) -> Self {
            self.push_label(id, name, false)
        }

        fn with_system_label(self, id: &str, name: &str) -> Self {
            self.push_label(id, name, true)
        }

        fn push_label(self, id: &str, name: &str, is_system: bool) -> Self {
            self.labels.write().unwrap().push(Label {
                id: LabelId::from(id),
                name: name.to_string(),
                is_system,
            });
            self
        }

        fn check(&self) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ProviderError::Connection("offline".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl MessageStore for MockLabelStore {
        async fn list_messages(&self, _query: &str) -> Result<Vec<MessageRef>> {
            Ok(Vec::new())
        }

        async fn get_message(&self, id: &EmailId, _format: MessageFormat) -> Result<RemoteMessage> {
            Err(ProviderError::NotFound(id.to_string()))
        }

        async fn apply_mutation(&self, _id: &EmailId, _plan: &MutationPlan) -> Result<()> {
            Ok(())
        }

        async fn list_labels(&self) -> Result<Vec<Label>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self.labels.read().unwrap().clone())
        }

        async fn create_label(&self, name: &str, visibility: &LabelVisibility) -> Result<Label> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            assert_eq!(visibility, &LabelVisibility::shown());

            let mut labels = self.labels.write().unwrap();
            let label = Label {
                id: LabelId::from(format!("Label_{}", labels.len() + 1)),
                name: name.to_string(),
                is_system: false,
            };
            labels.push(label.clone());
            Ok(label)
        }
    }

    #[tokio::test]
    async fn existing_label_is_reused() {
        let store = Arc::new(MockLabelStore::default().with_label("Label_9", "Work"));
        let registry = LabelRegistry::new(store.clone());

        let id = registry.resolve_or_create("Work").await;

        assert_eq!(id, Some(LabelId::from("Label_9")));
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_label_is_created_once() {
        let store = Arc::new(MockLabelStore::default());
        let registry = LabelRegistry::new(store.clone());

        let first = registry.resolve_or_create("Work").await;
        let second = registry.resolve_or_create("Work").await;

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fresh_registry_finds_label_created_earlier() {
        let store = Arc::new(MockLabelStore::default());

        let first = LabelRegistry::new(store.clone())
            .resolve_or_create("Work")
            .await;
        let second = LabelRegistry::new(store.clone())
            .resolve_or_create("Work")
            .await;

        assert_eq!(first, second);
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn name_match_is_exact() {
        let store = Arc::new(MockLabelStore::default().with_label("Label_1", "work"));
        let registry = LabelRegistry::new(store.clone());

        let id = registry.resolve_or_create("Work").await;

        assert_ne!(id, Some(LabelId::from("Label_1")));
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn system_label_with_same_name_is_ignored() {
        let store = Arc::new(MockLabelStore::default().with_system_label("SPAM", "Spam"));
        let registry = LabelRegistry::new(store.clone());

        let id = registry.resolve_category(Category::Spam).await;

        assert_ne!(id, Some(LabelId::from("SPAM")));
        assert!(id.is_some());
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_create() {
        let store = Arc::new(MockLabelStore::default());
        let registry = LabelRegistry::new(store.clone());

        let (a, b) = tokio::join!(
            registry.resolve_or_create("Spam"),
            registry.resolve_or_create("Spam")
        );

        assert_eq!(a, b);
        assert_eq!(store.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn store_failure_yields_none() {
        let store = Arc::new(MockLabelStore::default());
        store.failing.store(true, Ordering::SeqCst);
        let registry = LabelRegistry::new(store.clone());

        assert_eq!(registry.resolve_category(Category::Urgent).await, None);
        assert_eq!(registry.cached("Urgent"), None);

        // Recovers once the store is reachable again.
        store.failing.store(false, Ordering::SeqCst);
        assert!(registry.resolve_category(Category::Urgent).await.is_some());
    }

    #[tokio::test]
    async fn category_uses_display_name() {
        let store = Arc::new(MockLabelStore::default().with_label("Label_3", "Newsletters"));
        let registry = LabelRegistry::new(store);

        assert_eq!(
            registry.resolve_category(Category::Newsletters).await,
            Some(LabelId::from("Label_3"))
        );
    }
}
