//! The resource half of the Manager/Resource pattern.
//!
//! `Resource` is deliberately not generic: every concrete kind (`Cpc`,
//! `Lpar`, `Partition`, ...) is a newtype wrapper around one of these
//! that `Deref`s to it for the common capability set and adds its own
//! inherent methods for kind-specific operations (composition, not
//! subclassing).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::HmcError;
use crate::properties::Properties;
use crate::session::Session;

/// Non-owning callback surface a `Resource` uses to talk back to the
/// `Manager` that created it, without requiring `Resource` to be generic
/// over the manager's resource-wrapper type.
#[async_trait]
pub trait ManagerInternal: Send + Sync {
    fn session(&self) -> &Session;
    fn class_name(&self) -> &'static str;
    fn uri_prop(&self) -> &'static str;
    fn name_prop(&self) -> &'static str;
    fn parent_uri(&self) -> Option<String>;

    /// Invoked after a resource under this manager is deleted, so the
    /// manager can evict the corresponding `NameUriCache` entry.
    async fn notify_deleted(&self, uri: &str);

    /// Invoked after a resource's name-bearing property changed, so the
    /// manager can invalidate the old cache entry and seed the new one.
    async fn notify_renamed(&self, uri: &str, old_name: Option<&str>, new_name: Option<&str>);
}

pub(crate) type ManagerHandle = Arc<dyn ManagerInternal>;

struct ResourceCore {
    uri: String,
    manager: ManagerHandle,
    properties: RwLock<Properties>,
    properties_are_full: AtomicBool,
    ceased_existence: AtomicBool,
    auto_update: AtomicBool,
}

/// A handle to one HMC resource. Cheap to clone (an `Arc` underneath).
#[derive(Clone)]
pub struct Resource {
    core: Arc<ResourceCore>,
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("uri", &self.core.uri)
            .field("class_name", &self.core.manager.class_name())
            .field("ceased_existence", &self.ceased_existence())
            .finish_non_exhaustive()
    }
}

impl Resource {
    /// Build a resource from properties already known locally (e.g. from a
    /// `list` response), or materialize one with no network call
    /// (`resource_object`).
    pub(crate) fn new(manager: ManagerHandle, uri: String, properties: Properties, full: bool) -> Self {
        Self {
            core: Arc::new(ResourceCore {
                uri,
                manager,
                properties: RwLock::new(properties),
                properties_are_full: AtomicBool::new(full),
                ceased_existence: AtomicBool::new(false),
                auto_update: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.core.uri
    }

    #[must_use]
    pub fn class_name(&self) -> &'static str {
        self.core.manager.class_name()
    }

    #[must_use]
    pub(crate) fn session(&self) -> &Session {
        self.core.manager.session()
    }

    #[must_use]
    pub fn ceased_existence(&self) -> bool {
        self.core.ceased_existence.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn auto_update_enabled(&self) -> bool {
        self.core.auto_update.load(Ordering::Acquire)
    }

    pub fn set_auto_update(&self, enabled: bool) {
        self.core.auto_update.store(enabled, Ordering::Release);
    }

    fn ensure_not_ceased(&self) -> Result<(), HmcError> {
        if self.ceased_existence() {
            Err(HmcError::CeasedExistence(self.core.uri.clone()))
        } else {
            Ok(())
        }
    }

    /// A snapshot clone of the currently-known properties (may be sparse).
    pub async fn properties(&self) -> Properties {
        self.core.properties.read().await.clone()
    }

    /// The resource's display name, from the manager's configured name
    /// property, if present locally.
    pub async fn name(&self) -> Option<String> {
        let props = self.properties().await;
        props
            .get(self.core.manager.name_prop())
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Returns the property value, pulling full properties on a miss if the
    /// resource isn't already fully populated.
    pub async fn prop(&self, name: &str) -> Result<Option<Value>, HmcError> {
        {
            let props = self.core.properties.read().await;
            if let Some(v) = props.get(name) {
                return Ok(Some(v.clone()));
            }
        }
        if self.core.properties_are_full.load(Ordering::Acquire) {
            return Ok(None);
        }
        self.pull_full_properties().await?;
        Ok(self.core.properties.read().await.get(name).cloned())
    }

    /// Like [`Self::prop`], but raises [`HmcError::ConsistencyError`] if the
    /// property is still absent after a full pull.
    pub async fn get_property(&self, name: &str) -> Result<Value, HmcError> {
        self.prop(name).await?.ok_or_else(|| {
            HmcError::ConsistencyError(format!(
                "property {name:?} not present on {} after full pull",
                self.core.uri
            ))
        })
    }

    /// `GET <uri>`; replaces the local properties wholesale.
    pub async fn pull_full_properties(&self) -> Result<(), HmcError> {
        self.ensure_not_ceased()?;
        let body = self.session().get(&self.core.uri, true, true).await?;
        let props = body.as_object().cloned().unwrap_or_default();
        *self.core.properties.write().await = props;
        self.core.properties_are_full.store(true, Ordering::Release);
        Ok(())
    }

    /// `POST <uri>` with `new_props`; merges them into the local properties
    /// on success so callers observe the change without a refresh. If the
    /// name-bearing property changed, invalidates the old and seeds the new
    /// `NameUriCache` entry.
    pub async fn update_properties(&self, new_props: Properties) -> Result<(), HmcError> {
        self.ensure_not_ceased()?;
        let old_name = self.name().await;

        self.session()
            .post_and_wait(&self.core.uri, Some(Value::Object(new_props.clone())), None)
            .await?;

        {
            let mut props = self.core.properties.write().await;
            for (k, v) in new_props.clone() {
                props.insert(k, v);
            }
        }

        let new_name = self.name().await;
        if old_name != new_name {
            self.core
                .manager
                .notify_renamed(&self.core.uri, old_name.as_deref(), new_name.as_deref())
                .await;
        }
        Ok(())
    }

    /// `DELETE <uri>`; flips `ceased_existence` and evicts the resource from
    /// its manager's `NameUriCache`.
    pub async fn delete(&self) -> Result<(), HmcError> {
        self.ensure_not_ceased()?;
        self.session().delete(&self.core.uri, true).await?;
        self.core.ceased_existence.store(true, Ordering::Release);
        self.core.manager.notify_deleted(&self.core.uri).await;
        Ok(())
    }

    /// Apply a property update pushed by [`crate::notification::NotificationReceiver`]
    /// when auto-update is enabled for this resource.
    pub async fn apply_auto_update(&self, changed: Properties) {
        if !self.auto_update_enabled() {
            return;
        }
        let mut props = self.core.properties.write().await;
        for (k, v) in changed {
            props.insert(k, v);
        }
    }

    /// Merge properties known to have changed because an operation this
    /// resource itself just ran completed (e.g. the `last-used-load-*`
    /// bookkeeping after `Lpar::load`). Unlike [`Self::apply_auto_update`],
    /// this always applies: the caller just observed the HMC act on this
    /// resource, independent of whether push-notification auto-update is
    /// enabled for it.
    pub async fn merge_local_properties(&self, changed: Properties) {
        let mut props = self.core.properties.write().await;
        for (k, v) in changed {
            props.insert(k, v);
        }
    }

    /// Flip `ceased_existence` in response to a push delete notification.
    pub fn apply_auto_delete(&self) {
        if self.auto_update_enabled() {
            self.core.ceased_existence.store(true, Ordering::Release);
        }
    }

    pub(crate) fn manager_handle(&self) -> &ManagerHandle {
        &self.core.manager
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A trivial in-memory manager stub for unit tests that only need
    /// `Resource`'s own behavior (pull/update/delete), not a live HMC.
    pub struct StubManager {
        pub session: Session,
        pub class_name: &'static str,
    }

    #[async_trait]
    impl ManagerInternal for StubManager {
        fn session(&self) -> &Session {
            &self.session
        }
        fn class_name(&self) -> &'static str {
            self.class_name
        }
        fn uri_prop(&self) -> &'static str {
            "object-uri"
        }
        fn name_prop(&self) -> &'static str {
            "name"
        }
        fn parent_uri(&self) -> Option<String> {
            None
        }
        async fn notify_deleted(&self, _uri: &str) {}
        async fn notify_renamed(&self, _uri: &str, _old: Option<&str>, _new: Option<&str>) {}
    }
}
