//! The manager half of the Manager/Resource pattern: list/find/create/
//! update/delete, query-prop vs. client-side filtering, and the
//! NameUriCache-backed name lookups.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::cache::{DEFAULT_TTL, NameUriCache};
use crate::error::HmcError;
use crate::properties::Properties;
use crate::resource::{ManagerHandle, ManagerInternal, Resource};
use crate::session::Session;

/// A client-side or server-side filter value: either one scalar to match,
/// or a list of alternatives (any element matching yields a hit).
pub type FilterArgs = HashMap<String, Value>;

/// Static description of one concrete resource kind's manager, supplied by
/// the per-kind module (`resources::cpc`, `resources::lpar`, ...).
pub struct ManagerSpec {
    pub class_name: &'static str,
    pub list_uri: String,
    pub members_key: &'static str,
    pub base_uri: String,
    pub oid_prop: &'static str,
    pub uri_prop: &'static str,
    pub name_prop: &'static str,
    pub query_props: &'static [&'static str],
    pub supports_properties: bool,
    pub case_insensitive_names: bool,
}

struct ManagerCore {
    session: Session,
    parent_uri: Option<String>,
    spec: ManagerSpec,
    cache: NameUriCache,
}

#[async_trait]
impl ManagerInternal for ManagerCore {
    fn session(&self) -> &Session {
        &self.session
    }
    fn class_name(&self) -> &'static str {
        self.spec.class_name
    }
    fn uri_prop(&self) -> &'static str {
        self.spec.uri_prop
    }
    fn name_prop(&self) -> &'static str {
        self.spec.name_prop
    }
    fn parent_uri(&self) -> Option<String> {
        self.parent_uri.clone()
    }

    async fn notify_deleted(&self, uri: &str) {
        // We don't retain a uri->name index, so scan-evict is unnecessary:
        // the cache only maps name->uri, and callers invalidate by name on
        // rename/delete from the Resource side when they know the old name.
        // For delete, a best-effort full invalidate keeps the cache correct
        // without tracking reverse lookups.
        debug!(uri, "evicting cache entry for deleted resource");
        self.cache.invalidate().await;
    }

    async fn notify_renamed(&self, uri: &str, old_name: Option<&str>, new_name: Option<&str>) {
        if let Some(old) = old_name {
            self.cache.delete(old).await;
        }
        if let Some(new) = new_name {
            self.cache.update(new, uri).await;
        }
    }
}

/// A typed manager over resource kind `T`. Cheap to clone.
pub struct Manager<T> {
    core: Arc<ManagerCore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Manager<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            _marker: PhantomData,
        }
    }
}

fn matches_scalar(prop_value: &Value, filter_scalar: &Value) -> bool {
    if let Value::String(pattern) = filter_scalar {
        return match prop_value {
            Value::String(s) => Regex::new(pattern).is_ok_and(|re| re.is_match(s)),
            _ => false,
        };
    }
    prop_value == filter_scalar
}

fn matches_filter(prop_value: &Value, filter_value: &Value) -> bool {
    match filter_value {
        Value::Array(alternatives) => alternatives.iter().any(|alt| matches_scalar(prop_value, alt)),
        scalar => matches_scalar(prop_value, scalar),
    }
}

fn matches_all(props: &Properties, filter_args: &FilterArgs) -> bool {
    filter_args.iter().all(|(key, filter_value)| {
        props
            .get(key)
            .is_some_and(|prop_value| matches_filter(prop_value, filter_value))
    })
}

pub(crate) fn build_query_string(query_args: &FilterArgs) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in query_args {
        match value {
            Value::Array(items) => {
                for item in items {
                    serializer.append_pair(key, &scalar_to_query_string(item));
                }
            }
            scalar => {
                serializer.append_pair(key, &scalar_to_query_string(scalar));
            }
        }
    }
    serializer.finish()
}

fn scalar_to_query_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl<T> Manager<T>
where
    T: From<Resource> + AsRef<Resource> + Send + Sync,
{
    pub(crate) fn new(session: Session, parent_uri: Option<String>, spec: ManagerSpec) -> Self {
        let cache = NameUriCache::new(DEFAULT_TTL, spec.case_insensitive_names);
        Self {
            core: Arc::new(ManagerCore {
                session,
                parent_uri,
                spec,
                cache,
            }),
            _marker: PhantomData,
        }
    }

    pub(crate) fn handle(&self) -> ManagerHandle {
        self.core.clone()
    }

    #[must_use]
    pub fn class_name(&self) -> &'static str {
        self.core.spec.class_name
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.core.session
    }

    #[must_use]
    pub fn base_uri(&self) -> &str {
        &self.core.spec.base_uri
    }

    /// Build a local [`Resource`] (and wrap it as `T`) from a URI or OID,
    /// without any network call.
    pub fn resource_object(&self, uri_or_oid: &str, extra_props: Option<Properties>) -> T {
        let uri = if uri_or_oid.starts_with('/') {
            uri_or_oid.to_string()
        } else {
            format!("{}/{uri_or_oid}", self.core.spec.base_uri)
        };
        let oid = uri.rsplit('/').next().unwrap_or(uri_or_oid).to_string();

        let mut props = Properties::new();
        props.insert(self.core.spec.uri_prop.to_string(), Value::String(uri.clone()));
        props.insert(self.core.spec.oid_prop.to_string(), Value::String(oid));
        props.insert("class".to_string(), Value::String(self.core.spec.class_name.to_string()));
        props.insert(
            "parent".to_string(),
            self.core
                .parent_uri
                .clone()
                .map_or(Value::Null, Value::String),
        );
        if let Some(extra) = extra_props {
            for (k, v) in extra {
                props.insert(k, v);
            }
        }

        let resource = Resource::new(self.handle(), uri, props, false);
        T::from(resource)
    }

    fn make_resource_from_item(&self, item: &Properties) -> Option<T> {
        let uri = item.get(self.core.spec.uri_prop).and_then(Value::as_str)?;
        let resource = Resource::new(self.handle(), uri.to_string(), item.clone(), false);
        Some(T::from(resource))
    }

    /// List all children, optionally applying `filter_args`: keys present in
    /// the manager's `query_props` are sent as URL query parameters; the
    /// rest are applied client-side against the (possibly sparse)
    /// properties returned by `list`.
    pub async fn list(&self, full_properties: bool, filter_args: Option<FilterArgs>) -> Result<Vec<T>, HmcError> {
        let (query_args, client_args) = self.split_filter_args(filter_args);

        let mut uri = self.core.spec.list_uri.clone();
        if !query_args.is_empty() {
            let qs = build_query_string(&query_args);
            if !qs.is_empty() {
                uri.push('?');
                uri.push_str(&qs);
            }
        }

        let body = self.core.session.get(&uri, true, true).await?;
        let items = body
            .get(self.core.spec.members_key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut results = Vec::with_capacity(items.len());
        for item in &items {
            let Some(props) = item.as_object() else { continue };
            if !client_args.is_empty() && !matches_all(props, &client_args) {
                continue;
            }
            if let Some(resource) = self.make_resource_from_item(props) {
                results.push(resource);
            }
        }

        if full_properties {
            for resource in &results {
                AsRef::<Resource>::as_ref(resource).pull_full_properties().await?;
            }
        }

        // Opportunistically (re)populate the name cache from this listing,
        // but only when it was an unfiltered-by-name-prop-on-the-server pass,
        // so later find_by_name calls in the same TTL window are free.
        if query_args.is_empty() {
            let entries = items.iter().filter_map(|item| {
                let props = item.as_object()?;
                let name = props.get(self.core.spec.name_prop)?.as_str()?.to_string();
                let uri = props.get(self.core.spec.uri_prop)?.as_str()?.to_string();
                Some((name, uri))
            });
            self.core.cache.populate(entries).await;
        }

        Ok(results)
    }

    fn split_filter_args(&self, filter_args: Option<FilterArgs>) -> (FilterArgs, FilterArgs) {
        let Some(filter_args) = filter_args else {
            return (FilterArgs::new(), FilterArgs::new());
        };
        let mut query_args = FilterArgs::new();
        let mut client_args = FilterArgs::new();
        for (k, v) in filter_args {
            if self.core.spec.query_props.contains(&k.as_str()) {
                query_args.insert(k, v);
            } else {
                client_args.insert(k, v);
            }
        }
        (query_args, client_args)
    }

    /// `find_by_name`: consult the cache, repopulating via `list` on a miss.
    pub async fn find_by_name(&self, name: &str) -> Result<T, HmcError> {
        if let Some(uri) = self.core.cache.get(name).await {
            return Ok(self.resource_object(&uri, None));
        }
        // Miss: repopulate by listing everything, then retry once.
        self.list(false, None).await?;
        self.core
            .cache
            .get(name)
            .await
            .map(|uri| self.resource_object(&uri, None))
            .ok_or_else(|| HmcError::NotFound(format!("{} named {name:?}", self.core.spec.class_name)))
    }

    /// `findall`: delegates to the name cache when the single filter is the
    /// name property; otherwise a plain `list(filter_args=...)`.
    pub async fn findall(&self, filter_args: FilterArgs) -> Result<Vec<T>, HmcError> {
        if filter_args.len() == 1 {
            if let Some(Value::String(name)) = filter_args.get(self.core.spec.name_prop) {
                return match self.find_by_name(name).await {
                    Ok(resource) => Ok(vec![resource]),
                    Err(HmcError::NotFound(_)) => Ok(vec![]),
                    Err(e) => Err(e),
                };
            }
        }
        self.list(false, Some(filter_args)).await
    }

    /// `find`: `findall` with a cardinality check.
    pub async fn find(&self, filter_args: FilterArgs) -> Result<T, HmcError> {
        let mut matches = self.findall(filter_args.clone()).await?;
        match matches.len() {
            0 => Err(HmcError::NotFound(format!(
                "no {} matches {filter_args:?}",
                self.core.spec.class_name
            ))),
            1 => Ok(matches.remove(0)),
            _ => Err(HmcError::NoUniqueMatch(format!(
                "{} matches for {} matched {filter_args:?}",
                matches.len(),
                self.core.spec.class_name
            ))),
        }
    }

    /// `create`: `POST create_uri` with `properties`; merges the response
    /// (typically just the new `object-uri`) into a local resource.
    pub async fn create(&self, create_uri: &str, properties: Properties) -> Result<T, HmcError> {
        let response = self
            .core
            .session
            .post_and_wait(create_uri, Some(Value::Object(properties.clone())), None)
            .await?;

        let mut props = properties;
        if let Some(Value::Object(response_props)) = response {
            for (k, v) in response_props {
                props.insert(k, v);
            }
        }
        let uri = props
            .get(self.core.spec.uri_prop)
            .and_then(Value::as_str)
            .ok_or_else(|| HmcError::ConsistencyError("create response missing object-uri".to_string()))?
            .to_string();
        props.insert("class".to_string(), Value::String(self.core.spec.class_name.to_string()));

        if let Some(name) = props.get(self.core.spec.name_prop).and_then(Value::as_str) {
            self.core.cache.update(name, &uri).await;
        }

        let resource = Resource::new(self.handle(), uri, props, false);
        Ok(T::from(resource))
    }

    /// `delete`: delegates to [`Resource::delete`].
    pub async fn delete(&self, resource: &T) -> Result<(), HmcError> {
        AsRef::<Resource>::as_ref(resource).delete().await
    }

    /// `update_properties`: delegates to [`Resource::update_properties`].
    pub async fn update_properties(&self, resource: &T, properties: Properties) -> Result<(), HmcError> {
        AsRef::<Resource>::as_ref(resource)
            .update_properties(properties)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_string_filter_is_regex_match() {
        assert!(matches_scalar(&json!("foo"), &json!("^foo$")));
        assert!(matches_scalar(&json!("foobar"), &json!("foo.*")));
        assert!(matches_scalar(&json!("anything"), &json!(".+")));
        assert!(!matches_scalar(&json!("bar"), &json!("^foo$")));
    }

    #[test]
    fn non_string_filter_requires_equality() {
        assert!(matches_scalar(&json!(5), &json!(5)));
        assert!(!matches_scalar(&json!(5), &json!(6)));
        assert!(matches_scalar(&json!(true), &json!(true)));
    }

    #[test]
    fn list_filter_value_matches_if_any_alternative_matches() {
        let filter = json!(["bar", "foo"]);
        assert!(matches_filter(&json!("foo"), &filter));
        assert!(!matches_filter(&json!("baz"), &filter));
    }

    #[test]
    fn matches_all_requires_every_key() {
        let mut props = Properties::new();
        props.insert("name".to_string(), json!("cpc1"));
        props.insert("status".to_string(), json!("active"));

        let mut filters = FilterArgs::new();
        filters.insert("name".to_string(), json!("^cpc1$"));
        assert!(matches_all(&props, &filters));

        filters.insert("status".to_string(), json!("inactive"));
        assert!(!matches_all(&props, &filters));
    }

    #[test]
    fn query_string_encodes_list_as_repeated_pairs() {
        let mut args = FilterArgs::new();
        args.insert("name".to_string(), json!(["a", "b"]));
        let qs = build_query_string(&args);
        assert!(qs.contains("name=a"));
        assert!(qs.contains("name=b"));
    }
}
