//! Route definitions and their normalized records
//!
//! [`RouteDefinition`] is what callers write (by hand, with the builder
//! methods, or deserialized from a route table). [`RouteRecord`] is the
//! canonical form stored by the router: absolute path, components keyed by
//! slot, guards as a list, props split per slot.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::params::Params;
use crate::path::{collapse_slashes, join_paths};

/// Slot used for the `component` shorthand
pub const DEFAULT_SLOT: &str = "default";

/// Opaque payload carried but never interpreted by the matcher
pub type Payload = Value;

/// Route metadata, merged root-to-leaf on resolution
pub type Meta = serde_json::Map<String, Value>;

// ============================================================================
// Raw definitions
// ============================================================================

/// A user-supplied route definition
///
/// # Examples
///
/// ```
/// use trailhead_router::RouteDefinition;
/// use serde_json::json;
///
/// let route = RouteDefinition::new("/users/:id")
///     .with_name("user")
///     .with_component(json!("UserView"))
///     .with_meta("requiresAuth", true)
///     .with_alias("/u/:id")
///     .with_child(RouteDefinition::new("posts").with_name("user.posts"));
///
/// assert_eq!(route.alias, vec!["/u/:id"]);
/// assert_eq!(route.children.len(), 1);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteDefinition {
    /// Path pattern; relative paths are appended to the parent's path
    pub path: String,
    /// Unique name for resolution by name
    #[serde(default)]
    pub name: Option<String>,
    /// Shorthand for a single component in the default slot
    #[serde(default)]
    pub component: Option<Payload>,
    /// Components keyed by slot name
    #[serde(default)]
    pub components: BTreeMap<String, Payload>,
    #[serde(default)]
    pub children: Vec<RouteDefinition>,
    /// Secondary path patterns for the same route (string or list)
    #[serde(default, deserialize_with = "one_or_many")]
    pub alias: Vec<String>,
    #[serde(default)]
    pub meta: Meta,
    /// Guards (single value or list), carried for the navigation layer
    #[serde(default, alias = "beforeEnter", deserialize_with = "one_or_many")]
    pub before_enter: Vec<Payload>,
    /// Props configuration, per slot when `components` is used
    #[serde(default)]
    pub props: Option<Payload>,
    #[serde(default)]
    pub redirect: Option<Redirect>,
    /// Per-route override of the router's case sensitivity
    #[serde(default)]
    pub case_insensitive: Option<bool>,
    /// Per-route override of the router's trailing-slash strictness
    #[serde(default)]
    pub strict: Option<bool>,
}

/// Where a redirect record sends the navigation layer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Redirect {
    /// A literal path
    Path(String),
    /// A named route with params
    Named {
        name: String,
        #[serde(default)]
        params: Params,
    },
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    // Many goes first: an untagged `Value` would swallow a whole array as One.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}

impl RouteDefinition {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the component of the default slot
    pub fn with_component(mut self, component: impl Into<Payload>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Sets the component of a named slot
    pub fn with_slot(mut self, slot: impl Into<String>, component: impl Into<Payload>) -> Self {
        self.components.insert(slot.into(), component.into());
        self
    }

    pub fn with_child(mut self, child: RouteDefinition) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = RouteDefinition>,
    {
        self.children.extend(children);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alias.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn with_guard(mut self, guard: impl Into<Payload>) -> Self {
        self.before_enter.push(guard.into());
        self
    }

    pub fn with_props(mut self, props: impl Into<Payload>) -> Self {
        self.props = Some(props.into());
        self
    }

    pub fn with_redirect(mut self, redirect: Redirect) -> Self {
        self.redirect = Some(redirect);
        self
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = Some(case_insensitive);
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }
}

// ============================================================================
// Normalized records
// ============================================================================

/// The canonical form of one route
///
/// `parent` and `alias_of` are non-owning links: a record never keeps its
/// parent or primary alive.
#[derive(Debug, Clone)]
pub struct RouteRecord {
    /// Absolute, slash-normalized path pattern
    pub path: String,
    /// Route name; alias records carry their primary's name
    pub name: Option<String>,
    pub components: BTreeMap<String, Payload>,
    pub meta: Meta,
    pub guards: Vec<Payload>,
    /// Props configuration per component slot
    pub props: BTreeMap<String, Payload>,
    pub redirect: Option<Redirect>,
    pub(crate) parent: Option<Weak<RouteRecord>>,
    pub(crate) alias_of: Option<Weak<RouteRecord>>,
}

impl RouteRecord {
    /// Normalizes a definition under an already-resolved absolute path
    pub(crate) fn from_definition(definition: &RouteDefinition, path: String) -> Self {
        let mut components = definition.components.clone();
        if let Some(component) = &definition.component {
            components.insert(DEFAULT_SLOT.to_string(), component.clone());
        }

        Self {
            path,
            name: definition.name.clone(),
            props: normalize_props(definition),
            components,
            meta: definition.meta.clone(),
            guards: definition.before_enter.clone(),
            redirect: definition.redirect.clone(),
            parent: None,
            alias_of: None,
        }
    }

    /// The parent record, if it is still registered
    pub fn parent(&self) -> Option<Arc<RouteRecord>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// The primary record this alias stands for, if it is still registered
    pub fn alias_of(&self) -> Option<Arc<RouteRecord>> {
        self.alias_of.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_alias(&self) -> bool {
        self.alias_of.is_some()
    }

    pub fn component(&self, slot: &str) -> Option<&Payload> {
        self.components.get(slot)
    }
}

/// Whether two records are the same logical route (alias-aware)
///
/// # Examples
///
/// ```
/// use trailhead_router::{is_same_route, Router, RouteDefinition};
///
/// let mut router = Router::new();
/// router.add_route(RouteDefinition::new("/home").with_alias("/")).unwrap();
///
/// let home = router.resolve_path("/home").matched;
/// let root = router.resolve_path("/").matched;
/// assert!(is_same_route(&home[0], &root[0]));
/// ```
pub fn is_same_route(a: &Arc<RouteRecord>, b: &Arc<RouteRecord>) -> bool {
    let primary = |record: &Arc<RouteRecord>| record.alias_of().unwrap_or_else(|| Arc::clone(record));
    Arc::ptr_eq(&primary(a), &primary(b))
}

/// Absolute path of a record given its raw path and its parent's path
///
/// Paths starting with `/` escape the parent and are used verbatim.
pub(crate) fn resolve_record_path(raw: &str, parent_path: Option<&str>) -> String {
    match parent_path {
        Some(parent) if !raw.starts_with('/') => join_paths(parent, raw),
        _ => collapse_slashes(raw),
    }
}

fn normalize_props(definition: &RouteDefinition) -> BTreeMap<String, Payload> {
    let Some(props) = &definition.props else {
        return BTreeMap::new();
    };

    if definition.component.is_some() || definition.components.is_empty() {
        return BTreeMap::from([(DEFAULT_SLOT.to_string(), props.clone())]);
    }

    definition
        .components
        .keys()
        .filter_map(|slot| match props {
            Value::Object(per_slot) => per_slot.get(slot).map(|value| (slot.clone(), value.clone())),
            shared => Some((slot.clone(), shared.clone())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_component_shorthand_goes_to_default_slot() {
        let def = RouteDefinition::new("/").with_component("Home");
        let record = RouteRecord::from_definition(&def, "/".to_string());
        assert_eq!(record.component(DEFAULT_SLOT), Some(&json!("Home")));
        assert_eq!(record.components.len(), 1);
    }

    #[test]
    fn test_meta_defaults_to_empty() {
        let record = RouteRecord::from_definition(&RouteDefinition::new("/"), "/".to_string());
        assert!(record.meta.is_empty());
        assert!(record.guards.is_empty());
        assert!(record.props.is_empty());
    }

    #[test]
    fn test_props_single_component() {
        let def = RouteDefinition::new("/u/:id")
            .with_component("User")
            .with_props(true);
        let record = RouteRecord::from_definition(&def, def.path.clone());
        assert_eq!(record.props.get(DEFAULT_SLOT), Some(&json!(true)));
    }

    #[test]
    fn test_props_split_per_slot() {
        let def = RouteDefinition::new("/")
            .with_slot("default", "Main")
            .with_slot("sidebar", "Side")
            .with_props(json!({ "sidebar": { "collapsed": true } }));
        let record = RouteRecord::from_definition(&def, "/".to_string());
        assert_eq!(record.props.len(), 1);
        assert_eq!(record.props["sidebar"], json!({ "collapsed": true }));

        let def = def.with_props(true);
        let record = RouteRecord::from_definition(&def, "/".to_string());
        assert_eq!(record.props.len(), 2);
    }

    #[test]
    fn test_resolve_record_path() {
        assert_eq!(resolve_record_path("child", Some("/parent")), "/parent/child");
        assert_eq!(resolve_record_path("", Some("/parent")), "/parent");
        assert_eq!(resolve_record_path("/abs", Some("/parent")), "/abs");
        assert_eq!(resolve_record_path("top", None), "/top");
        assert_eq!(resolve_record_path("//a//b", None), "/a/b");
    }

    #[test]
    fn test_deserialize_single_guard_and_alias() {
        let def: RouteDefinition = serde_json::from_value(json!({
            "path": "/admin",
            "alias": "/root",
            "beforeEnter": "requireAdmin",
            "component": "Admin"
        }))
        .unwrap();
        assert_eq!(def.alias, vec!["/root"]);
        assert_eq!(def.before_enter, vec![json!("requireAdmin")]);

        let def: RouteDefinition = serde_json::from_value(json!({
            "path": "/admin",
            "alias": ["/a", "/b"],
            "before_enter": ["one", "two"]
        }))
        .unwrap();
        assert_eq!(def.alias, vec!["/a", "/b"]);
        assert_eq!(def.before_enter, vec![json!("one"), json!("two")]);
    }

    #[test]
    fn test_deserialize_redirect() {
        let def: RouteDefinition = serde_json::from_value(json!({
            "path": "/old",
            "redirect": { "name": "user", "params": { "id": "1" } }
        }))
        .unwrap();
        assert!(matches!(def.redirect, Some(Redirect::Named { ref name, .. }) if name == "user"));

        let def: RouteDefinition =
            serde_json::from_value(json!({ "path": "/old", "redirect": "/new" })).unwrap();
        assert_eq!(def.redirect, Some(Redirect::Path("/new".to_string())));
    }
}
