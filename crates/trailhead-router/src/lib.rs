//! # Trailhead Router
//!
//! A path-based route matching engine for client-side navigation:
//! - Static routes (`/about`)
//! - Dynamic parameters (`/users/:id`)
//! - Custom constraints (`/orders/:id(\d+)`)
//! - Optional and repeatable parameters (`/docs/:lang?`, `/files/:path+`)
//! - Catch-all routes (`/*` or `/:pathMatch(.*)*`)
//! - Nested routes, aliases and named routes
//!
//! ## Matching
//!
//! Every pattern is compiled into an anchored regex plus a specificity
//! [`Score`](route::Score). The registry keeps matchers sorted by score, so
//! resolving a path is a linear scan that stops at the first hit, and the
//! first hit is always the most specific route.
//!
//! ## Path Normalization
//!
//! Incoming paths are cleaned up before matching:
//! - Double slashes: `/path//to` → `/path/to`
//! - Backslashes: `\path\to` → `/path/to`
//! - Trailing slashes are kept; non-strict routes accept them
//!
//! ## Example
//!
//! ```
//! use trailhead_router::{params_from, MatchedLocation, RouteDefinition, RouteLocation, Router};
//!
//! let mut router = Router::new();
//! router.add_route(RouteDefinition::new("/")).unwrap();
//! router.add_route(RouteDefinition::new("/users/:id").with_name("user")).unwrap();
//! router.add_route(RouteDefinition::new("/users/new")).unwrap();
//!
//! let found = router.resolve_path("/users/42");
//! assert_eq!(found.params["id"], "42");
//! assert_eq!(found.matched.len(), 1);
//!
//! let created = router.resolve_path("/users/new");
//! assert_eq!(created.matched[0].path, "/users/new");
//! assert!(created.params.is_empty());
//!
//! assert!(!router.resolve_path("/missing").is_found());
//!
//! let by_name = router
//!     .resolve(
//!         &RouteLocation::named_with("user", params_from([("id", "7")])),
//!         &MatchedLocation::start(),
//!     )
//!     .unwrap();
//! assert_eq!(by_name.path, "/users/7");
//! ```

use std::sync::Arc;

use tracing::{debug, warn};

// ============================================================================
// Module Declarations
// ============================================================================

pub mod config;
pub mod error;
pub mod location;
pub mod params;
pub mod path;
pub mod record;
mod registry;
pub mod route;

pub use config::{DuplicateNamePolicy, RouteTable, RouterOptions};
pub use error::{
    ConfigError, ErrorKind, NotFoundError, Result, RouterError, StringifyError, TableError,
};
pub use location::{MatchedLocation, RouteLocation};
pub use params::{params_from, ParamValue, Params};
pub use path::{is_canonical, join_paths, normalize_path};
pub use record::{is_same_route, Meta, Payload, Redirect, RouteDefinition, RouteRecord, DEFAULT_SLOT};
pub use registry::{MatcherId, RecordMatcher};

use location::merge_meta;
use registry::{plan_tree, ParentContext, Registry};

// ============================================================================
// Route References
// ============================================================================

/// Identifies a registered route either by id or by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRef<'a> {
    Id(MatcherId),
    Name(&'a str),
}

impl From<MatcherId> for RouteRef<'_> {
    fn from(id: MatcherId) -> Self {
        RouteRef::Id(id)
    }
}

impl<'a> From<&'a str> for RouteRef<'a> {
    fn from(name: &'a str) -> Self {
        RouteRef::Name(name)
    }
}

impl<'a> From<&'a String> for RouteRef<'a> {
    fn from(name: &'a String) -> Self {
        RouteRef::Name(name)
    }
}

impl From<&RouteHandle> for RouteRef<'_> {
    fn from(handle: &RouteHandle) -> Self {
        RouteRef::Id(handle.id)
    }
}

impl std::fmt::Display for RouteRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteRef::Id(id) => write!(f, "#{:?}", id),
            RouteRef::Name(name) => f.write_str(name),
        }
    }
}

/// Returned by [`Router::add_route`]; removes exactly the route it added
///
/// Disposing twice, or after the route was already removed some other way,
/// does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteHandle {
    id: MatcherId,
}

impl RouteHandle {
    pub fn id(&self) -> MatcherId {
        self.id
    }

    /// Removes the route (with its children and aliases) if still present
    pub fn dispose(&self, router: &mut Router) {
        router.remove_route(self);
    }
}

// ============================================================================
// Router Implementation
// ============================================================================

/// Route registry plus resolver
///
/// The router is a plain value: mutation needs `&mut self` and resolution
/// borrows it immutably, so a resolve can never observe a half-applied
/// change. Wrap it in a lock to share it between threads.
#[derive(Debug, Clone, Default)]
pub struct Router {
    options: RouterOptions,
    registry: Registry,
}

impl Router {
    /// Creates an empty router with default options (case-sensitive, non-strict)
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty router with the given options
    ///
    /// # Examples
    ///
    /// ```
    /// use trailhead_router::{Router, RouterOptions};
    ///
    /// let router = Router::with_options(RouterOptions::default().with_case_insensitive(true));
    /// assert!(router.options().case_insensitive);
    /// ```
    pub fn with_options(options: RouterOptions) -> Self {
        Self {
            options,
            registry: Registry::default(),
        }
    }

    /// Builds a router from a declarative route table
    ///
    /// # Examples
    ///
    /// ```
    /// use trailhead_router::{RouteTable, Router};
    ///
    /// let table = RouteTable::from_toml_str(r#"
    ///     [[routes]]
    ///     path = "/about"
    ///     name = "about"
    /// "#).unwrap();
    ///
    /// let router = Router::from_table(table).unwrap();
    /// assert!(router.has_route("about"));
    /// ```
    pub fn from_table(table: RouteTable) -> Result<Self> {
        Self::with_options(table.options).with_routes(table.routes)
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    // ========================================================================
    // Functional Builder Methods
    // ========================================================================

    /// Adds a route (functional builder)
    ///
    /// # Examples
    ///
    /// ```
    /// use trailhead_router::{Router, RouteDefinition};
    ///
    /// let router = Router::new()
    ///     .with_route(RouteDefinition::new("/about"))
    ///     .unwrap()
    ///     .with_route(RouteDefinition::new("/users/:id"))
    ///     .unwrap();
    /// assert_eq!(router.len(), 2);
    /// ```
    pub fn with_route(mut self, definition: RouteDefinition) -> Result<Self> {
        self.add_route(definition)?;
        Ok(self)
    }

    /// Adds several routes, stopping at the first invalid one
    pub fn with_routes<I>(mut self, definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = RouteDefinition>,
    {
        for definition in definitions {
            self.add_route(definition)?;
        }
        Ok(self)
    }

    // ========================================================================
    // Registry Mutation
    // ========================================================================

    /// Adds a top-level route with its children and aliases
    ///
    /// Either the whole definition tree is registered or, on error, nothing
    /// is. The returned handle removes exactly this route.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for an invalid pattern, an alias whose params differ
    /// from the primary path, an absolute child path missing a parent param,
    /// or a duplicate name under [`DuplicateNamePolicy::Reject`].
    pub fn add_route(&mut self, definition: RouteDefinition) -> Result<RouteHandle> {
        self.insert_definition(definition, None)
    }

    /// Adds a route as a child of an already registered route
    ///
    /// # Examples
    ///
    /// ```
    /// use trailhead_router::{Router, RouteDefinition};
    ///
    /// let mut router = Router::new();
    /// router.add_route(RouteDefinition::new("/admin").with_name("admin")).unwrap();
    /// router.add_route_under("admin", RouteDefinition::new("users")).unwrap();
    ///
    /// let found = router.resolve_path("/admin/users");
    /// assert_eq!(found.matched.len(), 2);
    /// ```
    pub fn add_route_under<'a>(
        &mut self,
        parent: impl Into<RouteRef<'a>>,
        definition: RouteDefinition,
    ) -> Result<RouteHandle> {
        let parent = parent.into();
        let id = self
            .lookup(parent)
            .map(RecordMatcher::id)
            .ok_or_else(|| ConfigError::UnknownParent {
                parent: parent.to_string(),
            })?;
        self.insert_definition(definition, Some(id))
    }

    fn insert_definition(
        &mut self,
        definition: RouteDefinition,
        parent: Option<MatcherId>,
    ) -> Result<RouteHandle> {
        let context = parent.and_then(|id| self.registry.get(id)).map(ParentContext::from);
        let planned = plan_tree(&definition, context, &self.options)?;

        let replaced = self.name_conflicts(&planned.indexed_names(), planned.path(), parent)?;
        for id in replaced {
            self.registry.remove(id);
        }

        let id = self.registry.commit(planned, parent);
        debug!("Registered route {} ({} matchers)", definition.path, self.registry.len());
        Ok(RouteHandle { id })
    }

    /// Existing routes that must go before names can be registered
    fn name_conflicts(
        &self,
        names: &[&str],
        path: &str,
        parent: Option<MatcherId>,
    ) -> Result<Vec<MatcherId>, ConfigError> {
        let mut replaced = Vec::new();
        for name in names {
            let Some(existing) = self.registry.get_by_name(name) else {
                continue;
            };

            match self.options.duplicate_names {
                DuplicateNamePolicy::Reject => {
                    return Err(ConfigError::DuplicateName {
                        name: name.to_string(),
                    });
                }
                DuplicateNamePolicy::Replace => {
                    if parent.is_some_and(|p| self.registry.removal_reaches(existing.id(), p)) {
                        return Err(ConfigError::record(
                            path,
                            format!("cannot replace `{}` while nesting under it", name),
                        ));
                    }
                    warn!(
                        "Route name {:?} already registered for {}, replacing it",
                        name,
                        existing.record().path
                    );
                    replaced.push(existing.id());
                }
            }
        }
        Ok(replaced)
    }

    /// Removes a route with its children and aliases
    ///
    /// Unknown names and ids are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use trailhead_router::{Router, RouteDefinition};
    ///
    /// let mut router = Router::new();
    /// router.add_route(RouteDefinition::new("/about").with_name("about")).unwrap();
    /// router.remove_route("about");
    /// router.remove_route("about");
    /// assert!(router.is_empty());
    /// ```
    pub fn remove_route<'a>(&mut self, target: impl Into<RouteRef<'a>>) {
        let target = target.into();
        match self.lookup(target).map(RecordMatcher::id) {
            Some(id) => {
                self.registry.remove(id);
            }
            None => debug!("Route {} is not registered, nothing to remove", target),
        }
    }

    /// Removes every route
    pub fn clear_routes(&mut self) {
        self.registry.clear();
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    fn lookup(&self, target: RouteRef<'_>) -> Option<&RecordMatcher> {
        match target {
            RouteRef::Id(id) => self.registry.get(id),
            RouteRef::Name(name) => self.registry.get_by_name(name),
        }
    }

    /// All records, most specific first
    pub fn get_routes(&self) -> Vec<Arc<RouteRecord>> {
        self.registry
            .ordered()
            .map(|entry| Arc::clone(entry.record()))
            .collect()
    }

    /// The matcher registered under `name`
    pub fn get_record_matcher(&self, name: &str) -> Option<&RecordMatcher> {
        self.registry.get_by_name(name)
    }

    /// The matcher with the given id, if still registered
    pub fn get_matcher(&self, id: MatcherId) -> Option<&RecordMatcher> {
        self.registry.get(id)
    }

    /// Live children of a matcher
    pub fn children_of(&self, id: MatcherId) -> Vec<&RecordMatcher> {
        self.registry
            .get(id)
            .map(|entry| {
                entry
                    .children()
                    .iter()
                    .filter_map(|child| self.registry.get(*child))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.registry.get_by_name(name).is_some()
    }

    /// Number of registered matchers, aliases included
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolves a location relative to the current one
    ///
    /// # Errors
    ///
    /// - [`NotFoundError`] when a named location names nothing, or a relative
    ///   location has no route to stay on
    /// - [`StringifyError`] when params required by the target are missing
    ///
    /// A path that matches nothing is not an error; the result simply has an
    /// empty `matched` list.
    ///
    /// # Examples
    ///
    /// ```
    /// use trailhead_router::{params_from, RouteDefinition, RouteLocation, Router};
    ///
    /// let mut router = Router::new();
    /// router
    ///     .add_route(RouteDefinition::new("/users/:id/:tab?").with_name("user"))
    ///     .unwrap();
    ///
    /// let current = router.resolve_path("/users/1/posts");
    /// let next = router
    ///     .resolve(&RouteLocation::relative(params_from([("id", "2")])), &current)
    ///     .unwrap();
    /// assert_eq!(next.path, "/users/2/posts");
    /// ```
    pub fn resolve(
        &self,
        location: &RouteLocation,
        current: &MatchedLocation,
    ) -> Result<MatchedLocation> {
        match location {
            RouteLocation::Path(path) => Ok(self.resolve_path(path)),
            RouteLocation::Named { name, params } => {
                let entry = self
                    .registry
                    .get_by_name(name)
                    .ok_or_else(|| NotFoundError::Name { name: name.clone() })?;
                self.resolve_entry(entry, &current.params, params)
            }
            RouteLocation::Relative { params } => {
                let entry = match current.name.as_deref() {
                    Some(name) => self
                        .registry
                        .get_by_name(name)
                        .ok_or_else(|| NotFoundError::Name { name: name.to_string() })?,
                    None => self
                        .registry
                        .find_by_path(&normalize_path(&current.path))
                        .map(|(entry, _)| entry)
                        .ok_or_else(|| NotFoundError::Path {
                            path: current.path.clone(),
                        })?,
                };
                self.resolve_entry(entry, &current.params, params)
            }
        }
    }

    /// Resolves a concrete path; never fails
    ///
    /// # Examples
    ///
    /// ```
    /// use trailhead_router::{ParamValue, Router, RouteDefinition};
    ///
    /// let mut router = Router::new();
    /// router.add_route(RouteDefinition::new("/docs/:path+")).unwrap();
    ///
    /// let found = router.resolve_path("/docs//guide/intro");
    /// assert_eq!(found.path, "/docs/guide/intro");
    /// assert_eq!(found.params["path"], ParamValue::from(vec!["guide", "intro"]));
    /// ```
    pub fn resolve_path(&self, path: &str) -> MatchedLocation {
        let path = normalize_path(path);
        match self.registry.find_by_path(&path) {
            Some((entry, params)) => self.matched_location(entry, path.into_owned(), params),
            None => {
                debug!("No route matches {}", path);
                MatchedLocation::unmatched(path.into_owned())
            }
        }
    }

    /// Generates the path of a named route
    ///
    /// # Examples
    ///
    /// ```
    /// use trailhead_router::{params_from, Router, RouteDefinition};
    ///
    /// let mut router = Router::new();
    /// router.add_route(RouteDefinition::new("/users/:id").with_name("user")).unwrap();
    ///
    /// let url = router.url_for("user", &params_from([("id", "42")])).unwrap();
    /// assert_eq!(url, "/users/42");
    /// assert!(router.url_for("user", &Default::default()).is_err());
    /// ```
    pub fn url_for(&self, name: &str, params: &Params) -> Result<String> {
        let entry = self
            .registry
            .get_by_name(name)
            .ok_or_else(|| NotFoundError::Name {
                name: name.to_string(),
            })?;
        Ok(entry.matcher().build(params)?)
    }

    /// Builds the target path from current params overlaid with `supplied`
    ///
    /// Only params the target declares are kept.
    fn resolve_entry(
        &self,
        entry: &RecordMatcher,
        current: &Params,
        supplied: &Params,
    ) -> Result<MatchedLocation> {
        let declares = |key: &str| entry.matcher().keys().iter().any(|k| k.name == key);

        let mut params: Params = current
            .iter()
            .filter(|(key, _)| declares(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for (key, value) in supplied {
            if declares(key.as_str()) {
                params.insert(key.clone(), value.clone());
            } else {
                debug!("Discarding param {:?} unknown to {}", key, entry.matcher().pattern());
            }
        }

        let path = entry.matcher().build(&params)?;
        Ok(self.matched_location(entry, path, params))
    }

    /// Collects the matched chain root-first and merges its meta
    fn matched_location(&self, leaf: &RecordMatcher, path: String, params: Params) -> MatchedLocation {
        let mut matched: Vec<Arc<RouteRecord>> = self
            .registry
            .ancestors(leaf.id())
            .map(|entry| Arc::clone(entry.record()))
            .collect();
        matched.reverse();

        MatchedLocation {
            name: leaf.record().name.clone(),
            path,
            params,
            meta: merge_meta(&matched),
            matched,
        }
    }
}
