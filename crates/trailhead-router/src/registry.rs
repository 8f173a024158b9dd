//! Registry of record matchers
//!
//! Matchers live in an arena keyed by [`MatcherId`]. Tree links (parent,
//! children, aliases) are ids, so the parent back-reference never owns
//! anything. Ids are never reused: a stale id can only ever miss.
//!
//! Adding a definition happens in two phases. [`plan_tree`] normalizes and
//! compiles the whole definition tree without touching the registry, and
//! [`Registry::commit`] inserts the finished plan. A configuration error
//! therefore leaves the registry exactly as it was.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::RouterOptions;
use crate::error::ConfigError;
use crate::params::Params;
use crate::record::{resolve_record_path, RouteDefinition, RouteRecord};
use crate::route::{compile_pattern, CompiledMatcher, ParamKey};

/// Stable identifier of a registered matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatcherId(u64);

/// A route record paired with its compiled matcher and tree links
#[derive(Debug, Clone)]
pub struct RecordMatcher {
    id: MatcherId,
    record: Arc<RouteRecord>,
    matcher: Arc<CompiledMatcher>,
    parent: Option<MatcherId>,
    children: Vec<MatcherId>,
    aliases: Vec<MatcherId>,
    alias_of: Option<MatcherId>,
}

impl RecordMatcher {
    pub fn id(&self) -> MatcherId {
        self.id
    }

    pub fn record(&self) -> &Arc<RouteRecord> {
        &self.record
    }

    pub fn matcher(&self) -> &CompiledMatcher {
        &self.matcher
    }

    pub fn parent(&self) -> Option<MatcherId> {
        self.parent
    }

    /// Ids of child matchers created under this one
    ///
    /// Children removed individually may still be listed; resolve ids
    /// through the router, which ignores ids that are gone.
    pub fn children(&self) -> &[MatcherId] {
        &self.children
    }

    /// Ids of alias matchers standing for this one
    pub fn aliases(&self) -> &[MatcherId] {
        &self.aliases
    }

    pub fn alias_of(&self) -> Option<MatcherId> {
        self.alias_of
    }

    pub fn is_alias(&self) -> bool {
        self.alias_of.is_some()
    }
}

// ============================================================================
// Planning (pure)
// ============================================================================

/// A normalized, compiled definition tree ready to be committed
#[derive(Debug)]
pub(crate) struct PlannedRoute {
    record: RouteRecord,
    matcher: CompiledMatcher,
    children: Vec<PlannedRoute>,
    aliases: Vec<PlannedRoute>,
}

/// What a child needs to know about the route it is nested under
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParentContext<'a> {
    pub path: &'a str,
    pub keys: &'a [ParamKey],
}

impl<'a> From<&'a RecordMatcher> for ParentContext<'a> {
    fn from(entry: &'a RecordMatcher) -> Self {
        Self {
            path: entry.matcher.pattern(),
            keys: entry.matcher.keys(),
        }
    }
}

impl PlannedRoute {
    /// Names that will enter the name index, i.e. outside alias subtrees
    pub(crate) fn indexed_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_indexed_names(&mut names);
        names
    }

    fn collect_indexed_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        if let Some(name) = self.record.name.as_deref() {
            names.push(name);
        }
        for child in &self.children {
            child.collect_indexed_names(names);
        }
    }

    pub(crate) fn path(&self) -> &str {
        &self.record.path
    }
}

/// Plans a whole definition tree attached under `parent`
pub(crate) fn plan_tree(
    definition: &RouteDefinition,
    parent: Option<ParentContext<'_>>,
    options: &RouterOptions,
) -> Result<PlannedRoute, ConfigError> {
    let planned = plan_route(definition, parent, options)?;
    ensure_unique_names(&planned)?;
    Ok(planned)
}

/// Normalizes and compiles a definition, its aliases and its children
fn plan_route(
    definition: &RouteDefinition,
    parent: Option<ParentContext<'_>>,
    options: &RouterOptions,
) -> Result<PlannedRoute, ConfigError> {
    let mut primary = plan_variant(definition, &definition.path, parent, options)?;

    for alias in &definition.alias {
        let planned = plan_variant(definition, alias, parent, options)?;
        ensure_same_params(&primary, &planned)?;
        primary.aliases.push(planned);
    }

    Ok(primary)
}

/// Plans one path variant (the primary path or one alias) of a definition
fn plan_variant(
    definition: &RouteDefinition,
    raw_path: &str,
    parent: Option<ParentContext<'_>>,
    options: &RouterOptions,
) -> Result<PlannedRoute, ConfigError> {
    let path = resolve_record_path(raw_path, parent.map(|p| p.path));
    let matcher = compile_pattern(&path, options.pattern_options(definition))?;

    if let Some(parent) = parent.filter(|_| raw_path.starts_with('/')) {
        ensure_parent_params(parent, &matcher)?;
    }

    let context = ParentContext {
        path: matcher.pattern(),
        keys: matcher.keys(),
    };
    let children = definition
        .children
        .iter()
        .map(|child| plan_route(child, Some(context), options))
        .collect::<Result<Vec<_>, _>>()?;

    let record = RouteRecord::from_definition(definition, matcher.pattern().to_string());
    Ok(PlannedRoute {
        record,
        matcher,
        children,
        aliases: Vec::new(),
    })
}

fn key_set(keys: &[ParamKey]) -> HashSet<&ParamKey> {
    keys.iter().collect()
}

fn ensure_same_params(primary: &PlannedRoute, alias: &PlannedRoute) -> Result<(), ConfigError> {
    if key_set(primary.matcher.keys()) == key_set(alias.matcher.keys()) {
        return Ok(());
    }
    Err(ConfigError::record(
        alias.path(),
        format!(
            "alias must declare exactly the same params as `{}`",
            primary.path()
        ),
    ))
}

fn ensure_parent_params(
    parent: ParentContext<'_>,
    matcher: &CompiledMatcher,
) -> Result<(), ConfigError> {
    match parent
        .keys
        .iter()
        .find(|key| !matcher.keys().iter().any(|own| own.name == key.name))
    {
        None => Ok(()),
        Some(missing) => Err(ConfigError::record(
            matcher.pattern(),
            format!(
                "absolute nested path must include param `{}` of parent `{}`",
                missing.name, parent.path
            ),
        )),
    }
}

/// A single definition tree may not use a name twice
fn ensure_unique_names(planned: &PlannedRoute) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in planned.indexed_names() {
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateName {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

// ============================================================================
// Registry
// ============================================================================

/// Score-ordered matchers plus the name index
#[derive(Debug, Clone, Default)]
pub(crate) struct Registry {
    matchers: HashMap<MatcherId, RecordMatcher>,
    ordered: Vec<MatcherId>,
    by_name: HashMap<String, MatcherId>,
    next_id: u64,
}

impl Registry {
    pub(crate) fn get(&self, id: MatcherId) -> Option<&RecordMatcher> {
        self.matchers.get(&id)
    }

    pub(crate) fn get_by_name(&self, name: &str) -> Option<&RecordMatcher> {
        self.by_name.get(name).and_then(|id| self.matchers.get(id))
    }

    pub(crate) fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Matchers in descending specificity
    pub(crate) fn ordered(&self) -> impl Iterator<Item = &RecordMatcher> + '_ {
        self.ordered.iter().filter_map(|id| self.matchers.get(id))
    }

    /// Walks from `id` up to its root, starting with `id` itself
    pub(crate) fn ancestors(&self, id: MatcherId) -> Ancestors<'_> {
        Ancestors {
            registry: self,
            current: Some(id),
        }
    }

    /// Whether removing `root` would also remove `target`
    ///
    /// Follows the same children and alias links as [`Registry::remove`].
    /// Stale ids left in children lists are skipped.
    pub(crate) fn removal_reaches(&self, root: MatcherId, target: MatcherId) -> bool {
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            if id == target {
                return true;
            }
            if let Some(entry) = self.matchers.get(&id) {
                pending.extend(entry.children.iter().chain(&entry.aliases).copied());
            }
        }
        false
    }

    /// First matcher in priority order that recognizes `path`
    ///
    /// The ordered list is sorted by specificity, so the first hit is the
    /// best one and the scan stops there.
    pub(crate) fn find_by_path(&self, path: &str) -> Option<(&RecordMatcher, Params)> {
        self.ordered().find_map(|entry| {
            trace!("Trying {} against {}", entry.matcher.pattern(), path);
            entry.matcher.recognize(path).map(|params| (entry, params))
        })
    }

    fn allocate_id(&mut self) -> MatcherId {
        let id = MatcherId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Inserts a planned tree under `parent`, returning the root's id
    pub(crate) fn commit(&mut self, planned: PlannedRoute, parent: Option<MatcherId>) -> MatcherId {
        self.commit_node(planned, parent, None)
    }

    fn commit_node(
        &mut self,
        planned: PlannedRoute,
        parent: Option<MatcherId>,
        original: Option<MatcherId>,
    ) -> MatcherId {
        let PlannedRoute {
            mut record,
            matcher,
            children,
            aliases,
        } = planned;

        let id = self.allocate_id();
        record.parent = parent
            .and_then(|p| self.matchers.get(&p))
            .map(|entry| Arc::downgrade(&entry.record));
        record.alias_of = original
            .and_then(|o| self.matchers.get(&o))
            .map(|entry| Arc::downgrade(&entry.record));

        self.insert(RecordMatcher {
            id,
            record: Arc::new(record),
            matcher: Arc::new(matcher),
            parent,
            children: Vec::new(),
            aliases: Vec::new(),
            alias_of: original,
        });

        // The alias of a child hangs off that child, not off a primary parent.
        if let Some(parent_entry) = parent.and_then(|p| self.matchers.get_mut(&p)) {
            if original.is_none() || parent_entry.alias_of.is_some() {
                parent_entry.children.push(id);
            }
        }
        if let Some(original_entry) = original.and_then(|o| self.matchers.get_mut(&o)) {
            original_entry.aliases.push(id);
        }

        let primary = original.unwrap_or(id);
        for (index, child) in children.into_iter().enumerate() {
            let child_original = original
                .and_then(|o| self.matchers.get(&o))
                .and_then(|entry| entry.children.get(index).copied());
            self.commit_node(child, Some(id), child_original);
        }
        for alias in aliases {
            self.commit_node(alias, parent, Some(primary));
        }

        id
    }

    /// Places a matcher at the first position whose score is not higher
    fn insert(&mut self, entry: RecordMatcher) {
        let score = entry.matcher.score();
        let position = self
            .ordered
            .iter()
            .position(|other| {
                self.matchers
                    .get(other)
                    .is_some_and(|existing| existing.matcher.score() <= score)
            })
            .unwrap_or(self.ordered.len());

        debug!(
            "Adding route {} (score {}) at position {}",
            entry.matcher.pattern(),
            score,
            position
        );

        self.ordered.insert(position, entry.id);
        if let (Some(name), false) = (entry.record.name.as_ref(), entry.is_alias()) {
            self.by_name.insert(name.clone(), entry.id);
        }
        self.matchers.insert(entry.id, entry);
    }

    /// Removes a matcher and, recursively, its children and aliases
    ///
    /// The parent's children list is left as is. Returns `false` when the
    /// id is not registered.
    pub(crate) fn remove(&mut self, id: MatcherId) -> bool {
        let Some(entry) = self.matchers.remove(&id) else {
            return false;
        };

        debug!("Removing route {}", entry.matcher.pattern());
        self.ordered.retain(|other| *other != id);
        if let Some(name) = entry.record.name.as_deref() {
            if self.by_name.get(name) == Some(&id) {
                self.by_name.remove(name);
            }
        }

        for child in entry.children {
            self.remove(child);
        }
        for alias in entry.aliases {
            self.remove(alias);
        }
        true
    }

    pub(crate) fn clear(&mut self) {
        self.matchers.clear();
        self.ordered.clear();
        self.by_name.clear();
    }
}

/// Iterator from a matcher up through its parents to the root
///
/// For a leaf three levels deep, yields leaf → parent → root.
pub(crate) struct Ancestors<'a> {
    registry: &'a Registry,
    current: Option<MatcherId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a RecordMatcher;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.registry.get(self.current?)?;
        self.current = entry.parent;
        Some(entry)
    }
}
