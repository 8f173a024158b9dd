//! Router configuration and declarative route tables
//!
//! A route table can be written in TOML:
//!
//! ```toml
//! [options]
//! case_insensitive = true
//! duplicate_names = "reject"
//!
//! [[routes]]
//! path = "/users/:id"
//! name = "user"
//! component = "UserView"
//! alias = "/u/:id"
//!
//! [[routes.children]]
//! path = "posts"
//! name = "user.posts"
//! ```
//!
//! or the equivalent JSON, and turned into a router with
//! [`Router::from_table`](crate::Router::from_table).

use serde::Deserialize;

use crate::error::TableError;
use crate::record::RouteDefinition;
use crate::route::PatternOptions;

/// What happens when a route is added under a name that is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateNamePolicy {
    /// Remove the earlier route (and its children and aliases) first
    #[default]
    Replace,
    /// Fail with a configuration error
    Reject,
}

/// Router-wide settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterOptions {
    /// Match static text and constraints ignoring case
    pub case_insensitive: bool,
    /// Treat a trailing slash as significant
    pub strict: bool,
    pub duplicate_names: DuplicateNamePolicy,
}

impl RouterOptions {
    /// Pattern options for one definition, honoring its overrides
    pub(crate) fn pattern_options(&self, definition: &RouteDefinition) -> PatternOptions {
        PatternOptions {
            case_insensitive: definition.case_insensitive.unwrap_or(self.case_insensitive),
            strict: definition.strict.unwrap_or(self.strict),
        }
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_duplicate_names(mut self, policy: DuplicateNamePolicy) -> Self {
        self.duplicate_names = policy;
        self
    }
}

/// A declarative set of routes plus router options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    pub options: RouterOptions,
    pub routes: Vec<RouteDefinition>,
}

impl RouteTable {
    /// Parses a table from TOML text
    pub fn from_toml_str(source: &str) -> Result<Self, TableError> {
        Ok(toml::from_str(source)?)
    }

    /// Parses a table from JSON text
    pub fn from_json_str(source: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RouterOptions::default();
        assert!(!options.case_insensitive);
        assert!(!options.strict);
        assert_eq!(options.duplicate_names, DuplicateNamePolicy::Replace);
    }

    #[test]
    fn test_definition_overrides_router_options() {
        let options = RouterOptions::default().with_strict(true);
        let def = RouteDefinition::new("/a").with_strict(false).with_case_insensitive(true);
        let pattern = options.pattern_options(&def);
        assert!(!pattern.strict);
        assert!(pattern.case_insensitive);

        let pattern = options.pattern_options(&RouteDefinition::new("/a"));
        assert!(pattern.strict);
    }

    #[test]
    fn test_toml_table() {
        let table = RouteTable::from_toml_str(
            r#"
            [options]
            strict = true
            duplicate_names = "reject"

            [[routes]]
            path = "/users/:id"
            name = "user"
            alias = ["/u/:id"]

            [routes.meta]
            title = "User"

            [[routes.children]]
            path = "posts"
            "#,
        )
        .unwrap();

        assert!(table.options.strict);
        assert_eq!(table.options.duplicate_names, DuplicateNamePolicy::Reject);
        assert_eq!(table.routes.len(), 1);
        assert_eq!(table.routes[0].alias, vec!["/u/:id"]);
        assert_eq!(table.routes[0].meta["title"], "User");
        assert_eq!(table.routes[0].children[0].path, "posts");
    }

    #[test]
    fn test_json_table_without_options() {
        let table = RouteTable::from_json_str(r#"{ "routes": [{ "path": "/" }] }"#).unwrap();
        assert_eq!(table.options, RouterOptions::default());
        assert_eq!(table.routes.len(), 1);
    }

    #[test]
    fn test_invalid_table_is_reported() {
        let err = RouteTable::from_toml_str("routes = 3").unwrap_err();
        assert!(matches!(err, TableError::Toml(_)));
        assert!(err.to_string().starts_with("invalid TOML route table"));
    }
}
