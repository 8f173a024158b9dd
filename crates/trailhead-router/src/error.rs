//! Error taxonomy for the matcher
//!
//! Three failure families surface to callers:
//!
//! - [`ConfigError`]: a route definition that can never work (bad pattern,
//!   duplicate name, alias/param mismatch). Raised from `add_route`.
//! - [`NotFoundError`]: a named or relative location that names nothing.
//! - [`StringifyError`]: path generation with a missing or malformed param.
//!
//! A path that matches no route is *not* an error; see
//! [`MatchedLocation::is_found`](crate::MatchedLocation::is_found).

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = RouterError> = std::result::Result<T, E>;

/// Authoring-time problems with a route definition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The path pattern could not be tokenized or compiled
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A route name is already registered and the policy rejects duplicates
    #[error("a route named `{name}` is already registered")]
    DuplicateName { name: String },

    /// The definition is internally inconsistent (aliases, nested params)
    #[error("invalid route `{path}`: {reason}")]
    InvalidRecord { path: String, reason: String },

    /// A parent given by name or id is not registered
    #[error("parent route `{parent}` is not registered")]
    UnknownParent { parent: String },
}

impl ConfigError {
    pub(crate) fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn record(path: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidRecord {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// A location that does not resolve to any registered route
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("no route named `{name}`")]
    Name { name: String },

    #[error("no route matches the current location `{path}`")]
    Path { path: String },
}

/// Path generation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StringifyError {
    #[error("missing required param `{key}` for `{pattern}`")]
    MissingParam { key: String, pattern: String },

    #[error("param `{key}` of `{pattern}` is not repeatable but a list was provided")]
    UnexpectedList { key: String, pattern: String },
}

/// Failures while reading a route table from TOML or JSON
#[derive(Debug, Error)]
pub enum TableError {
    #[error("invalid TOML route table: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON route table: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of a [`RouterError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    NotFound,
    Stringify,
    Table,
}

/// Any error produced by the router
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Stringify(#[from] StringifyError),

    #[error(transparent)]
    Table(#[from] TableError),
}

impl RouterError {
    /// Returns the error family, useful when only the category matters
    ///
    /// # Examples
    ///
    /// ```
    /// use trailhead_router::{ErrorKind, Router, RouteLocation, MatchedLocation};
    ///
    /// let router = Router::new();
    /// let err = router
    ///     .resolve(&RouteLocation::named("missing"), &MatchedLocation::start())
    ///     .unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::NotFound);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouterError::Config(_) => ErrorKind::Config,
            RouterError::NotFound(_) => ErrorKind::NotFound,
            RouterError::Stringify(_) => ErrorKind::Stringify,
            RouterError::Table(_) => ErrorKind::Table,
        }
    }
}
