//! Resolution inputs and outputs
//!
//! A [`RouteLocation`] says where to go: a concrete path, a route name with
//! params, or "here with different params". Resolving it against the
//! current [`MatchedLocation`] yields a new [`MatchedLocation`].

use std::sync::Arc;

use crate::params::Params;
use crate::record::{Meta, Redirect, RouteRecord};

/// A navigation target
#[derive(Debug, Clone, PartialEq)]
pub enum RouteLocation {
    /// A concrete path such as `/users/42`
    Path(String),
    /// A registered route name plus params
    Named { name: String, params: Params },
    /// The current route with some params replaced
    Relative { params: Params },
}

impl RouteLocation {
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::named_with(name, Params::new())
    }

    pub fn named_with(name: impl Into<String>, params: Params) -> Self {
        Self::Named {
            name: name.into(),
            params,
        }
    }

    pub fn relative(params: Params) -> Self {
        Self::Relative { params }
    }
}

impl From<&str> for RouteLocation {
    fn from(path: &str) -> Self {
        Self::path(path)
    }
}

impl From<&Redirect> for RouteLocation {
    fn from(redirect: &Redirect) -> Self {
        match redirect {
            Redirect::Path(path) => Self::path(path.clone()),
            Redirect::Named { name, params } => Self::named_with(name.clone(), params.clone()),
        }
    }
}

/// The result of resolving a location
///
/// `matched` runs from the outermost record to the leaf. An empty `matched`
/// means no route recognized the path.
#[derive(Debug, Clone, Default)]
pub struct MatchedLocation {
    pub name: Option<String>,
    pub path: String,
    pub params: Params,
    pub matched: Vec<Arc<RouteRecord>>,
    /// Meta of every matched record, shallow-merged; inner records win
    pub meta: Meta,
}

impl MatchedLocation {
    /// The location a router starts from: `/`, nothing matched
    pub fn start() -> Self {
        Self::unmatched("/")
    }

    pub(crate) fn unmatched(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn is_found(&self) -> bool {
        !self.matched.is_empty()
    }

    /// The innermost matched record
    pub fn leaf(&self) -> Option<&Arc<RouteRecord>> {
        self.matched.last()
    }

    /// Redirect declared by the innermost matched record
    pub fn redirect(&self) -> Option<RouteLocation> {
        self.leaf()
            .and_then(|record| record.redirect.as_ref())
            .map(RouteLocation::from)
    }
}

/// Shallow merge of meta from outermost to innermost
pub(crate) fn merge_meta(matched: &[Arc<RouteRecord>]) -> Meta {
    matched.iter().fold(Meta::new(), |mut merged, record| {
        merged.extend(record.meta.iter().map(|(key, value)| (key.clone(), value.clone())));
        merged
    })
}
