//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (ordered route scan)
//!     → matcher.rs (method filter + path template)
//!     → Return: RouteMatch { route, cluster, values } or NoMatch
//!
//! Route Compilation (at startup):
//!     "/editor/generated/{lang}/compressed.js", "/{**catchall}"
//!     → Parse templates into segments
//!     → Bind each route to its cluster
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Declaration order decides: the templated route precedes the catch-all
//! - Literal segments compare ASCII case-insensitively
//! - A catch-all route guarantees every request matches

pub mod matcher;
pub mod router;

use thiserror::Error;

pub use matcher::{PathTemplate, RouteValues};
pub use router::{
    Cluster, Route, RouteKind, RouteMatch, Router, LANGUAGE_PARAM, PASSTHROUGH_ROUTE_ID,
    TRANSLATED_PATH, TRANSLATION_ROUTE_ID,
};

/// Errors raised while building the route table.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route template {0:?} must start with '/'")]
    MissingLeadingSlash(String),

    #[error("route template {template:?} has an invalid segment {segment:?}")]
    InvalidSegment { template: String, segment: String },

    #[error("route template {0:?} has a catch-all before its last segment")]
    CatchAllNotLast(String),

    #[error("route {route:?} references unknown cluster {cluster:?}")]
    UnknownCluster { route: String, cluster: String },

    #[error("cluster {cluster:?} has an invalid destination {address:?}: {reason}")]
    InvalidDestination {
        cluster: String,
        address: String,
        reason: String,
    },
}
