//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in evaluation order
//! - Bind every route to its cluster (single destination)
//! - Look up the matching route for a request line
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) ordered scan, first match wins
//! - Explicit NoMatch rather than silent default

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;
use url::Url;

use crate::routing::matcher::{PathTemplate, RouteValues};
use crate::routing::RouteError;

/// Route whose responses are translated.
pub const TRANSLATION_ROUTE_ID: &str = "translation";
/// Catch-all route forwarded untouched.
pub const PASSTHROUGH_ROUTE_ID: &str = "unmodified";
/// Template of the translated route.
pub const TRANSLATED_PATH: &str = "/editor/generated/{lang}/compressed.js";
/// Capture holding the language key.
pub const LANGUAGE_PARAM: &str = "lang";

const CATCH_ALL_PATH: &str = "/{**catchall}";

/// How the proxy treats responses on a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Buffer and rewrite the response body.
    Translated,
    /// Stream the response body unchanged.
    Passthrough,
}

/// A named upstream with exactly one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: String,
    pub destination: Url,
}

impl Cluster {
    /// Create a cluster from an absolute `http`/`https` base address.
    pub fn new(id: impl Into<String>, address: &str) -> Result<Self, RouteError> {
        let id = id.into();
        let invalid = |reason: String| RouteError::InvalidDestination {
            cluster: id.clone(),
            address: address.to_string(),
            reason,
        };

        let destination = Url::parse(address).map_err(|e| invalid(e.to_string()))?;
        if !matches!(destination.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", destination.scheme())));
        }
        if destination.cannot_be_a_base() || destination.host().is_none() {
            return Err(invalid("address has no host".to_string()));
        }

        Ok(Self { id, destination })
    }
}

/// A request-matching rule.
#[derive(Debug, Clone)]
pub struct Route {
    pub id: String,
    /// Exact method filter; `None` accepts any method.
    pub method: Option<Method>,
    pub template: PathTemplate,
    pub cluster_id: String,
    pub kind: RouteKind,
}

impl Route {
    pub fn new(
        id: impl Into<String>,
        method: Option<Method>,
        template: &str,
        cluster_id: impl Into<String>,
        kind: RouteKind,
    ) -> Result<Self, RouteError> {
        Ok(Self {
            id: id.into(),
            method,
            template: PathTemplate::parse(template)?,
            cluster_id: cluster_id.into(),
            kind,
        })
    }

    fn matches(&self, method: &Method, path: &str) -> Option<RouteValues> {
        if self.method.as_ref().is_some_and(|m| m != method) {
            return None;
        }
        self.template.match_path(path)
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub cluster: &'a Cluster,
    pub values: RouteValues,
}

impl RouteMatch<'_> {
    /// Language key captured by the translated route.
    pub fn language(&self) -> Option<&str> {
        self.values.get(LANGUAGE_PARAM)
    }
}

/// Ordered, immutable route table.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
    clusters: HashMap<String, Arc<Cluster>>,
}

impl Router {
    /// Build a router; every route must reference a known cluster.
    pub fn new(routes: Vec<Route>, clusters: Vec<Cluster>) -> Result<Self, RouteError> {
        let clusters: HashMap<String, Arc<Cluster>> = clusters
            .into_iter()
            .map(|c| (c.id.clone(), Arc::new(c)))
            .collect();

        for route in &routes {
            if !clusters.contains_key(&route.cluster_id) {
                return Err(RouteError::UnknownCluster {
                    route: route.id.clone(),
                    cluster: route.cluster_id.clone(),
                });
            }
        }

        Ok(Self { routes, clusters })
    }

    /// The translated route followed by the catch-all, both on `cluster`.
    pub fn standard(cluster: Cluster) -> Result<Self, RouteError> {
        let routes = vec![
            Route::new(
                TRANSLATION_ROUTE_ID,
                Some(Method::GET),
                TRANSLATED_PATH,
                cluster.id.clone(),
                RouteKind::Translated,
            )?,
            Route::new(
                PASSTHROUGH_ROUTE_ID,
                None,
                CATCH_ALL_PATH,
                cluster.id.clone(),
                RouteKind::Passthrough,
            )?,
        ];
        Self::new(routes, vec![cluster])
    }

    /// Find the first route matching `method` and `path`.
    pub fn match_request(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            let values = route.matches(method, path)?;
            let cluster = self.clusters.get(&route.cluster_id)?;
            Some(RouteMatch {
                route,
                cluster: cluster.as_ref(),
                values,
            })
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn cluster(&self, id: &str) -> Option<&Cluster> {
        self.clusters.get(id).map(|c| c.as_ref())
    }
}
