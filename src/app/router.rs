//! Source-to-gateway routing.
//!
//! A `GatewayRouter` owns a fixed binding table with one slot per [`Source`].
//! It is built once during assembly and is read-only afterwards, so it can be
//! shared across concurrent calls without locking. Selection never performs I/O
//! and never looks at anything but the request's source.

use crate::domain::source::{Routed, Source};
use crate::utils::error::{Result, ServiceError};
use std::fmt;
use std::sync::Arc;

pub struct GatewayRouter<G: ?Sized> {
    bindings: [Option<Arc<G>>; Source::COUNT],
}

impl<G: ?Sized> GatewayRouter<G> {
    pub fn builder() -> RouterBuilder<G> {
        RouterBuilder::new()
    }

    /// Returns the gateway bound to the request's source.
    pub fn select<R: Routed + ?Sized>(&self, request: &R) -> Result<&Arc<G>> {
        self.select_source(request.source())
    }

    pub fn select_source(&self, source: Source) -> Result<&Arc<G>> {
        self.bindings[source.index()]
            .as_ref()
            .ok_or_else(|| ServiceError::UnboundSource {
                source_kind: source,
            })
    }

    pub fn is_bound(&self, source: Source) -> bool {
        self.bindings[source.index()].is_some()
    }

    pub fn bound_sources(&self) -> impl Iterator<Item = Source> + '_ {
        Source::ALL
            .into_iter()
            .filter(move |source| self.is_bound(*source))
    }
}

impl<G: ?Sized> fmt::Debug for GatewayRouter<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayRouter")
            .field("bound", &self.bound_sources().collect::<Vec<_>>())
            .finish()
    }
}

pub struct RouterBuilder<G: ?Sized> {
    bindings: [Option<Arc<G>>; Source::COUNT],
    duplicate: Option<Source>,
}

impl<G: ?Sized> RouterBuilder<G> {
    fn new() -> Self {
        Self {
            bindings: std::array::from_fn(|_| None),
            duplicate: None,
        }
    }

    pub fn bind(mut self, source: Source, gateway: Arc<G>) -> Self {
        let slot = &mut self.bindings[source.index()];
        if slot.is_some() && self.duplicate.is_none() {
            self.duplicate = Some(source);
        }
        *slot = Some(gateway);
        self
    }

    /// Builds a router that serves every declared source, failing otherwise.
    pub fn build(self) -> Result<GatewayRouter<G>> {
        self.check_duplicates()?;

        let missing: Vec<Source> = Source::ALL
            .into_iter()
            .filter(|source| self.bindings[source.index()].is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ServiceError::IncompleteBindings { missing });
        }

        Ok(GatewayRouter {
            bindings: self.bindings,
        })
    }

    /// Builds a router for a deployment that intentionally serves only some sources.
    /// Selecting an unbound source later fails with `UnboundSource`.
    pub fn build_partial(self) -> Result<GatewayRouter<G>> {
        self.check_duplicates()?;

        if self.bindings.iter().all(Option::is_none) {
            return Err(ServiceError::ConfigError {
                message: "router has no gateway bindings".to_string(),
            });
        }

        for source in Source::ALL {
            if self.bindings[source.index()].is_none() {
                tracing::warn!(source = %source, "No gateway bound, requests for this source will be refused");
            }
        }

        Ok(GatewayRouter {
            bindings: self.bindings,
        })
    }

    fn check_duplicates(&self) -> Result<()> {
        match self.duplicate {
            Some(source) => Err(ServiceError::DuplicateBinding {
                source_kind: source,
            }),
            None => Ok(()),
        }
    }
}
