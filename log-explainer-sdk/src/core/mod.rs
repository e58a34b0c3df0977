//! Core abstractions for the Log Explainer SDK
//!
//! This module provides the trait interfaces shared by clients and front ends:
//!
//! - `ServiceClient`: The base trait for service clients
//! - `SessionObserver`: Receives session updates while an analysis runs
//! - `ClientBuilder`: Builder pattern for creating clients

pub mod builder;
pub use builder::ClientBuilder;

use async_trait::async_trait;

use crate::error::Result;
use crate::session::SessionUpdate;

/// Base trait for all service clients
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// The client name/identifier
    fn name(&self) -> &str;

    /// The base URL for the service
    fn base_url(&self) -> &str;

    /// Client version
    fn version(&self) -> &str;

    /// Health check for the service
    async fn health_check(&self) -> Result<bool>;
}

/// Receives every session change in the order it happened
#[cfg_attr(test, mockall::automock)]
pub trait SessionObserver: Send {
    fn on_update(&mut self, update: &SessionUpdate);
}

/// Observer that ignores all updates
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_update(&mut self, _update: &SessionUpdate) {}
}

/// Closures can observe a session directly
impl<F> SessionObserver for F
where
    F: FnMut(&SessionUpdate) + Send,
{
    fn on_update(&mut self, update: &SessionUpdate) {
        self(update)
    }
}
