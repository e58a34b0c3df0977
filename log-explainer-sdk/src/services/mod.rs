//! Service client implementations
//!
//! This module contains the explainer API client and the HTTP helpers it
//! shares with the client builder.

pub mod explainer;
pub(crate) mod common;

pub use common::UserAgent;
