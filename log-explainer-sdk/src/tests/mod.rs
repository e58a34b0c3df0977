//! Unit tests for the Log Explainer SDK
//!
//! This module contains tests for various components of the SDK.

pub mod client_mock_tests;
pub mod export_tests;
pub mod redact_tests;
