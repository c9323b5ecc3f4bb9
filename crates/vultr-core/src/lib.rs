//! # vultr-core
//!
//! Core types and the request dispatcher for the Vultr v1 REST API.
//!
//! This crate provides the error taxonomy, configuration, typed identifiers and
//! the transport layer that every API operation goes through.
//!
//! ## Modules
//!
//! - [`error`] - Error types and HTTP status code mapping
//! - [`config`] - API credential and endpoint configuration
//! - [`ids`] - Strongly-typed resource identifiers
//! - [`query`] - Request parameter mapping
//! - [`client`] - Request dispatcher and HTTP transport

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod ids;
pub mod query;

// Re-export commonly used types
pub use client::{Dispatcher, DispatcherBuilder, Outcome, ResultShape, Verb};
pub use config::{Credential, VultrConfig};
pub use error::{Error, Result};
pub use query::{ParamValue, RequestParams};
