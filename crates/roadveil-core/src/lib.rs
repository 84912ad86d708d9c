//! Shared foundation for the roadveil privacy filter.
//!
//! This crate carries the pieces every other roadveil crate agrees on:
//!
//! - The error taxonomy ([`error`])
//! - The flat property-map configuration format and its strongly-typed
//!   counterpart [`config::PrivacyConfig`]
//! - The processing [`types::Verdict`] and the closed road-classification
//!   set [`types::WayType`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{IdRedactionPolicy, PrivacyConfig, PropertyMap};
pub use error::{ConfigError, MapError, Result, RoadveilError};
pub use types::{Verdict, WayType};
