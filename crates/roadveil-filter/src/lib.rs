//! Per-message suppression and redaction pipeline for connected-vehicle
//! Basic Safety Messages.
//!
//! A [`BsmHandler`] judges one JSON-encoded BSM at a time: it either
//! suppresses the message (speed outside the configured interval, or
//! position outside the road-corridor geofence) or produces a redacted copy
//! with the vehicle ID replaced and configured Part II members stripped.
//!
//! # Examples
//!
//! ```
//! use roadveil_core::config::PrivacyConfig;
//! use roadveil_core::types::Verdict;
//! use roadveil_filter::BsmHandler;
//! use roadveil_geo::{BBox, Point, Quadtree};
//! use std::sync::Arc;
//!
//! let envelope = BBox::from_corners(Point::new(35.0, -85.0), Point::new(36.0, -84.0));
//! let quad = Arc::new(Quadtree::new(envelope, 5.0));
//! let mut handler = BsmHandler::new(quad, &PrivacyConfig::default());
//!
//! let verdict = handler.process(r#"{"id":"BEA10000","latitude":35.5,"longitude":-84.5,"speed":10}"#);
//! assert_eq!(verdict, Verdict::Success);
//! assert!(handler.get_json().is_some());
//! ```

pub mod bsm;
pub mod handler;
pub mod id_redactor;
pub mod part_ii;
pub mod velocity;

pub use bsm::Bsm;
pub use handler::{BsmHandler, Feature};
pub use id_redactor::IdRedactor;
pub use velocity::VelocityFilter;
