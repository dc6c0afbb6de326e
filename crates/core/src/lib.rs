//! # U-Pallet Core
//!
//! Shared types for the U-Pallet online packing engine.
//!
//! This crate holds the typed boundary between the packing algorithms and
//! their callers: requests, results, errors, configuration and the small
//! amount of plane geometry both sides need. It contains no algorithms.
//!
//! ## Core Components
//!
//! - **Requests**: [`PlaceRequest`]
//! - **Results**: [`PlaceResult`], [`Placement`], [`BatchPlaceResult`], [`FailureReason`]
//! - **Geometry**: [`Rect2D`], [`Orientation`], [`OrientationMode`]
//! - **Configuration**: [`Config`]
//!
//! ## Configuration
//!
//! ```rust
//! use u_pallet_core::{Config, OrientationMode};
//!
//! let config = Config::new()
//!     .with_support_threshold(0.8)
//!     .with_orientation(OrientationMode::Any);
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod config;
pub mod error;
pub mod geometry;
pub mod request;
pub mod result;

// Re-exports
pub use config::{validate_threshold, Config, DEFAULT_EPSILON, DEFAULT_SUPPORT_THRESHOLD};
pub use error::{Error, Result};
pub use geometry::{Orientation, OrientationMode, Rect2D};
pub use request::PlaceRequest;
pub use result::{
    BatchItemResult, BatchPlaceResult, BatchSummary, FailureReason, PlaceResult, Placement,
};
