//! Utility types shared by the codec.
//!
//! This module contains fundamental types used throughout the library:
//! - [`ComponentType`] - Enum of numeric buffer widths
//! - [`SwcComponent`] / [`SwcIndex`] - Rust scalars for those widths
//! - [`Error`] / [`Result`] - Error handling

mod component;
mod error;

pub use component::*;
pub use error::*;

pub(crate) use component::{dispatch_component, dispatch_index};

/// Double precision 3-D vector used for sample positions.
pub use glam::DVec3;
