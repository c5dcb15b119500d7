//! Provider client layer.
//!
//! This module contains:
//! - [`ProviderDescriptor`]: static per-provider data (endpoints, auth, error shapes)
//! - [`ProviderCapabilities`]: what a provider offers and whether it is wired
//! - [`ErrorShape`]: how a provider reports errors inside a 2xx body
//! - [`ProviderClient`]: the generic executor every provider facade delegates to

mod capabilities;
mod descriptor;
mod error_shape;
mod executor;

pub use capabilities::{DataType, ProviderCapabilities, Wiring};
pub use descriptor::ProviderDescriptor;
pub use error_shape::ErrorShape;
pub use executor::ProviderClient;
