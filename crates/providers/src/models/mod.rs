//! Request models shared by every provider.
//!
//! - `params` - The [`Params`] map handed to the executor and helpers to build it

mod params;

pub use params::{params, Params};

pub(crate) use params::{insert_opt, object_params, query_value};
