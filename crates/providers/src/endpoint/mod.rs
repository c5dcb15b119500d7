//! Endpoint registry: static per-provider tables and URL construction.
//!
//! Each provider declares an [`EndpointRegistry`] as plain data. The
//! registry resolves an operation name plus a parameter map into a
//! [`PreparedRequest`]:
//!
//! 1. Look up the [`EndpointDefinition`]
//! 2. Reject the call if a required parameter is missing
//! 3. Substitute `{placeholders}` into the path
//! 4. Filter leftover parameters according to the provider's [`ParamPolicy`]
//! 5. Serialize leftovers as a query string (GET) or JSON body (everything else)
//! 6. Apply the credential according to the provider's [`AuthPlacement`]

mod builder;
mod definition;

pub use builder::PreparedRequest;
pub use definition::{AuthPlacement, EndpointDefinition, EndpointRegistry, HttpMethod, ParamPolicy};
