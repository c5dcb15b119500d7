use super::capabilities::ProviderCapabilities;
use super::error_shape::ErrorShape;
use crate::endpoint::EndpointRegistry;

/// Static description of one provider: where it lives, how it
/// authenticates, what it offers and how it reports errors.
///
/// Each provider module exposes one of these as `DESCRIPTOR`.
#[derive(Debug)]
pub struct ProviderDescriptor {
    /// Lowercase identifier, also the settings key prefix (`fmp_api_key`).
    pub id: &'static str,
    pub name: &'static str,
    pub default_base_url: &'static str,
    pub sandbox_base_url: Option<&'static str>,
    /// Default for `{id}_use_https` when the setting is absent.
    pub encrypted_by_default: bool,
    /// Parameter name the configured account id is injected under.
    pub account_param: Option<&'static str>,
    pub registry: &'static EndpointRegistry,
    pub capabilities: ProviderCapabilities,
    pub error_shapes: &'static [ErrorShape],
    /// Parameters merged under every call (pagination defaults).
    pub default_params: &'static [(&'static str, &'static str)],
    /// Without a credential the client serves demo fixtures instead of calling out.
    pub requires_credential: bool,
}
