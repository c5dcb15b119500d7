//! Provider declarations and facades.
//!
//! Each submodule exposes:
//! - `ENDPOINTS`: the provider's [`EndpointRegistry`](crate::endpoint::EndpointRegistry)
//! - `DESCRIPTOR`: base URLs, auth, capabilities and error shapes
//! - A thin client with one method per operation, all delegating to
//!   [`ProviderClient`](crate::client::ProviderClient)
//!
//! Whether a provider is usable or only a placeholder is read from
//! `DESCRIPTOR.capabilities.wiring`, never inferred from call results.

pub mod alltick;
pub mod etoro;
pub mod fmp;
pub mod github;
pub mod ibkr;
pub mod iex;
pub mod marketstack;

use crate::client::ProviderDescriptor;

static CATALOG: [&ProviderDescriptor; 7] = [
    &alltick::DESCRIPTOR,
    &etoro::DESCRIPTOR,
    &fmp::DESCRIPTOR,
    &github::DESCRIPTOR,
    &ibkr::DESCRIPTOR,
    &iex::DESCRIPTOR,
    &marketstack::DESCRIPTOR,
];

/// Every known provider, ordered by id.
pub fn catalog() -> &'static [&'static ProviderDescriptor] {
    &CATALOG
}

/// Look up a provider by id (case-insensitive).
pub fn descriptor(id: &str) -> Option<&'static ProviderDescriptor> {
    CATALOG
        .iter()
        .copied()
        .find(|d| d.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::client::Wiring;
    use crate::config::{Credential, ProviderConfig, Secret};
    use crate::models::Params;
    use serde_json::Value;

    fn config(d: &ProviderDescriptor) -> ProviderConfig {
        ProviderConfig::for_provider(d).with_credential(Credential::ApiKey(Secret::new("k")))
    }

    fn full_params(required: &[&str]) -> Params {
        required.iter().map(|r| (r.to_string(), Value::from("x1"))).collect()
    }

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(catalog().len(), 7);
        assert_eq!(descriptor("FMP").map(|d| d.name), Some("Financial Modeling Prep"));
        assert!(descriptor("yahoo").is_none());

        let ids: HashSet<_> = catalog().iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), catalog().len());
        for d in catalog() {
            assert_eq!(d.id, d.registry.provider);
        }
    }

    #[test]
    fn test_only_alltick_is_placeholder() {
        let placeholders: Vec<_> = catalog()
            .iter()
            .filter(|d| d.capabilities.wiring == Wiring::Placeholder)
            .map(|d| d.id)
            .collect();
        assert_eq!(placeholders, vec!["alltick"]);
    }

    #[test]
    fn test_endpoint_names_are_unique() {
        for d in catalog() {
            let names: HashSet<_> = d.registry.names().collect();
            assert_eq!(names.len(), d.registry.endpoints.len(), "{}", d.id);
        }
    }

    #[test]
    fn test_placeholders_are_required() {
        for d in catalog() {
            for ep in d.registry.endpoints {
                for placeholder in ep.placeholders() {
                    assert!(
                        ep.required.contains(&placeholder),
                        "{}.{}: {{{}}} not required",
                        d.id,
                        ep.name,
                        placeholder
                    );
                }
            }
        }
    }

    #[test]
    fn test_full_required_params_resolve_every_placeholder() {
        for d in catalog() {
            let config = config(d);
            for ep in d.registry.endpoints {
                let url = d
                    .registry
                    .build_url(ep.name, &full_params(ep.required), &config)
                    .unwrap_or_else(|| panic!("{}.{} did not resolve", d.id, ep.name));
                assert!(!url.contains('{') && !url.contains('}'), "{}", url);
            }
        }
    }

    #[test]
    fn test_missing_any_required_param_yields_none() {
        for d in catalog() {
            let config = config(d);
            for ep in d.registry.endpoints {
                for omitted in ep.required {
                    let mut p = full_params(ep.required);
                    p.remove(*omitted);
                    assert!(
                        d.registry.build_url(ep.name, &p, &config).is_none(),
                        "{}.{} resolved without {}",
                        d.id,
                        ep.name,
                        omitted
                    );
                }
            }
        }
    }

    #[test]
    fn test_build_url_is_idempotent() {
        for d in catalog() {
            let config = config(d);
            for ep in d.registry.endpoints {
                let p = full_params(ep.required);
                assert_eq!(
                    d.registry.build_url(ep.name, &p, &config),
                    d.registry.build_url(ep.name, &p, &config)
                );
            }
        }
    }

    #[test]
    fn test_example_responses_are_json() {
        for d in catalog() {
            for ep in d.registry.endpoints {
                if let Some(fixture) = ep.example_response {
                    assert!(
                        serde_json::from_str::<Value>(fixture).is_ok(),
                        "{}.{} fixture is not JSON",
                        d.id,
                        ep.name
                    );
                }
            }
        }
    }
}
