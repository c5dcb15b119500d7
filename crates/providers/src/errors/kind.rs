/// Tag of a failed provider call.
///
/// Callers branch on the kind rather than on the concrete [`ApiError`](super::ApiError)
/// variant when deciding what to show or whether to try again later.
///
/// | Kind | Raised when |
/// |------|-------------|
/// | `Transport` | DNS, connect or timeout failure before any response |
/// | `HttpStatus` | Response status outside `200..300` |
/// | `Decode` | Body is not JSON, or the endpoint could not be resolved |
/// | `Provider` | Well-formed JSON carrying a provider error message |
/// | `Unsupported` | The provider does not offer the operation at all |
/// | `NotImplemented` | The operation exists upstream but this client is a placeholder |
/// | `Configuration` | No credential configured and no demo fixture to fall back on |
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FailureKind {
    Transport,
    HttpStatus,
    Decode,
    Provider,
    Unsupported,
    NotImplemented,
    Configuration,
}

impl FailureKind {
    /// Short identifier used in logs and refresh reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport_error",
            Self::HttpStatus => "http_status_error",
            Self::Decode => "decode_error",
            Self::Provider => "provider_error",
            Self::Unsupported => "unsupported",
            Self::NotImplemented => "not_implemented",
            Self::Configuration => "configuration_error",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
