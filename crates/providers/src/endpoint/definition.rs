//! Declarative endpoint tables.

/// HTTP verb of an endpoint, plus `Ws` for streaming endpoints whose URL is
/// handed to a websocket client instead of the HTTP transport.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Ws,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Ws => "WS",
        }
    }

    /// Whether leftover parameters travel in a JSON body rather than the query.
    pub fn carries_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named operation of a provider.
///
/// Every `{placeholder}` in `path` must also be listed in `required`.
#[derive(Debug)]
pub struct EndpointDefinition {
    pub name: &'static str,
    pub path: &'static str,
    pub method: HttpMethod,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub description: &'static str,
    /// Sample response body, also served in demo mode.
    pub example_response: Option<&'static str>,
}

impl EndpointDefinition {
    /// Names of the `{placeholder}` segments in `path`, in order.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let path = self.path;
        let mut names = Vec::new();
        let mut rest = path;
        let mut offset = 0;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}') else {
                break;
            };
            let start = offset + open + 1;
            let end = offset + open + close;
            names.push(&path[start..end]);
            offset = end + 1;
            rest = &path[offset..];
        }
        names
    }

    /// Whether `param` is listed as required or optional.
    pub fn accepts(&self, param: &str) -> bool {
        self.required.contains(&param) || self.optional.contains(&param)
    }
}

/// Where a provider expects its credential.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthPlacement {
    /// No credential (session-based local gateway).
    None,
    /// Query parameter with the given name (`apikey`, `access_key`, `token`).
    QueryParam(&'static str),
    /// `Authorization: Bearer <token>`.
    Bearer,
    /// Key and secret sent in two named headers.
    Headers {
        key: &'static str,
        secret: &'static str,
    },
}

/// What happens to parameters a definition does not list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamPolicy {
    /// Unlisted parameters are dropped.
    Declared,
    /// Unlisted parameters are forwarded as-is.
    PassThrough,
}

/// The endpoint table of one provider plus how it authenticates.
#[derive(Debug)]
pub struct EndpointRegistry {
    pub provider: &'static str,
    pub endpoints: &'static [EndpointDefinition],
    pub auth: AuthPlacement,
    pub param_policy: ParamPolicy,
    /// Generic caller names mapped to the provider's own (`symbol` -> `code`).
    pub param_aliases: &'static [(&'static str, &'static str)],
    /// Headers sent with every request.
    pub static_headers: &'static [(&'static str, &'static str)],
    /// Header that must carry a fresh UUID on every request.
    pub request_id_header: Option<&'static str>,
}

impl EndpointRegistry {
    /// Look up an endpoint by name.
    pub fn get_endpoint(&self, name: &str) -> Option<&'static EndpointDefinition> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// All endpoint names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.endpoints.iter().map(|e| e.name)
    }
}
