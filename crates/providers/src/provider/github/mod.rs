//! GitHub provider with a read-through cache.
//!
//! Repository reads (issues, labels, milestones, ...) are cached in a
//! host-supplied [`CacheStore`] for [`DEFAULT_CACHE_TTL`] so that admin pages
//! do not burn through the REST rate limit. Writes always go to the network
//! and drop the cached issue lists of the repository they touched.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;

use crate::cache::CacheStore;
use crate::client::{DataType, ProviderCapabilities, ProviderClient, ProviderDescriptor, Wiring};
use crate::config::{ProviderConfig, SettingsStore};
use crate::endpoint::{AuthPlacement, EndpointDefinition, EndpointRegistry, HttpMethod, ParamPolicy};
use crate::errors::{ApiError, RequestResult};
use crate::models::{object_params, params, Params};
use crate::transport::{HttpTransport, ReqwestTransport};

const PROVIDER_ID: &str = "github";

/// How long a cached read stays fresh unless `github_cache_ttl` says otherwise.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Settings key holding the cache TTL in seconds.
pub const CACHE_TTL_KEY: &str = "github_cache_ttl";

/// Settings key holding the RFC 3339 time of the last full refresh.
pub const LAST_REFRESH_KEY: &str = "tradepress_github_last_refresh";

const CACHE_PREFIX: &str = "tradepress_github";

const KIND_REPOSITORY: &str = "repository";
const KIND_ISSUES: &str = "issues";
const KIND_PULLS: &str = "pulls";
const KIND_LABELS: &str = "labels";
const KIND_MILESTONES: &str = "milestones";
const KIND_COLLABORATORS: &str = "collaborators";

const CACHED_KINDS: &[&str] = &[
    KIND_REPOSITORY,
    KIND_ISSUES,
    KIND_PULLS,
    KIND_LABELS,
    KIND_MILESTONES,
    KIND_COLLABORATORS,
];

pub static ENDPOINTS: EndpointRegistry = EndpointRegistry {
    provider: PROVIDER_ID,
    auth: AuthPlacement::Bearer,
    param_policy: ParamPolicy::Declared,
    param_aliases: &[],
    static_headers: &[
        ("Accept", "application/vnd.github+json"),
        ("X-GitHub-Api-Version", "2022-11-28"),
    ],
    request_id_header: None,
    endpoints: &[
        EndpointDefinition {
            name: "repository",
            path: "/repos/{owner}/{repo}",
            method: HttpMethod::Get,
            required: &["owner", "repo"],
            optional: &[],
            description: "Repository metadata",
            example_response: Some(
                r#"{"id":1296269,"name":"tradepress","full_name":"tradepress/tradepress","private":false,"description":"Trading dashboard","open_issues_count":2,"stargazers_count":42,"default_branch":"main"}"#,
            ),
        },
        EndpointDefinition {
            name: "issues",
            path: "/repos/{owner}/{repo}/issues",
            method: HttpMethod::Get,
            required: &["owner", "repo"],
            optional: &[
                "state",
                "labels",
                "assignee",
                "since",
                "sort",
                "direction",
                "per_page",
                "page",
            ],
            description: "Issues (and pull requests) of a repository",
            example_response: Some(
                r#"[{"number":12,"title":"Add MarketStack intraday chart","state":"open","labels":[{"name":"enhancement"}],"comments":1},{"number":9,"title":"eToro demo data out of date","state":"open","labels":[{"name":"bug"}],"comments":0}]"#,
            ),
        },
        EndpointDefinition {
            name: "create_issue",
            path: "/repos/{owner}/{repo}/issues",
            method: HttpMethod::Post,
            required: &["owner", "repo", "title"],
            optional: &["body", "labels", "assignees", "milestone"],
            description: "Open an issue",
            example_response: None,
        },
        EndpointDefinition {
            name: "update_issue",
            path: "/repos/{owner}/{repo}/issues/{issue_number}",
            method: HttpMethod::Patch,
            required: &["owner", "repo", "issue_number"],
            optional: &["title", "body", "state", "labels", "assignees", "milestone"],
            description: "Edit or close an issue",
            example_response: None,
        },
        EndpointDefinition {
            name: "issue_comment",
            path: "/repos/{owner}/{repo}/issues/{issue_number}/comments",
            method: HttpMethod::Post,
            required: &["owner", "repo", "issue_number", "body"],
            optional: &[],
            description: "Comment on an issue",
            example_response: None,
        },
        EndpointDefinition {
            name: "pull_requests",
            path: "/repos/{owner}/{repo}/pulls",
            method: HttpMethod::Get,
            required: &["owner", "repo"],
            optional: &["state", "sort", "direction", "per_page", "page"],
            description: "Pull requests",
            example_response: None,
        },
        EndpointDefinition {
            name: "labels",
            path: "/repos/{owner}/{repo}/labels",
            method: HttpMethod::Get,
            required: &["owner", "repo"],
            optional: &["per_page", "page"],
            description: "Labels",
            example_response: Some(
                r#"[{"name":"bug","color":"d73a4a"},{"name":"enhancement","color":"a2eeef"}]"#,
            ),
        },
        EndpointDefinition {
            name: "milestones",
            path: "/repos/{owner}/{repo}/milestones",
            method: HttpMethod::Get,
            required: &["owner", "repo"],
            optional: &["state", "sort", "direction", "per_page", "page"],
            description: "Milestones",
            example_response: None,
        },
        EndpointDefinition {
            name: "collaborators",
            path: "/repos/{owner}/{repo}/collaborators",
            method: HttpMethod::Get,
            required: &["owner", "repo"],
            optional: &["affiliation", "per_page", "page"],
            description: "Collaborators (needs push access)",
            example_response: None,
        },
        EndpointDefinition {
            name: "rate_limit",
            path: "/rate_limit",
            method: HttpMethod::Get,
            required: &[],
            optional: &[],
            description: "Remaining request quota",
            example_response: None,
        },
    ],
};

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: PROVIDER_ID,
    name: "GitHub",
    default_base_url: "https://api.github.com",
    sandbox_base_url: None,
    encrypted_by_default: true,
    account_param: None,
    registry: &ENDPOINTS,
    capabilities: ProviderCapabilities {
        data_types: &[DataType::Repository, DataType::Issues],
        supports_trading: false,
        supports_streaming: false,
        wiring: Wiring::Full,
    },
    // GitHub reports errors with a non-2xx status and a `message` field.
    error_shapes: &[],
    default_params: &[],
    requires_credential: false,
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
    All,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// Filters for [`GithubClient::get_issues`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct IssueQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct NewIssue {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
}

/// Partial issue edit. `None` fields are left untouched.
#[derive(Clone, Debug, Default, Serialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
}

/// Outcome of [`GithubClient::refresh_all_data`], one entry per cached read.
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub outcomes: BTreeMap<&'static str, Result<(), ApiError>>,
    /// Set when at least one read succeeded and the marker was written.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.outcomes.values().all(Result::is_ok)
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.values().filter(|r| r.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &ApiError)> {
        self.outcomes
            .iter()
            .filter_map(|(kind, result)| result.as_ref().err().map(|e| (*kind, e)))
    }
}

/// Cache key for one read: `tradepress_github_{kind}_{owner}_{repo}_{md5}`,
/// where the digest covers the JSON of the extra parameters.
///
/// Owner and repository are percent-encoded with `_` escaped as `%5F`, so
/// `_` only ever separates segments.
pub fn cache_key(kind: &str, owner: &str, repo: &str, params: &Params) -> String {
    let encoded = serde_json::to_string(params).unwrap_or_default();
    format!(
        "{}{:x}",
        repo_prefix(kind, owner, repo),
        md5::compute(encoded.as_bytes())
    )
}

fn repo_prefix(kind: &str, owner: &str, repo: &str) -> String {
    format!(
        "{}_{}_{}_{}_",
        CACHE_PREFIX,
        kind,
        key_segment(owner),
        key_segment(repo)
    )
}

fn key_segment(raw: &str) -> String {
    urlencoding::encode(raw).replace('_', "%5F")
}

/// GitHub client.
pub struct GithubClient {
    inner: ProviderClient,
    cache: Arc<dyn CacheStore>,
    settings: Arc<dyn SettingsStore>,
    ttl: Duration,
}

impl GithubClient {
    pub fn new(
        config: ProviderConfig,
        transport: Arc<dyn HttpTransport>,
        cache: Arc<dyn CacheStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            inner: ProviderClient::new(&DESCRIPTOR, config, transport),
            cache,
            settings,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Client configured from `settings`, including the cache TTL.
    pub fn from_settings(settings: Arc<dyn SettingsStore>, cache: Arc<dyn CacheStore>) -> Self {
        let config = ProviderConfig::from_settings(&DESCRIPTOR, settings.as_ref());
        let ttl = settings
            .get_setting(CACHE_TTL_KEY)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL);

        Self::new(config, Arc::new(ReqwestTransport::new()), cache, settings).with_ttl(ttl)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn inner(&self) -> &ProviderClient {
        &self.inner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get_repository(
        &self,
        owner: &str,
        repo: &str,
        force_refresh: bool,
    ) -> RequestResult {
        self.cached_read(KIND_REPOSITORY, "repository", owner, repo, Params::new(), force_refresh)
            .await
    }

    pub async fn get_issues(
        &self,
        owner: &str,
        repo: &str,
        query: &IssueQuery,
        force_refresh: bool,
    ) -> RequestResult {
        let extra = object_params(query).map_err(|e| ApiError::Decode {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })?;
        self.cached_read(KIND_ISSUES, "issues", owner, repo, extra, force_refresh)
            .await
    }

    pub async fn get_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        state: IssueState,
        force_refresh: bool,
    ) -> RequestResult {
        let extra = params([("state", state.as_str())]);
        self.cached_read(KIND_PULLS, "pull_requests", owner, repo, extra, force_refresh)
            .await
    }

    pub async fn get_labels(&self, owner: &str, repo: &str, force_refresh: bool) -> RequestResult {
        self.cached_read(KIND_LABELS, "labels", owner, repo, Params::new(), force_refresh)
            .await
    }

    pub async fn get_milestones(
        &self,
        owner: &str,
        repo: &str,
        state: IssueState,
        force_refresh: bool,
    ) -> RequestResult {
        let extra = params([("state", state.as_str())]);
        self.cached_read(KIND_MILESTONES, "milestones", owner, repo, extra, force_refresh)
            .await
    }

    pub async fn get_collaborators(
        &self,
        owner: &str,
        repo: &str,
        force_refresh: bool,
    ) -> RequestResult {
        self.cached_read(
            KIND_COLLABORATORS,
            "collaborators",
            owner,
            repo,
            Params::new(),
            force_refresh,
        )
        .await
    }

    pub async fn create_issue(&self, owner: &str, repo: &str, issue: &NewIssue) -> RequestResult {
        let p = self.write_params(owner, repo, issue)?;
        let created = self.inner.execute("create_issue", p).await?;
        self.invalidate(KIND_ISSUES, owner, repo);
        Ok(created)
    }

    pub async fn update_issue(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        update: &IssueUpdate,
    ) -> RequestResult {
        let mut p = self.write_params(owner, repo, update)?;
        p.insert("issue_number".to_string(), number.into());
        let updated = self.inner.execute("update_issue", p).await?;
        self.invalidate(KIND_ISSUES, owner, repo);
        Ok(updated)
    }

    pub async fn add_issue_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> RequestResult {
        let mut p = params([("owner", owner), ("repo", repo), ("body", body)]);
        p.insert("issue_number".to_string(), number.into());
        let comment = self.inner.execute("issue_comment", p).await?;
        self.invalidate(KIND_ISSUES, owner, repo);
        Ok(comment)
    }

    /// Drop every cached read for `owner/repo`. Returns the number of entries removed.
    pub fn clear_cache(&self, owner: &str, repo: &str) -> usize {
        let removed: usize = CACHED_KINDS
            .iter()
            .map(|kind| self.cache.delete_prefix(&repo_prefix(kind, owner, repo)))
            .sum();
        info!("Cleared {} cached GitHub entries for {}/{}", removed, owner, repo);
        removed
    }

    /// Re-run every cached read for `owner/repo` bypassing the cache.
    ///
    /// The last-refresh marker is written when at least one read succeeds.
    pub async fn refresh_all_data(&self, owner: &str, repo: &str) -> RefreshReport {
        let mut report = RefreshReport::default();

        let outcomes: [(&'static str, RequestResult); 6] = [
            (KIND_REPOSITORY, self.get_repository(owner, repo, true).await),
            (
                KIND_ISSUES,
                self.get_issues(owner, repo, &IssueQuery::default(), true).await,
            ),
            (
                KIND_PULLS,
                self.get_pull_requests(owner, repo, IssueState::Open, true).await,
            ),
            (KIND_LABELS, self.get_labels(owner, repo, true).await),
            (
                KIND_MILESTONES,
                self.get_milestones(owner, repo, IssueState::Open, true).await,
            ),
            (KIND_COLLABORATORS, self.get_collaborators(owner, repo, true).await),
        ];

        for (kind, result) in outcomes {
            if let Err(e) = &result {
                warn!("GitHub refresh of {} for {}/{} failed: {}", kind, owner, repo, e);
            }
            report.outcomes.insert(kind, result.map(|_| ()));
        }

        if report.succeeded() > 0 {
            let now = Utc::now();
            self.settings.set_setting(LAST_REFRESH_KEY, &now.to_rfc3339());
            report.refreshed_at = Some(now);
        }

        info!(
            "GitHub refresh for {}/{}: {}/{} reads succeeded",
            owner,
            repo,
            report.succeeded(),
            report.outcomes.len()
        );
        report
    }

    /// Time of the last successful [`refresh_all_data`](Self::refresh_all_data).
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        let raw = self.settings.get_setting(LAST_REFRESH_KEY)?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| warn!("Ignoring malformed {}: {}", LAST_REFRESH_KEY, e))
            .ok()
    }

    async fn cached_read(
        &self,
        kind: &str,
        endpoint: &str,
        owner: &str,
        repo: &str,
        extra: Params,
        force_refresh: bool,
    ) -> RequestResult {
        let key = cache_key(kind, owner, repo, &extra);

        if !force_refresh {
            if let Some(value) = self.cache.get(&key) {
                debug!("GitHub cache hit: {}", key);
                return Ok(value);
            }
        }

        let mut p = extra;
        p.insert("owner".to_string(), owner.into());
        p.insert("repo".to_string(), repo.into());

        let value = self.inner.execute(endpoint, p).await?;
        if !self.inner.uses_demo_data() {
            self.cache.set(&key, value.clone(), self.ttl);
        }
        Ok(value)
    }

    fn write_params<T: Serialize>(
        &self,
        owner: &str,
        repo: &str,
        payload: &T,
    ) -> Result<Params, ApiError> {
        let mut p = object_params(payload).map_err(|e| ApiError::Decode {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })?;
        p.insert("owner".to_string(), owner.into());
        p.insert("repo".to_string(), repo.into());
        Ok(p)
    }

    fn invalidate(&self, kind: &str, owner: &str, repo: &str) {
        let removed = self.cache.delete_prefix(&repo_prefix(kind, owner, repo));
        debug!("Dropped {} cached GitHub {} for {}/{}", removed, kind, owner, repo);
    }
}
