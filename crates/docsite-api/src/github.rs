//! GitHub entity lookup.
//!
//! Maps a `github.com` URL to a REST API call and projects the upstream
//! payload onto a small, explicitly typed summary. Upstream fields we do not
//! use are ignored; fields we rely on must be present or have a default.

use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ApiError;
use crate::state::AppState;

/// What a `github.com` URL points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GithubTarget {
    /// `github.com/{login}`: a user or an organization.
    Account { login: String },
    /// `github.com/{owner}/{repo}`.
    Repo { owner: String, repo: String },
}

impl GithubTarget {
    /// Parse a `github.com` URL. Subdomains and lookalike hosts are rejected,
    /// as is any path that is not exactly one or two segments of characters
    /// GitHub allows in account and repository names.
    pub fn from_url(url: &Url) -> Option<Self> {
        if !url.host_str()?.eq_ignore_ascii_case("github.com") {
            return None;
        }

        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        if !segments.iter().all(|s| is_github_name(s)) {
            return None;
        }
        match segments.as_slice() {
            [login] => Some(Self::Account {
                login: (*login).to_string(),
            }),
            [owner, repo] => Some(Self::Repo {
                owner: (*owner).to_string(),
                repo: (*repo).to_string(),
            }),
            _ => None,
        }
    }

    /// REST endpoint for this target under `api_base`. Segments are
    /// path-encoded.
    pub fn api_url(&self, api_base: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(api_base)?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| anyhow::anyhow!("GitHub API base cannot carry a path: {api_base}"))?;
            path.pop_if_empty();
            match self {
                Self::Account { login } => path.extend(["users", login.as_str()]),
                Self::Repo { owner, repo } => path.extend(["repos", owner.as_str(), repo.as_str()]),
            };
        }
        Ok(url)
    }
}

/// Account and repository names: ASCII alphanumerics, `-`, `_` and `.`.
fn is_github_name(segment: &str) -> bool {
    segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// `GET /repos/{owner}/{repo}` fields we use.
#[derive(Debug, Deserialize)]
struct RepoPayload {
    name: String,
    html_url: Option<String>,
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    language: Option<String>,
    owner: OwnerPayload,
}

#[derive(Debug, Deserialize)]
struct OwnerPayload {
    login: String,
    #[serde(default)]
    avatar_url: String,
}

/// `GET /users/{login}` fields we use. Organizations come back from the same
/// endpoint with `type: "Organization"`.
#[derive(Debug, Deserialize)]
struct AccountPayload {
    login: String,
    html_url: Option<String>,
    name: Option<String>,
    bio: Option<String>,
    description: Option<String>,
    #[serde(default)]
    avatar_url: String,
    #[serde(rename = "type")]
    account_type: Option<String>,
}

/// Shaped repository card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoSummary {
    pub url: String,
    pub owner: String,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub avatar: String,
}

/// Shaped user/organization card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub url: String,
    pub login: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub avatar: String,
}

/// Response body of `GET /api/github`, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GithubSummary {
    Repo(RepoSummary),
    User(AccountSummary),
    Org(AccountSummary),
}

impl GithubSummary {
    fn from_repo(payload: RepoPayload, page_url: &str) -> Self {
        Self::Repo(RepoSummary {
            url: payload.html_url.unwrap_or_else(|| page_url.to_string()),
            owner: payload.owner.login,
            repo: payload.name,
            description: payload.description,
            stars: payload.stargazers_count,
            forks: payload.forks_count,
            language: payload.language,
            avatar: payload.owner.avatar_url,
        })
    }

    fn from_account(payload: AccountPayload, page_url: &str) -> Self {
        let is_org = payload.account_type.as_deref() == Some("Organization");

        // Organizations often leave `description` empty and fill `bio` instead.
        let description = if is_org {
            payload.description.or_else(|| payload.bio.clone())
        } else {
            payload.description
        };

        let summary = AccountSummary {
            url: payload.html_url.unwrap_or_else(|| page_url.to_string()),
            login: payload.login,
            name: payload.name,
            bio: payload.bio,
            description,
            avatar: payload.avatar_url,
        };

        if is_org {
            Self::Org(summary)
        } else {
            Self::User(summary)
        }
    }
}

/// Fetch and shape the summary for `target`. No retries.
pub async fn fetch_summary(
    state: &AppState,
    target: &GithubTarget,
    page_url: &str,
) -> Result<GithubSummary, ApiError> {
    let api_url = target.api_url(&state.config.github_api_base)?;

    let mut request = state
        .github
        .get(api_url)
        .header(ACCEPT, "application/vnd.github+json")
        .header("X-GitHub-Api-Version", "2022-11-28")
        .timeout(state.config.github_timeout);
    if let Some(token) = &state.config.github_token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::GithubStatus(status));
    }

    let body = response.bytes().await?;
    let summary = match target {
        GithubTarget::Repo { .. } => {
            GithubSummary::from_repo(serde_json::from_slice(&body)?, page_url)
        }
        GithubTarget::Account { .. } => {
            GithubSummary::from_account(serde_json::from_slice(&body)?, page_url)
        }
    };

    tracing::debug!(?target, "github summary fetched");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(s: &str) -> Option<GithubTarget> {
        GithubTarget::from_url(&Url::parse(s).unwrap())
    }

    #[test]
    fn target_repo_and_account() {
        assert_eq!(
            target("https://github.com/octocat/Hello-World"),
            Some(GithubTarget::Repo {
                owner: "octocat".to_string(),
                repo: "Hello-World".to_string(),
            })
        );
        assert_eq!(
            target("https://GitHub.com/octocat/"),
            Some(GithubTarget::Account {
                login: "octocat".to_string(),
            })
        );
    }

    #[test]
    fn target_rejects_other_shapes() {
        assert_eq!(target("https://github.com/"), None);
        assert_eq!(target("https://github.com/a/b/tree/main"), None);
        assert_eq!(target("https://gist.github.com/octocat"), None);
        assert_eq!(target("https://github.com.evil.example/octocat"), None);
        assert_eq!(target("https://notgithub.com/octocat"), None);
        assert_eq!(target("https://github.com/octo%20cat"), None);
        assert_eq!(target("https://github.com/a/b%2Fc"), None);
    }

    #[test]
    fn api_url_paths() {
        let repo = GithubTarget::Repo {
            owner: "octocat".to_string(),
            repo: "Hello-World".to_string(),
        };
        assert_eq!(
            repo.api_url("https://api.github.com").unwrap().as_str(),
            "https://api.github.com/repos/octocat/Hello-World"
        );
        assert_eq!(
            repo.api_url("https://ghe.example.com/api/v3").unwrap().as_str(),
            "https://ghe.example.com/api/v3/repos/octocat/Hello-World"
        );

        let account = GithubTarget::Account {
            login: "a b?c".to_string(),
        };
        assert_eq!(
            account.api_url("https://api.github.com").unwrap().as_str(),
            "https://api.github.com/users/a%20b%3Fc"
        );
    }

    #[test]
    fn repo_summary_shape() {
        let payload: RepoPayload = serde_json::from_value(serde_json::json!({
            "name": "Hello-World",
            "html_url": "https://github.com/octocat/Hello-World",
            "description": "My first repo",
            "stargazers_count": 80,
            "forks_count": 9,
            "language": null,
            "owner": {"login": "octocat", "avatar_url": "https://avatars.example/u/1"},
            "private": false
        }))
        .unwrap();

        let summary = GithubSummary::from_repo(payload, "https://github.com/octocat/Hello-World");
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "repo",
                "url": "https://github.com/octocat/Hello-World",
                "owner": "octocat",
                "repo": "Hello-World",
                "description": "My first repo",
                "stars": 80,
                "forks": 9,
                "avatar": "https://avatars.example/u/1"
            })
        );
    }

    #[test]
    fn account_kind_from_type() {
        let user: AccountPayload = serde_json::from_value(serde_json::json!({
            "login": "octocat",
            "name": "The Octocat",
            "bio": "hi",
            "avatar_url": "a",
            "type": "User"
        }))
        .unwrap();
        match GithubSummary::from_account(user, "https://github.com/octocat") {
            GithubSummary::User(account) => {
                assert_eq!(account.url, "https://github.com/octocat");
                assert_eq!(account.bio.as_deref(), Some("hi"));
                assert_eq!(account.description, None);
            }
            other => panic!("expected user, got {other:?}"),
        }
    }

    #[test]
    fn org_description_falls_back_to_bio() {
        let org: AccountPayload = serde_json::from_value(serde_json::json!({
            "login": "github",
            "bio": "How people build software.",
            "avatar_url": "a",
            "type": "Organization"
        }))
        .unwrap();
        match GithubSummary::from_account(org, "https://github.com/github") {
            GithubSummary::Org(account) => {
                assert_eq!(account.description.as_deref(), Some("How people build software."));
            }
            other => panic!("expected org, got {other:?}"),
        }
    }

    #[test]
    fn payload_missing_required_field_rejected() {
        let result: Result<RepoPayload, _> =
            serde_json::from_value(serde_json::json!({"message": "Not Found"}));
        assert!(result.is_err());
    }
}
