use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct CommitEntry {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    committer: Option<Signature>,
    #[serde(default)]
    author: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: String,
}

/// Timestamp of the most recent commit touching the published data, used as
/// the dashboard's "last updated" label.
pub async fn fetch_last_updated(
    http: &Client,
    url: &str,
    token: Option<&SecretString>,
) -> AppResult<Option<DateTime<Utc>>> {
    let mut request = http
        .get(url)
        .query(&[("per_page", "1")])
        .header(ACCEPT, "application/vnd.github+json");
    if let Some(token) = token {
        request = request.header(AUTHORIZATION, format!("token {}", token.expose_secret()));
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        warn!(target: "updates", status = status.as_u16(), "commit history request failed");
        return Err(AppError::Fetch {
            resource: url.to_string(),
            status: status.as_u16(),
        });
    }

    let commits: Vec<CommitEntry> = response.json().await?;
    let Some(latest) = commits.into_iter().next() else {
        debug!(target: "updates", "commit history is empty");
        return Ok(None);
    };
    let signature = latest
        .commit
        .committer
        .or(latest.commit.author)
        .ok_or_else(|| AppError::Config("commit entry carries no date".into()))?;
    let parsed = DateTime::parse_from_rfc3339(&signature.date)?;
    Ok(Some(parsed.with_timezone(&Utc)))
}
