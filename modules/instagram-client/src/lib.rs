pub mod error;
pub mod retry;
pub mod types;

pub use error::{InstagramError, Result};
pub use retry::{Pacer, RetryPolicy, TokioPacer};
pub use types::{SessionCookies, ShortcodeMedia, UserProfile};

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, REFERER, USER_AGENT};
use serde::Serialize;
use tracing::{debug, info, warn};

use types::{CommentQueryResponse, ProfileResponse};

const FALLBACK_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// Endpoint identifiers and header pools, injected at construction so tests
/// can point the client at deterministic fixtures. Defaults mirror the
/// public web endpoints.
#[derive(Debug, Clone)]
pub struct InstagramConfig {
    pub graphql_endpoint: String,
    pub profile_endpoint: String,
    /// Opaque query-template identifier for the comment query.
    pub query_hash: String,
    /// Application identifier required by the profile endpoint.
    pub app_id: String,
    pub referer: String,
    /// Small fixed pool for fingerprint variation. Rotation only, nothing
    /// cryptographic.
    pub user_agents: Vec<String>,
    /// First-page comment count. No pagination cursor is ever sent, so
    /// commenters beyond this page are a documented completeness bound.
    pub comments_per_post: u32,
    pub comment_timeout: Duration,
    pub profile_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            graphql_endpoint: "https://www.instagram.com/graphql/query".to_string(),
            profile_endpoint: "https://i.instagram.com/api/v1/users/web_profile_info/"
                .to_string(),
            query_hash: "97b41c52301f77ce508f55e66d17620e".to_string(),
            app_id: "936619743392459".to_string(),
            referer: "https://www.instagram.com/".to_string(),
            user_agents: vec![
                FALLBACK_USER_AGENT.to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36"
                    .to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Firefox/115.0"
                    .to_string(),
            ],
            comments_per_post: 50,
            comment_timeout: Duration::from_secs(60),
            profile_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Extract the shortcode from a full post URL, or pass a bare shortcode
/// through unchanged. The shortcode is the segment between `/p/` and the
/// next `/`.
pub fn shortcode_from(url_or_shortcode: &str) -> &str {
    match url_or_shortcode.rsplit_once("/p/") {
        Some((_, rest)) => rest.split('/').next().unwrap_or(rest),
        None => url_or_shortcode,
    }
}

/// The endpoint expects the variables blob with exactly this field order.
#[derive(Serialize)]
struct CommentVariables<'a> {
    shortcode: &'a str,
    first: u32,
    after: Option<&'a str>,
}

pub struct InstagramClient {
    http: reqwest::Client,
    config: InstagramConfig,
    session: SessionCookies,
    pacer: Arc<dyn Pacer>,
}

impl InstagramClient {
    pub fn new(config: InstagramConfig, session: SessionCookies) -> Self {
        Self::with_pacer(config, session, Arc::new(TokioPacer))
    }

    pub fn with_pacer(
        config: InstagramConfig,
        session: SessionCookies,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            session,
            pacer,
        }
    }

    fn random_user_agent(&self) -> &str {
        let pool = &self.config.user_agents;
        if pool.is_empty() {
            return FALLBACK_USER_AGENT;
        }
        &pool[rand::rng().random_range(0..pool.len())]
    }

    /// Fetch a post's first page of comments. Exactly one attempt — a failed
    /// post is skipped, not retried.
    pub async fn fetch_post_comments(&self, url_or_shortcode: &str) -> Option<ShortcodeMedia> {
        let shortcode = shortcode_from(url_or_shortcode);
        info!(shortcode, "Fetching post comments");

        match self.try_fetch_post(shortcode).await {
            Ok(Some(media)) => Some(media),
            Ok(None) => {
                warn!(shortcode, "Response carried no shortcode_media");
                None
            }
            Err(err) => {
                warn!(shortcode, error = %err, "Comment query failed");
                None
            }
        }
    }

    async fn try_fetch_post(&self, shortcode: &str) -> Result<Option<ShortcodeMedia>> {
        let variables = serde_json::to_string(&CommentVariables {
            shortcode,
            first: self.config.comments_per_post,
            after: None,
        })
        .map_err(|e| InstagramError::Malformed(e.to_string()))?;

        let encoded: String = url::form_urlencoded::byte_serialize(variables.as_bytes()).collect();
        let body = format!("query_hash={}&variables={}", self.config.query_hash, encoded);

        let mut req = self
            .http
            .post(&self.config.graphql_endpoint)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(USER_AGENT, self.random_user_agent())
            .timeout(self.config.comment_timeout)
            .body(body);
        if !self.session.is_empty() {
            req = req.header(COOKIE, self.session.header_value());
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(InstagramError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        let envelope: CommentQueryResponse =
            serde_json::from_str(&text).map_err(|e| InstagramError::Malformed(e.to_string()))?;
        Ok(envelope.data.shortcode_media)
    }

    /// Fetch a commenter's public profile, retrying transient failures with
    /// randomized backoff. Exhaustion yields `None` — the caller moves on to
    /// the next commenter.
    pub async fn fetch_profile(&self, username: &str) -> Option<UserProfile> {
        info!(username, "Fetching profile");

        let result = retry::with_retry(&self.config.retry, self.pacer.as_ref(), username, || {
            self.try_fetch_profile(username)
        })
        .await;

        match result {
            Some(Some(user)) => {
                debug!(username, bio_len = user.biography.len(), "Profile fetched");
                Some(user)
            }
            // A 200 without a user object is "no data", not a transient
            // failure — don't burn retries on it.
            Some(None) => {
                warn!(username, "Profile response carried no user object");
                None
            }
            None => None,
        }
    }

    async fn try_fetch_profile(&self, username: &str) -> Result<Option<UserProfile>> {
        let mut req = self
            .http
            .get(&self.config.profile_endpoint)
            .query(&[("username", username)])
            .header(USER_AGENT, self.random_user_agent())
            .header("x-ig-app-id", &self.config.app_id)
            .header(ACCEPT, "application/json")
            .header(REFERER, &self.config.referer)
            .timeout(self.config.profile_timeout);
        if !self.session.is_empty() {
            req = req.header(COOKIE, self.session.header_value());
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(InstagramError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        let envelope: ProfileResponse =
            serde_json::from_str(&text).map_err(|e| InstagramError::Malformed(e.to_string()))?;
        Ok(envelope.data.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcode_from_full_post_url() {
        assert_eq!(
            shortcode_from("https://www.instagram.com/p/Cxyz123/"),
            "Cxyz123"
        );
    }

    #[test]
    fn shortcode_from_url_with_trailing_path() {
        assert_eq!(
            shortcode_from("https://www.instagram.com/p/Cxyz123/comments/"),
            "Cxyz123"
        );
    }

    #[test]
    fn bare_shortcode_passes_through() {
        assert_eq!(shortcode_from("Cxyz123"), "Cxyz123");
    }

    #[test]
    fn comment_variables_preserve_wire_field_order() {
        let variables = serde_json::to_string(&CommentVariables {
            shortcode: "Cxyz123",
            first: 50,
            after: None,
        })
        .unwrap();
        assert_eq!(
            variables,
            r#"{"shortcode":"Cxyz123","first":50,"after":null}"#
        );
    }

    #[test]
    fn variables_urlencode_matches_form_encoding() {
        let encoded: String =
            url::form_urlencoded::byte_serialize(r#"{"shortcode":"abc","first":50,"after":null}"#.as_bytes())
                .collect();
        assert_eq!(
            encoded,
            "%7B%22shortcode%22%3A%22abc%22%2C%22first%22%3A50%2C%22after%22%3Anull%7D"
        );
    }
}
