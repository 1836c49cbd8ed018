//! External collaborators: post discovery and session acquisition.
//!
//! Both run against a Browserless headless-Chrome service so the pipeline
//! itself never drives a browser. The traits are the seams — tests swap in
//! fixed lists and canned cookie bags.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use browserless_client::BrowserlessClient;
use instagram_client::{shortcode_from, SessionCookies};

const EXPLORE_TAGS_BASE: &str = "https://www.instagram.com/explore/tags/";
const HOME_URL: &str = "https://www.instagram.com/";

/// Render the hashtag exploration page, scroll `context.scrolls` times, and
/// collect every post anchor currently in the DOM.
const DISCOVER_POSTS_SCRIPT: &str = r#"
export default async function ({ page, context }) {
  await page.goto(context.url, { waitUntil: "networkidle2" });
  for (let i = 0; i < context.scrolls; i++) {
    await page.evaluate(() => window.scrollTo(0, document.body.scrollHeight));
    await new Promise((resolve) => setTimeout(resolve, 3000));
  }
  const links = await page.$$eval("a[href*='/p/']", (anchors) => anchors.map((a) => a.href));
  return { data: { url: page.url(), links }, type: "application/json" };
}
"#;

/// Open the home page with the persisted browser profile and hand back the
/// session cookie jar.
const OBTAIN_SESSION_SCRIPT: &str = r#"
export default async function ({ page, context }) {
  await page.goto(context.url, { waitUntil: "networkidle2" });
  const cookies = await page.cookies();
  return {
    data: {
      url: page.url(),
      cookies: cookies.map((c) => ({ name: c.name, value: c.value })),
    },
    type: "application/json",
  };
}
"#;

#[async_trait]
pub trait PostDiscovery: Send + Sync {
    /// Return canonical post URLs for a hashtag, deduplicated, bounded by
    /// how far the page was scrolled.
    async fn discover_posts(&self, hashtag: &str, scroll_depth: u32) -> Result<Vec<String>>;
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn obtain_session(&self) -> Result<SessionCookies>;
}

/// Invoked when a run lands on the login page. The handler gets a chance to
/// resolve the challenge out-of-band (the operator logs in through the
/// remote browser) before the collaborator retries once.
pub type ChallengeHandler = Box<dyn Fn() + Send + Sync>;

pub struct BrowserlessSession {
    client: BrowserlessClient,
    on_challenge: Option<ChallengeHandler>,
}

#[derive(Debug, Deserialize)]
struct PageLinks {
    url: String,
    #[serde(default)]
    links: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PageCookies {
    url: String,
    #[serde(default)]
    cookies: Vec<CookiePair>,
}

#[derive(Debug, Deserialize)]
struct CookiePair {
    name: String,
    value: String,
}

impl BrowserlessSession {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            client: BrowserlessClient::new(base_url, token),
            on_challenge: None,
        }
    }

    pub fn with_challenge(mut self, handler: ChallengeHandler) -> Self {
        self.on_challenge = Some(handler);
        self
    }

    fn handle_challenge(&self) -> Result<()> {
        match &self.on_challenge {
            Some(handler) => {
                warn!("Landed on the login page, invoking challenge handler");
                handler();
                Ok(())
            }
            None => bail!("login challenge encountered and no challenge handler installed"),
        }
    }
}

#[async_trait]
impl PostDiscovery for BrowserlessSession {
    async fn discover_posts(&self, hashtag: &str, scroll_depth: u32) -> Result<Vec<String>> {
        let url = hashtag_url(hashtag)?;
        let context = serde_json::json!({ "url": url, "scrolls": scroll_depth });
        info!(hashtag, scroll_depth, "Opening hashtag exploration page");

        let mut page: PageLinks = self
            .client
            .function(DISCOVER_POSTS_SCRIPT, context.clone())
            .await
            .context("Hashtag page render failed")?;

        if is_login_page(&page.url) {
            self.handle_challenge()?;
            page = self
                .client
                .function(DISCOVER_POSTS_SCRIPT, context)
                .await
                .context("Hashtag page render failed after challenge")?;
            if is_login_page(&page.url) {
                bail!("still on the login page after challenge");
            }
        }

        let posts = canonical_post_urls(&page.links);
        info!(hashtag, count = posts.len(), "Distinct post URLs found");
        Ok(posts)
    }
}

#[async_trait]
impl SessionProvider for BrowserlessSession {
    async fn obtain_session(&self) -> Result<SessionCookies> {
        let context = serde_json::json!({ "url": HOME_URL });
        info!("Retrieving session cookies");

        let mut page: PageCookies = self
            .client
            .function(OBTAIN_SESSION_SCRIPT, context.clone())
            .await
            .context("Cookie harvest failed")?;

        if is_login_page(&page.url) {
            self.handle_challenge()?;
            page = self
                .client
                .function(OBTAIN_SESSION_SCRIPT, context)
                .await
                .context("Cookie harvest failed after challenge")?;
            if is_login_page(&page.url) {
                bail!("still on the login page after challenge");
            }
        }

        let cookies: SessionCookies = page
            .cookies
            .into_iter()
            .map(|c| (c.name, c.value))
            .collect();
        info!(count = cookies.len(), "Session cookies retrieved");
        Ok(cookies)
    }
}

fn is_login_page(url: &str) -> bool {
    url.contains("accounts/login")
}

fn hashtag_url(hashtag: &str) -> Result<String> {
    let tag = hashtag.trim().trim_start_matches('#');
    let base = url::Url::parse(EXPLORE_TAGS_BASE).expect("valid base URL");
    let joined = base
        .join(&format!("{tag}/"))
        .with_context(|| format!("Invalid hashtag: {hashtag}"))?;
    Ok(joined.to_string())
}

/// Canonicalize raw anchor hrefs into `https://www.instagram.com/p/{shortcode}/`
/// form, dropping liked-by/comments sublinks and duplicates, preserving
/// first-seen order.
pub fn canonical_post_urls(links: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut posts = Vec::new();

    for href in links {
        if !href.contains("/p/") || href.contains("liked_by") || href.contains("comments") {
            continue;
        }
        let shortcode = shortcode_from(href);
        if shortcode.is_empty() {
            continue;
        }
        let canonical = format!("https://www.instagram.com/p/{shortcode}/");
        if seen.insert(canonical.clone()) {
            posts.push(canonical);
        }
    }

    posts
}
