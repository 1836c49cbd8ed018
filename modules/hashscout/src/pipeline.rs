//! Two-phase enrichment pipeline.
//!
//! Phase 1 harvests commenter usernames per post; phase 2 fetches each
//! commenter's profile and mines the bio for contact fields. Strictly
//! sequential — the deliberate pacing between requests is a correctness
//! property, not a performance knob. Rows are flushed as produced so an
//! interrupted run leaves usable partial output.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use instagram_client::{InstagramClient, Pacer, ShortcodeMedia, UserProfile};

use crate::extract::extract_contact;
use crate::sink::{CommentRow, ContactRow, RowSink};

/// Fixed pause between post fetches.
const POST_PAUSE: Duration = Duration::from_secs(2);
/// Randomized pause between profile fetches. Dominates total run time.
const PROFILE_PAUSE_MIN: Duration = Duration::from_secs(30);
const PROFILE_PAUSE_MAX: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Fetcher seams — InstagramClient in production, mocks in tests
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PostFetcher: Send + Sync {
    async fn fetch_post_comments(&self, url_or_shortcode: &str) -> Option<ShortcodeMedia>;
}

#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch_profile(&self, username: &str) -> Option<UserProfile>;
}

#[async_trait]
impl PostFetcher for InstagramClient {
    async fn fetch_post_comments(&self, url_or_shortcode: &str) -> Option<ShortcodeMedia> {
        InstagramClient::fetch_post_comments(self, url_or_shortcode).await
    }
}

#[async_trait]
impl ProfileFetcher for InstagramClient {
    async fn fetch_profile(&self, username: &str) -> Option<UserProfile> {
        InstagramClient::fetch_profile(self, username).await
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Emit `post_url, comment_username` rows after phase 1 and stop.
    HarvestOnly,
    /// Full pipeline: harvest, then profile enrichment rows.
    Enrich,
}

/// Stats from a harvest run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub posts_fetched: u32,
    pub posts_failed: u32,
    pub commenters_found: u32,
    pub profiles_fetched: u32,
    pub profiles_failed: u32,
    pub rows_written: u32,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Harvest Run Complete ===")?;
        writeln!(f, "Posts fetched:    {}", self.posts_fetched)?;
        writeln!(f, "Posts failed:     {}", self.posts_failed)?;
        writeln!(f, "Commenters found: {}", self.commenters_found)?;
        writeln!(f, "Profiles fetched: {}", self.profiles_fetched)?;
        writeln!(f, "Profiles failed:  {}", self.profiles_failed)?;
        writeln!(f, "Rows written:     {}", self.rows_written)?;
        Ok(())
    }
}

pub struct Pipeline {
    posts: Arc<dyn PostFetcher>,
    profiles: Arc<dyn ProfileFetcher>,
    pacer: Arc<dyn Pacer>,
    mode: OutputMode,
}

impl Pipeline {
    pub fn new(
        posts: Arc<dyn PostFetcher>,
        profiles: Arc<dyn ProfileFetcher>,
        pacer: Arc<dyn Pacer>,
        mode: OutputMode,
    ) -> Self {
        Self {
            posts,
            profiles,
            pacer,
            mode,
        }
    }

    /// Run both phases over the discovered post URLs, writing rows into
    /// `sink` as they are produced.
    pub async fn run(&self, post_urls: &[String], sink: &mut dyn RowSink) -> Result<RunStats> {
        let mut stats = RunStats::default();
        let harvested = self.harvest_comments(post_urls, sink, &mut stats).await?;

        if self.mode == OutputMode::HarvestOnly {
            return Ok(stats);
        }

        self.enrich_profiles(&harvested, sink, &mut stats).await?;
        Ok(stats)
    }

    /// Phase 1 — per post: fetch the first comment page and record the
    /// deduplicated commenter list. A failed post contributes no entry and
    /// processing continues.
    async fn harvest_comments(
        &self,
        post_urls: &[String],
        sink: &mut dyn RowSink,
        stats: &mut RunStats,
    ) -> Result<Vec<(String, Vec<String>)>> {
        let total = post_urls.len();
        let mut harvested: Vec<(String, Vec<String>)> = Vec::new();

        for (i, post_url) in post_urls.iter().enumerate() {
            info!(post = %post_url, "Processing post {}/{total}", i + 1);

            match self.posts.fetch_post_comments(post_url).await {
                Some(media) => {
                    let commenters = media.commenter_usernames();
                    info!(post = %post_url, count = commenters.len(), "Commenters harvested");
                    stats.posts_fetched += 1;
                    stats.commenters_found += commenters.len() as u32;

                    if self.mode == OutputMode::HarvestOnly {
                        for username in &commenters {
                            sink.write_comment(&CommentRow {
                                post_url: post_url.clone(),
                                comment_username: username.clone(),
                            })?;
                            stats.rows_written += 1;
                        }
                    }
                    harvested.push((post_url.clone(), commenters));
                }
                None => {
                    warn!(post = %post_url, "Failed to get post data");
                    stats.posts_failed += 1;
                }
            }

            // Throttle regardless of outcome.
            self.pacer.pause(POST_PAUSE, POST_PAUSE).await;
        }

        Ok(harvested)
    }

    /// Phase 2 — per (post, commenter) pair in harvest order: fetch the
    /// profile, mine the bio, write one row. A commenter whose profile
    /// fetch comes back empty is skipped (logged, no row) and the run
    /// continues.
    async fn enrich_profiles(
        &self,
        harvested: &[(String, Vec<String>)],
        sink: &mut dyn RowSink,
        stats: &mut RunStats,
    ) -> Result<()> {
        for (post_url, usernames) in harvested {
            info!(post = %post_url, commenters = usernames.len(), "Enriching commenters");

            for username in usernames {
                match self.profiles.fetch_profile(username).await {
                    Some(profile) => {
                        let fields = extract_contact(&profile.biography);
                        sink.write_contact(&ContactRow {
                            post_url: post_url.clone(),
                            username: username.clone(),
                            biography: profile.biography,
                            phone_number: fields.phone,
                            email: fields.email,
                            link: fields.link,
                        })?;
                        stats.profiles_fetched += 1;
                        stats.rows_written += 1;
                        info!(username, "Wrote profile row");
                    }
                    None => {
                        warn!(username, "No profile data, skipping row");
                        stats.profiles_failed += 1;
                    }
                }

                self.pacer
                    .pause(PROFILE_PAUSE_MIN, PROFILE_PAUSE_MAX)
                    .await;
            }
        }

        Ok(())
    }
}
