//! Hand-rolled mocks for pipeline tests: no network, no browser, no sleeps.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use instagram_client::{shortcode_from, Pacer, ShortcodeMedia, UserProfile};

use crate::pipeline::{PostFetcher, ProfileFetcher};
use crate::sink::{CommentRow, ContactRow, RowSink};

/// Raw-record fixture with one flat comment edge per username.
pub fn media_with_commenters(usernames: &[&str]) -> serde_json::Value {
    let edges: Vec<_> = usernames
        .iter()
        .map(|u| serde_json::json!({"node": {"owner": {"username": u}}}))
        .collect();
    serde_json::json!({"edge_media_to_comment": {"edges": edges}})
}

// ---------------------------------------------------------------------------
// MockPostFetcher — registered shortcodes succeed, everything else fails
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MockPostFetcher {
    media: Arc<Mutex<HashMap<String, serde_json::Value>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockPostFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_post(self, shortcode: &str, media: serde_json::Value) -> Self {
        self.media
            .lock()
            .unwrap()
            .insert(shortcode.to_string(), media);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostFetcher for MockPostFetcher {
    async fn fetch_post_comments(&self, url_or_shortcode: &str) -> Option<ShortcodeMedia> {
        self.calls
            .lock()
            .unwrap()
            .push(url_or_shortcode.to_string());
        let shortcode = shortcode_from(url_or_shortcode);
        self.media
            .lock()
            .unwrap()
            .get(shortcode)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

// ---------------------------------------------------------------------------
// MockProfileFetcher — registered usernames succeed, everything else fails
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MockProfileFetcher {
    profiles: Arc<Mutex<HashMap<String, UserProfile>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockProfileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_user(self, username: &str, biography: &str) -> Self {
        self.profiles.lock().unwrap().insert(
            username.to_string(),
            UserProfile {
                username: username.to_string(),
                biography: biography.to_string(),
                ..Default::default()
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileFetcher for MockProfileFetcher {
    async fn fetch_profile(&self, username: &str) -> Option<UserProfile> {
        self.calls.lock().unwrap().push(username.to_string());
        self.profiles.lock().unwrap().get(username).cloned()
    }
}

// ---------------------------------------------------------------------------
// RecordingPacer — captures requested pause ranges, returns immediately
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<(Duration, Duration)>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<(Duration, Duration)> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, min: Duration, max: Duration) {
        self.pauses.lock().unwrap().push((min, max));
    }
}

// ---------------------------------------------------------------------------
// MemorySink — collects rows for assertions
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemorySink {
    pub contacts: Vec<ContactRow>,
    pub comments: Vec<CommentRow>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RowSink for MemorySink {
    fn write_contact(&mut self, row: &ContactRow) -> Result<()> {
        self.contacts.push(row.clone());
        Ok(())
    }

    fn write_comment(&mut self, row: &CommentRow) -> Result<()> {
        self.comments.push(row.clone());
        Ok(())
    }
}
