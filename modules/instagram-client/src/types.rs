use std::collections::HashMap;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Session cookies
// ---------------------------------------------------------------------------

/// Opaque cookie bag obtained from the browser-session collaborator.
/// Passed through on every request; never inspected beyond serialization.
#[derive(Debug, Clone, Default)]
pub struct SessionCookies(HashMap<String, String>);

impl SessionCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Render the bag as a `Cookie` header value.
    pub fn header_value(&self) -> String {
        let mut pairs: Vec<_> = self.0.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl FromIterator<(String, String)> for SessionCookies {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Comment query envelope: {"data": {"shortcode_media": {...}}}
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CommentQueryResponse {
    #[serde(default)]
    pub data: CommentQueryData,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentQueryData {
    pub shortcode_media: Option<ShortcodeMedia>,
}

/// Post record with its first page of comment edges. Transient — consumed
/// for commenter usernames, then discarded.
#[derive(Debug, Default, Deserialize)]
pub struct ShortcodeMedia {
    pub edge_media_to_parent_comment: Option<CommentEdges>,
    pub edge_media_to_comment: Option<CommentEdges>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentEdges {
    #[serde(default)]
    pub edges: Vec<CommentEdge>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentEdge {
    #[serde(default)]
    pub node: CommentNode,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentNode {
    #[serde(default)]
    pub owner: CommentOwner,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentOwner {
    #[serde(default)]
    pub username: String,
}

impl ShortcodeMedia {
    /// Commenter usernames in first-seen order, deduplicated.
    /// Prefers top-level (parent) comment edges when the endpoint returns
    /// both collections; empty usernames are skipped.
    pub fn commenter_usernames(&self) -> Vec<String> {
        let edges = self
            .edge_media_to_parent_comment
            .as_ref()
            .or(self.edge_media_to_comment.as_ref());

        let mut seen = std::collections::HashSet::new();
        let mut usernames = Vec::new();
        if let Some(edges) = edges {
            for edge in &edges.edges {
                let username = &edge.node.owner.username;
                if !username.is_empty() && seen.insert(username.clone()) {
                    usernames.push(username.clone());
                }
            }
        }
        usernames
    }
}

// ---------------------------------------------------------------------------
// Profile envelope: {"data": {"user": {...}}}
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub data: ProfileData,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileData {
    pub user: Option<UserProfile>,
}

/// Normalized public profile. Fields the endpoint omits default to empty —
/// absence of data is never an error downstream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub username: String,
    pub biography: String,
    pub full_name: String,
    pub external_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media_from(json: serde_json::Value) -> ShortcodeMedia {
        serde_json::from_value(json).expect("valid media fixture")
    }

    #[test]
    fn commenters_deduplicated_in_first_seen_order() {
        let media = media_from(serde_json::json!({
            "edge_media_to_comment": {"edges": [
                {"node": {"owner": {"username": "alice"}}},
                {"node": {"owner": {"username": "alice"}}},
                {"node": {"owner": {"username": "bob"}}}
            ]}
        }));
        assert_eq!(media.commenter_usernames(), vec!["alice", "bob"]);
    }

    #[test]
    fn commenters_prefer_parent_comment_edges() {
        let media = media_from(serde_json::json!({
            "edge_media_to_parent_comment": {"edges": [
                {"node": {"owner": {"username": "parent_user"}}}
            ]},
            "edge_media_to_comment": {"edges": [
                {"node": {"owner": {"username": "flat_user"}}}
            ]}
        }));
        assert_eq!(media.commenter_usernames(), vec!["parent_user"]);
    }

    #[test]
    fn commenters_skip_empty_usernames() {
        let media = media_from(serde_json::json!({
            "edge_media_to_comment": {"edges": [
                {"node": {"owner": {"username": ""}}},
                {"node": {"owner": {"username": "carol"}}},
                {"node": {}}
            ]}
        }));
        assert_eq!(media.commenter_usernames(), vec!["carol"]);
    }

    #[test]
    fn commenters_empty_when_no_comment_edges_present() {
        let media = media_from(serde_json::json!({}));
        assert!(media.commenter_usernames().is_empty());
    }

    #[test]
    fn commenters_extraction_is_deterministic() {
        let fixture = serde_json::json!({
            "edge_media_to_comment": {"edges": [
                {"node": {"owner": {"username": "zed"}}},
                {"node": {"owner": {"username": "amy"}}},
                {"node": {"owner": {"username": "zed"}}}
            ]}
        });
        let first = media_from(fixture.clone()).commenter_usernames();
        let second = media_from(fixture).commenter_usernames();
        assert_eq!(first, second);
        assert_eq!(first, vec!["zed", "amy"]);
    }

    #[test]
    fn profile_defaults_for_missing_fields() {
        let envelope: ProfileResponse =
            serde_json::from_str(r#"{"data": {"user": {"username": "alice"}}}"#).unwrap();
        let user = envelope.data.user.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.biography, "");
        assert!(user.external_url.is_none());
    }

    #[test]
    fn cookie_header_renders_all_pairs() {
        let mut cookies = SessionCookies::new();
        cookies.insert("sessionid", "abc123");
        cookies.insert("csrftoken", "tok");
        assert_eq!(cookies.header_value(), "csrftoken=tok; sessionid=abc123");
    }

    #[test]
    fn empty_cookie_bag() {
        let cookies = SessionCookies::new();
        assert!(cookies.is_empty());
        assert_eq!(cookies.header_value(), "");
    }
}
