//! Contact-field mining over free-text biographies.
//!
//! Three independent first-match scans. Shape matching only — no checksum,
//! no DNS lookup, no reachability probe.

use std::sync::LazyLock;

use regex::Regex;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d[\d\s\-]{8,}\d").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://[^\s]+").unwrap());

/// Contact fields mined from a biography. Empty string means "not found" —
/// these flow straight into output rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BioFields {
    pub phone: String,
    pub email: String,
    pub link: String,
}

fn first_match(re: &Regex, text: &str) -> String {
    re.find(text).map(|m| m.as_str().to_string()).unwrap_or_default()
}

/// Extract the first phone-like, email-like and URL-like token from a bio.
/// A bio may yield all three, some, or none.
pub fn extract_contact(bio: &str) -> BioFields {
    BioFields {
        phone: first_match(&PHONE_RE, bio),
        email: first_match(&EMAIL_RE, bio),
        link: first_match(&LINK_RE, bio),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_three_fields_from_one_bio() {
        let fields = extract_contact(
            "Call me +1 234-567-8901 or alice@example.com, https://example.com/alice",
        );
        assert_eq!(fields.phone, "+1 234-567-8901");
        assert_eq!(fields.email, "alice@example.com");
        assert_eq!(fields.link, "https://example.com/alice");
    }

    #[test]
    fn email_only_bio_leaves_other_fields_empty() {
        let fields = extract_contact("reach me at bob@example.org for collabs");
        assert_eq!(fields.email, "bob@example.org");
        assert_eq!(fields.phone, "");
        assert_eq!(fields.link, "");
    }

    #[test]
    fn leftmost_phone_wins() {
        let fields = extract_contact("office 021-5555-8888, mobile 139 1234 5678");
        assert_eq!(fields.phone, "021-5555-8888");
    }

    #[test]
    fn empty_bio_yields_empty_fields() {
        assert_eq!(extract_contact(""), BioFields::default());
    }

    #[test]
    fn short_digit_runs_are_not_phones() {
        let fields = extract_contact("est. 2019, suite 401");
        assert_eq!(fields.phone, "");
    }

    #[test]
    fn link_stops_at_whitespace() {
        let fields = extract_contact("shop: http://example.com/store new drops weekly");
        assert_eq!(fields.link, "http://example.com/store");
    }
}
