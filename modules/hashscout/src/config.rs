use std::env;

/// Run configuration loaded from environment variables. The hashtag and
/// post-count limit are interactive prompts, not env vars — everything else
/// about a run lives here.
#[derive(Debug, Clone)]
pub struct Config {
    // Browserless (post discovery + session acquisition)
    pub browserless_url: String,
    pub browserless_token: Option<String>,

    // Output
    pub output_path: String,
    /// Emit only `post_url, comment_username` rows and skip the profile
    /// enrichment phase entirely.
    pub harvest_only: bool,

    // Discovery
    pub scroll_depth: u32,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        let harvest_only = env::var("HARVEST_ONLY")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let default_output = if harvest_only {
            "comments.csv"
        } else {
            "profiles_phone.csv"
        };

        Self {
            browserless_url: required_env("BROWSERLESS_URL"),
            browserless_token: env::var("BROWSERLESS_TOKEN").ok(),
            output_path: env::var("OUTPUT_PATH").unwrap_or_else(|_| default_output.to_string()),
            harvest_only,
            scroll_depth: env::var("SCROLL_DEPTH")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .expect("SCROLL_DEPTH must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
