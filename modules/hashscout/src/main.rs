use std::io::{self, Write as _};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hashscout::config::Config;
use hashscout::discovery::{BrowserlessSession, PostDiscovery, SessionProvider};
use hashscout::pipeline::{OutputMode, Pipeline};
use hashscout::sink::CsvSink;
use instagram_client::{InstagramClient, InstagramConfig, TokioPacer};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("hashscout=info".parse()?)
                .add_directive("instagram_client=info".parse()?),
        )
        .init();

    info!("Hashscout starting...");

    let config = Config::from_env();

    let hashtag = prompt("Enter hashtag (e.g. 保健品): ")?;
    let hashtag = hashtag.trim().trim_start_matches('#').to_string();
    anyhow::ensure!(!hashtag.is_empty(), "a hashtag is required");

    let max_posts: usize = prompt("How many posts to harvest: ")?
        .trim()
        .parse()
        .context("post count must be a number")?;

    let session =
        BrowserlessSession::new(&config.browserless_url, config.browserless_token.as_deref())
            .with_challenge(Box::new(|| {
                warn!(
                    "Login challenge detected. Complete the login in the remote \
                     browser session; the run will retry once."
                );
            }));

    info!(hashtag = %hashtag, "Discovering posts");
    let mut posts = session.discover_posts(&hashtag, config.scroll_depth).await?;
    if posts.is_empty() {
        info!(hashtag = %hashtag, "No posts found, exiting");
        return Ok(());
    }
    posts.truncate(max_posts);
    info!(count = posts.len(), limit = max_posts, "Post URLs collected");

    let cookies = session.obtain_session().await?;
    anyhow::ensure!(
        !cookies.is_empty(),
        "no session cookies available — cannot call comment/profile endpoints"
    );
    info!(count = cookies.len(), "Session established");

    let client = Arc::new(InstagramClient::new(InstagramConfig::default(), cookies));
    let mode = if config.harvest_only {
        OutputMode::HarvestOnly
    } else {
        OutputMode::Enrich
    };
    let pipeline = Pipeline::new(client.clone(), client, Arc::new(TokioPacer), mode);

    let mut sink = CsvSink::create(&config.output_path)?;
    let stats = pipeline.run(&posts, &mut sink).await?;

    info!("Run complete. {stats}");
    info!(path = %config.output_path, "Results saved");
    Ok(())
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
