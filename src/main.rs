use anyhow::Result;
use dotenvy::dotenv;
use filmshelf::manager::MediaManager;
use filmshelf::tmdb::{TmdbApi, TmdbClient};
use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: filmshelf <popular|favorites> [--summary]";

#[derive(Debug, Clone, Copy, PartialEq)]
enum View {
    Popular,
    PopularSummary,
    Favorites,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn check_env() -> Result<()> {
    let required = ["TMDB_API_KEY"];
    for key in required {
        if env::var(key).is_err() {
            anyhow::bail!("Missing required environment variable: {}", key);
        }
    }
    info!("All required environment variables are set");
    Ok(())
}

fn parse_view(args: &[String]) -> Result<View> {
    let summary = args.iter().any(|a| a == "--summary");
    let name = args.iter().find(|a| !a.starts_with("--"));
    match (name.map(String::as_str), summary) {
        (Some("popular"), false) => Ok(View::Popular),
        (Some("popular"), true) => Ok(View::PopularSummary),
        (Some("favorites"), false) => Ok(View::Favorites),
        (Some("favorites"), true) => anyhow::bail!("--summary only applies to popular\n{USAGE}"),
        _ => anyhow::bail!("{USAGE}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_result = dotenv();
    init_tracing();
    match dotenv_result {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let view = parse_view(&args)?;
    check_env()?;

    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::from_env()?);
    let manager = MediaManager::new(tmdb);
    let movies = match view {
        View::Popular => manager.list_popular_movies().await?,
        View::PopularSummary => manager.list_popular_summaries().await?,
        View::Favorites => manager.list_favorite_movies().await?,
    };

    println!("{}", serde_json::to_string_pretty(&movies)?);
    Ok(())
}
