use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};
use std::env;
use std::time::Duration;
use tracing::debug;

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const DEFAULT_LANGUAGE: &str = "en-US";

/// Base prepended to every `poster_path` the provider returns.
pub const IMAGE_URL: &str = "https://image.tmdb.org/t/p/original";

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    language: String,
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn list_popular_movies(&self) -> Result<MovieList>;
    async fn get_movie_details(&self, id: i32) -> Result<MovieDetail>;
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Result<Self> {
        let user_agent = format!("filmshelf/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            language: language.into(),
        })
    }

    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        let language = env::var("TMDB_LANGUAGE")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        Self::new(api_key, language)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{TMDB_BASE}{path}");
        let res = self
            .client
            .get(&url)
            .query(params)
            .query(&[
                ("language", self.language.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            // The key travels in the query string, so only the path goes into the error.
            return Err(status_error(path, status, &text));
        }
        let parsed: T = serde_json::from_str(&text)
            .with_context(|| format!("JSON parse failed for {}", path))?;
        Ok(parsed)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn list_popular_movies(&self) -> Result<MovieList> {
        debug!("GET /movie/popular");
        self.get_json("/movie/popular", &[("page", "1")]).await
    }

    async fn get_movie_details(&self, id: i32) -> Result<MovieDetail> {
        let path = format!("/movie/{id}");
        debug!("GET {}", path);
        self.get_json(&path, &[("append_to_response", "videos")])
            .await
    }
}

/// One page of the popular listing.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieList {
    pub results: Vec<MovieSummary>,
}

/// `overview` and `release_date` keep absent (`None`) apart from `null` (`Some(None)`).
#[derive(Debug, Clone, Deserialize)]
pub struct MovieSummary {
    pub id: i32,
    pub title: String,
    #[serde(default, deserialize_with = "present")]
    pub overview: Option<Option<String>>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub release_date: Option<Option<String>>,
}

/// `/movie/{id}` with `append_to_response=videos`.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetail {
    pub id: i32,
    pub title: String,
    #[serde(default, deserialize_with = "present")]
    pub overview: Option<Option<String>>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub release_date: Option<Option<String>>,
    #[serde(default)]
    pub videos: Option<Videos>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Videos {
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub site: String,
    #[serde(default, rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub key: Option<String>,
}

// Only runs when the key is in the payload; `default` covers the absent case.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn status_error(path: &str, status: StatusCode, body: &str) -> anyhow::Error {
    anyhow!("{} ({}) -> {}", path, status, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_detail_with_appended_videos() {
        let value = json!({
            "id": 603,
            "title": "The Matrix",
            "overview": "Set in the 22nd century...",
            "poster_path": "/matrix.jpg",
            "release_date": "1999-03-30",
            "runtime": 136,
            "videos": {
                "results": [
                    { "type": "Trailer", "site": "YouTube", "key": "vKQi3bBA1y8", "name": "Official" }
                ]
            }
        });
        let detail: MovieDetail = serde_json::from_value(value).expect("detail deserialize");
        assert_eq!(detail.id, 603);
        let videos = detail.videos.expect("videos present");
        assert_eq!(videos.results.len(), 1);
        assert_eq!(videos.results[0].video_type, "Trailer");
        assert_eq!(videos.results[0].site, "YouTube");
        assert_eq!(videos.results[0].key.as_deref(), Some("vKQi3bBA1y8"));
    }

    #[test]
    fn null_poster_and_absent_videos_become_none() {
        let value = json!({
            "id": 1,
            "title": "No Art",
            "overview": "",
            "poster_path": null,
            "release_date": "2020-01-01"
        });
        let detail: MovieDetail = serde_json::from_value(value).expect("detail deserialize");
        assert!(detail.poster_path.is_none());
        assert!(detail.videos.is_none());
    }

    #[test]
    fn detail_without_title_is_rejected() {
        let value = json!({ "id": 1, "overview": "x" });
        assert!(serde_json::from_value::<MovieDetail>(value).is_err());
    }

    #[test]
    fn deserializes_popular_page_in_order() {
        let value = json!({
            "page": 1,
            "total_pages": 500,
            "results": [
                { "id": 2, "title": "B", "overview": "b", "poster_path": "/b.jpg", "release_date": "2021-02-02" },
                { "id": 1, "title": "A", "overview": "a", "poster_path": "/a.jpg", "release_date": "2020-01-01" }
            ]
        });
        let list: MovieList = serde_json::from_value(value).expect("list deserialize");
        let ids: Vec<i32> = list.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn null_overview_differs_from_absent_overview() {
        let null: MovieDetail =
            serde_json::from_value(json!({ "id": 1, "title": "T", "overview": null }))
                .expect("detail deserialize");
        assert_eq!(null.overview, Some(None));
        assert_eq!(null.release_date, None);

        let absent: MovieDetail = serde_json::from_value(json!({ "id": 1, "title": "T" }))
            .expect("detail deserialize");
        assert_eq!(absent.overview, None);
    }

    #[test]
    fn video_without_key_still_deserializes() {
        let value = json!({
            "results": [
                { "type": "Clip", "site": "Vimeo" },
                { "type": "Trailer", "site": "YouTube", "key": "k" }
            ]
        });
        let videos: Videos = serde_json::from_value(value).expect("videos deserialize");
        assert_eq!(videos.results[0].key, None);
        assert_eq!(videos.results[1].key.as_deref(), Some("k"));
    }

    #[test]
    fn status_error_names_path_and_body_only() {
        let err = status_error(
            "/movie/603",
            StatusCode::NOT_FOUND,
            r#"{"status_code":34,"status_message":"The resource you requested could not be found."}"#,
        );
        let message = err.to_string();
        assert!(message.starts_with("/movie/603 (404 Not Found) -> "));
        assert!(message.contains("could not be found"));
        assert!(!message.contains("api_key"));
        assert!(!message.contains(TMDB_BASE));
    }
}
