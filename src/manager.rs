use crate::error::MappingError;
use crate::models::Movie;
use crate::tmdb::{MovieDetail, MovieList, TmdbApi, Video, Videos, IMAGE_URL};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Curated movie ids listed by `list_favorite_movies`, in display order.
pub const DEFAULT_FAVORITE_IDS: [i32; 5] = [13183, 4935, 9900, 75612, 603];

const YOUTUBE_WATCH: &str = "https://www.youtube.com/watch?v=";

/// Builds ordered `Movie` listings on top of a TMDB client.
///
/// Every listing is fetched sequentially and aborts on the first failure.
#[derive(Clone)]
pub struct MediaManager {
    api: Arc<dyn TmdbApi>,
    favorite_ids: Arc<[i32]>,
}

impl MediaManager {
    pub fn new(api: Arc<dyn TmdbApi>) -> Self {
        Self::with_favorites(api, DEFAULT_FAVORITE_IDS)
    }

    pub fn with_favorites(api: Arc<dyn TmdbApi>, favorite_ids: impl Into<Arc<[i32]>>) -> Self {
        Self {
            api,
            favorite_ids: favorite_ids.into(),
        }
    }

    pub fn favorite_ids(&self) -> &[i32] {
        &self.favorite_ids
    }

    pub async fn list_popular_movies(&self) -> Result<Vec<Movie>> {
        info!("Listing popular movies");
        let list = self.api.list_popular_movies().await?;
        let mut movies = Vec::with_capacity(list.results.len());
        for summary in &list.results {
            movies.push(self.fetch_movie(summary.id).await?);
        }
        info!("Listed {} popular movies", movies.len());
        Ok(movies)
    }

    pub async fn list_favorite_movies(&self) -> Result<Vec<Movie>> {
        info!("Listing {} favorite movies", self.favorite_ids.len());
        let mut movies = Vec::with_capacity(self.favorite_ids.len());
        for &id in self.favorite_ids.iter() {
            movies.push(self.fetch_movie(id).await?);
        }
        info!("Listed {} favorite movies", movies.len());
        Ok(movies)
    }

    /// Popular movies straight from the listing page, without detail lookups.
    /// Trailers are never populated on this path.
    pub async fn list_popular_summaries(&self) -> Result<Vec<Movie>> {
        info!("Listing popular movie summaries");
        let list = self.api.list_popular_movies().await?;
        let movies = convert_movie_results(&list).map_err(|e| {
            warn!("Failed to convert popular listing: {}", e);
            e
        })?;
        info!("Listed {} popular summaries", movies.len());
        Ok(movies)
    }

    async fn fetch_movie(&self, id: i32) -> Result<Movie> {
        debug!("Fetching details for movie {}", id);
        let detail = self.api.get_movie_details(id).await?;
        convert_movie_detail(&detail).map_err(|e| {
            warn!("Failed to convert movie {}: {}", id, e);
            e.into()
        })
    }
}

/// Maps a detail payload to a `Movie`.
///
/// The trailer is the last YouTube video typed `Trailer`, in provider order.
/// A `null` overview or release date maps to an empty string; an absent one is an error.
pub fn convert_movie_detail(detail: &MovieDetail) -> Result<Movie, MappingError> {
    let missing = |field| MappingError::MissingField {
        id: detail.id,
        field,
    };
    let overview = detail.overview.as_ref().ok_or_else(|| missing("overview"))?;
    let poster_path = detail
        .poster_path
        .as_ref()
        .ok_or_else(|| missing("poster_path"))?;
    let release_date = detail
        .release_date
        .as_ref()
        .ok_or_else(|| missing("release_date"))?;
    let videos = detail.videos.as_ref().ok_or_else(|| missing("videos"))?;
    let trailer_url = select_trailer(detail.id, videos)?;

    Ok(Movie {
        id: detail.id,
        title: detail.title.clone(),
        overview: overview.clone().unwrap_or_default(),
        poster_url: poster_url(poster_path),
        release_date: release_date.clone().unwrap_or_default(),
        trailer_url,
    })
}

/// Maps a listing page to `Movie`s without trailer data, keeping page order.
pub fn convert_movie_results(list: &MovieList) -> Result<Vec<Movie>, MappingError> {
    list.results
        .iter()
        .map(|r| -> Result<Movie, MappingError> {
            let missing = |field| MappingError::MissingField { id: r.id, field };
            let overview = r.overview.clone().ok_or_else(|| missing("overview"))?;
            let poster_path = r
                .poster_path
                .as_deref()
                .ok_or_else(|| missing("poster_path"))?;
            let release_date = r.release_date.clone().ok_or_else(|| missing("release_date"))?;
            Ok(Movie {
                id: r.id,
                title: r.title.clone(),
                overview: overview.unwrap_or_default(),
                poster_url: poster_url(poster_path),
                release_date: release_date.unwrap_or_default(),
                trailer_url: None,
            })
        })
        .collect()
}

fn poster_url(path: &str) -> String {
    format!("{IMAGE_URL}{path}")
}

fn is_youtube_trailer(video: &&Video) -> bool {
    video.video_type == "Trailer" && video.site == "YouTube"
}

/// Every qualifying video must carry a key; other records are skipped unread.
fn select_trailer(id: i32, videos: &Videos) -> Result<Option<String>, MappingError> {
    if videos
        .results
        .iter()
        .filter(is_youtube_trailer)
        .any(|v| v.key.is_none())
    {
        return Err(MappingError::MissingField { id, field: "key" });
    }
    let trailer = videos
        .results
        .iter()
        .rev()
        .find(is_youtube_trailer)
        .and_then(|v| v.key.as_deref())
        .map(|key| format!("{YOUTUBE_WATCH}{key}"));
    Ok(trailer)
}
