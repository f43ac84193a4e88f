use serde::{Deserialize, Serialize};

/// Display-ready view of one movie, built fresh from a TMDB payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub overview: String,
    pub poster_url: String,
    pub release_date: String,
    pub trailer_url: Option<String>,
}
