// src/news.rs
//! # News model
//! Items returned by the feed, plus the derived popularity rating.
//!
//! The rating is either supplied by the source or derived as
//! `1 / (1 + e^-(favorites / (comments + 1)))`. The derived value is computed
//! on first access and cached; concurrent readers either see nothing yet or
//! the final value.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Venue attached to a news item (`expand=place`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Place {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(t) => f.write_str(t),
            None => write!(f, "{}", self.id),
        }
    }
}

/// One page of the feed as the API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsPage {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<News>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct News {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub place: Option<Place>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub site_url: String,
    #[serde(default)]
    pub favorites_count: u64,
    #[serde(default)]
    pub comments_count: u64,
    /// Unix seconds.
    pub publication_date: i64,
    /// Rating supplied by the source (or filled in by ranking).
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(skip)]
    derived: OnceCell<f64>,
}

impl News {
    pub fn new(
        id: i64,
        title: impl Into<String>,
        favorites_count: u64,
        comments_count: u64,
        publication_date: i64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            place: None,
            description: String::new(),
            site_url: String::new(),
            favorites_count,
            comments_count,
            publication_date,
            rating: None,
            derived: OnceCell::new(),
        }
    }

    /// Builder-style override for a source-supplied rating.
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Supplied rating if present, otherwise the memoized derived one.
    pub fn rating(&self) -> f64 {
        match self.rating {
            Some(r) => r,
            None => *self
                .derived
                .get_or_init(|| logistic_rating(self.favorites_count, self.comments_count)),
        }
    }

    /// Publication day in UTC. `None` if the timestamp is out of chrono's range.
    pub fn publication_day(&self) -> Option<NaiveDate> {
        utc_day(self.publication_date)
    }
}

/// `1 / (1 + e^-(favorites / (comments + 1)))`
pub fn logistic_rating(favorites: u64, comments: u64) -> f64 {
    let x = favorites as f64 / (comments as f64 + 1.0);
    1.0 / (1.0 + (-x).exp())
}

/// Convert epoch seconds to a UTC calendar day.
pub fn utc_day(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}
