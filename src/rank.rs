// src/rank.rs
//! # Rating selection
//! Pick the `top_k` highest-rated items published inside an inclusive UTC day window.
//!
//! Pipeline: filter by day → stable sort by rating desc → take `top_k`.
//! Ties keep input order. Nothing is mutated besides the per-item memoized rating,
//! so running the selection twice on the same slice yields the same sequence.

use chrono::NaiveDate;

use crate::news::{utc_day, News};

/// Inclusive `[from, to]` range of UTC calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateWindow {
    /// Reversed bounds are swapped to keep a valid interval.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    /// Epoch seconds → UTC day → membership.
    pub fn contains_timestamp(&self, ts: i64) -> bool {
        utc_day(ts).is_some_and(|d| self.contains(d))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RankSelector {
    pub top_k: usize,
    pub window: DateWindow,
}

impl RankSelector {
    pub fn new(top_k: usize, window: DateWindow) -> Self {
        Self { top_k, window }
    }

    /// Borrowing selection. Each call recomputes from `news`.
    pub fn select<'a>(&self, news: &'a [News]) -> impl Iterator<Item = &'a News> + 'a {
        let window = self.window;
        let mut in_window: Vec<&'a News> = if self.top_k == 0 {
            Vec::new()
        } else {
            news.iter()
                .filter(|n| window.contains_timestamp(n.publication_date))
                .collect()
        };

        // `sort_by` is stable: equal ratings stay in input order.
        in_window.sort_by(|a, b| b.rating().total_cmp(&a.rating()));
        in_window.into_iter().take(self.top_k)
    }

    /// Owned selection with the rating field filled in, ready for persistence.
    pub fn most_rated(&self, news: &[News]) -> Vec<News> {
        self.select(news)
            .map(|n| {
                let rating = n.rating();
                n.clone().with_rating(rating)
            })
            .collect()
    }
}
