//! Product reviews and the rating summary computed from them

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Rating;
use crate::store::{Collection, Document};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub author_name: String,
    pub email: String,
    pub rating: Rating,
    pub title: Option<String>,
    pub body: String,
    pub approved: bool,
    pub helpful_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn submit(product_id: Uuid, author_name: impl Into<String>, email: impl Into<String>, rating: Rating, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(), product_id, author_name: author_name.into(), email: email.into(),
            rating, title: None, body: body.into(), approved: false, helpful_count: 0, created_at: Utc::now(),
        }
    }

    pub fn mark_helpful(&mut self) { self.helpful_count = self.helpful_count.saturating_add(1); }
}

impl Document for Review {
    const COLLECTION: Collection = Collection::Reviews;
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RatingSummary {
    pub count: u32,
    /// Mean rating to one decimal place; zero when there are no reviews.
    pub average: Decimal,
    /// Review counts for 1..=5 stars, index 0 is one star.
    pub distribution: [u32; 5],
}

impl RatingSummary {
    pub fn from_reviews<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> Self {
        let mut summary = Self::default();
        let mut sum = 0u32;
        for review in reviews {
            let stars = review.rating.value();
            summary.count += 1;
            sum += u32::from(stars);
            if let Some(slot) = summary.distribution.get_mut(usize::from(stars - 1)) {
                *slot += 1;
            }
        }
        if summary.count > 0 {
            summary.average = (Decimal::from(sum) / Decimal::from(summary.count)).round_dp(1);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_summary() {
        let product = Uuid::new_v4();
        let reviews: Vec<Review> = [5, 4, 4, 1]
            .iter()
            .map(|r| Review::submit(product, "A", "a@b.co", Rating::new(*r).unwrap(), "ok"))
            .collect();
        let summary = RatingSummary::from_reviews(&reviews);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.average, Decimal::new(35, 1));
        assert_eq!(summary.distribution, [1, 0, 0, 2, 1]);
    }

    #[test]
    fn test_empty_summary() {
        let summary = RatingSummary::from_reviews(&[]);
        assert_eq!(summary.count, 0);
        assert!(summary.average.is_zero());
    }
}
