use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::require_id;
use crate::ApiClient;
use crate::error::ApiError;

/// A customer review of a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Review ID.
    pub id: String,
    /// Reviewed worker.
    pub worker_id: String,
    /// Booking the review is about.
    #[serde(default)]
    pub booking_id: Option<String>,
    /// Name shown next to the review.
    #[serde(default)]
    pub author_name: Option<String>,
    /// From 1 to 5.
    pub rating: u8,
    /// Review text.
    pub comment: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A review about to be posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    /// Reviewed worker.
    pub worker_id: String,
    /// Booking the review is about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    /// From 1 to 5.
    pub rating: u8,
    /// Review text.
    pub comment: String,
}

impl NewReview {
    /// Checks the review before it is sent.
    pub fn validate(&self) -> Result<(), ApiError> {
        require_id("worker", &self.worker_id)?;

        if !(1..=5).contains(&self.rating) {
            return Err(ApiError::Validation(
                "Rating must be between 1 and 5.".to_string(),
            ));
        }
        if self.comment.trim().is_empty() {
            return Err(ApiError::Validation("Please write a comment.".to_string()));
        }

        Ok(())
    }
}

/// Mean rating of `reviews`, `None` when there is none.
#[must_use]
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    let (total, count) = reviews.iter().fold((0_u32, 0_u32), |(total, count), review| {
        (total + u32::from(review.rating), count + 1)
    });

    (count > 0).then(|| f64::from(total) / f64::from(count))
}

/// Review endpoints, see [`ApiClient::reviews`].
pub struct Reviews<'a> {
    pub(crate) client: &'a ApiClient,
}

impl ApiClient {
    /// Review endpoints.
    #[must_use]
    pub const fn reviews(&self) -> Reviews<'_> {
        Reviews { client: self }
    }
}

impl Reviews<'_> {
    /// Reviews of a worker, newest first.
    pub async fn for_worker(&self, worker_id: &str) -> Result<Vec<Review>, ApiError> {
        let worker_id = require_id("worker", worker_id)?;

        self.client
            .get(&format!("/workers/{worker_id}/reviews"))
            .query("sort", "-createdAt")
            .call()
            .await
    }

    /// Post a review.
    ///
    /// # Example
    /// ```rust,ignore
    /// let review = client
    ///     .reviews()
    ///     .create(&NewReview {
    ///         worker_id: "worker_42".to_string(),
    ///         booking_id: Some("booking_7".to_string()),
    ///         rating: 5,
    ///         comment: "On time and spotless.".to_string(),
    ///     })
    ///     .await?;
    /// ```
    pub async fn create(&self, review: &NewReview) -> Result<Review, ApiError> {
        review.validate()?;

        self.client.post("/reviews").json(review).call().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: format!("review_{rating}"),
            worker_id: "worker_42".to_string(),
            booking_id: None,
            author_name: None,
            rating,
            comment: "ok".to_string(),
            created_at: "2026-10-01T10:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn average_of_ratings() {
        assert_eq!(average_rating(&[]), None);
        assert_eq!(average_rating(&[review(5), review(4)]), Some(4.5));
    }

    #[test]
    fn rating_must_be_in_range() {
        let mut new_review = NewReview {
            worker_id: "worker_42".to_string(),
            booking_id: None,
            rating: 0,
            comment: "Great job".to_string(),
        };
        assert!(matches!(new_review.validate(), Err(ApiError::Validation(_))));

        new_review.rating = 6;
        assert!(new_review.validate().is_err());

        new_review.rating = 5;
        assert!(new_review.validate().is_ok());

        new_review.comment = " ".to_string();
        assert!(new_review.validate().is_err());
    }
}
