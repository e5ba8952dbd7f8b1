use serde::{Deserialize, Serialize};

use super::{Page, require_id};
use crate::ApiClient;
use crate::error::ApiError;

/// A worker profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    /// Worker ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Services offered (`cleaning`, `plumbing`, `electrical`...).
    #[serde(default)]
    pub services: Vec<String>,
    /// Price of one hour of work.
    pub hourly_rate: f64,
    /// Average review rating, if reviewed at least once.
    #[serde(default)]
    pub rating: Option<f64>,
    /// Number of reviews.
    #[serde(default)]
    pub review_count: u32,
    /// City the worker operates in.
    #[serde(default)]
    pub city: Option<String>,
    /// Self-description.
    #[serde(default)]
    pub bio: Option<String>,
    /// Whether the worker currently accepts bookings.
    #[serde(default)]
    pub available: bool,
}

/// Partial worker profile, only the set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New self-description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// New hourly rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    /// New list of services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
    /// New city.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// New availability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl ProfileUpdate {
    /// Checks the update before it is sent.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ApiError::Validation("Name cannot be empty.".to_string()));
        }
        if self
            .hourly_rate
            .is_some_and(|rate| !rate.is_finite() || rate <= 0.0)
        {
            return Err(ApiError::Validation(
                "Hourly rate must be greater than 0.".to_string(),
            ));
        }
        if self.services.as_ref().is_some_and(Vec::is_empty) {
            return Err(ApiError::Validation(
                "At least one service is required.".to_string(),
            ));
        }

        Ok(())
    }
}

/// Worker endpoints, see [`ApiClient::workers`].
pub struct Workers<'a> {
    pub(crate) client: &'a ApiClient,
}

impl ApiClient {
    /// Worker endpoints.
    #[must_use]
    pub const fn workers(&self) -> Workers<'_> {
        Workers { client: self }
    }
}

/// Builder for a filtered, paginated worker search, see [`Workers::list`].
pub struct WorkersListBuilder<'a> {
    client: &'a ApiClient,
    service: Option<&'a str>,
    city: Option<&'a str>,
    min_rating: Option<f64>,
    sort: Option<&'a str>,
    page: Option<u32>,
    per_page: Option<u32>,
}

impl<'a> Workers<'a> {
    /// Search workers.
    ///
    /// # Example
    /// ```rust,ignore
    /// let plumbers = client
    ///     .workers()
    ///     .list()
    ///     .service("plumbing")
    ///     .city("Lyon")
    ///     .min_rating(4.0)
    ///     .sort("-rating")
    ///     .call()
    ///     .await?;
    ///
    /// for worker in plumbers.items {
    ///     println!("{} ({:?})", worker.name, worker.rating);
    /// }
    /// ```
    #[must_use]
    pub const fn list(&self) -> WorkersListBuilder<'a> {
        WorkersListBuilder {
            client: self.client,
            service: None,
            city: None,
            min_rating: None,
            sort: None,
            page: None,
            per_page: None,
        }
    }

    /// Fetch a single worker.
    ///
    /// # Arguments
    /// * `worker_id` - The ID of the worker, without path separators or query characters.
    ///
    /// # Returns
    /// The [`Worker`], or [`ApiError::Client`] with status 404 when it does not exist.
    ///
    /// # Example
    /// ```rust,ignore
    /// let worker = client.workers().get("worker_42").await?;
    ///
    /// println!("{} charges {} per hour", worker.name, worker.hourly_rate);
    /// ```
    pub async fn get(&self, worker_id: &str) -> Result<Worker, ApiError> {
        let worker_id = require_id("worker", worker_id)?;

        self.client.get(&format!("/workers/{worker_id}")).call().await
    }

    /// Update the profile of a worker with the fields set in `update`.
    pub async fn update_profile(
        &self,
        worker_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Worker, ApiError> {
        let worker_id = require_id("worker", worker_id)?;
        update.validate()?;

        self.client
            .patch(&format!("/workers/{worker_id}"))
            .json(update)
            .call()
            .await
    }
}

impl<'a> WorkersListBuilder<'a> {
    /// Only workers offering `service`.
    pub const fn service(mut self, service: &'a str) -> Self {
        self.service = Some(service);
        self
    }

    /// Only workers operating in `city`.
    pub const fn city(mut self, city: &'a str) -> Self {
        self.city = Some(city);
        self
    }

    /// Only workers rated at least `rating`.
    pub const fn min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    /// Specify the order attribute(s).
    /// Add `-`/`+` (default) in front of the attribute for DESC / ASC order.
    ///
    /// # Example
    /// ```rust,ignore
    /// .sort("-rating,hourlyRate") // DESC by rating, ASC by rate
    /// ```
    pub const fn sort(mut self, sort: &'a str) -> Self {
        self.sort = Some(sort);
        self
    }

    /// The page (aka. offset) of the paginated list (default to 1).
    pub const fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the max returned workers per page.
    pub const fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Execute the search.
    pub async fn call(self) -> Result<Page<Worker>, ApiError> {
        if self.page == Some(0) {
            return Err(ApiError::Validation("Pages start at 1.".to_string()));
        }
        if self
            .min_rating
            .is_some_and(|rating| !(0.0..=5.0).contains(&rating))
        {
            return Err(ApiError::Validation(
                "Minimum rating must be between 0 and 5.".to_string(),
            ));
        }

        let mut request = self.client.get("/workers");

        if let Some(service) = self.service {
            request = request.query("service", service);
        }
        if let Some(city) = self.city {
            request = request.query("city", city);
        }
        if let Some(rating) = self.min_rating {
            request = request.query("minRating", rating);
        }
        if let Some(sort) = self.sort {
            request = request.query("sort", sort);
        }
        if let Some(page) = self.page {
            request = request.query("page", page);
        }
        if let Some(per_page) = self.per_page {
            request = request.query("perPage", per_page);
        }

        request.call().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_update_only_sends_set_fields() {
        let update = ProfileUpdate {
            hourly_rate: Some(40.0),
            available: Some(false),
            ..ProfileUpdate::default()
        };

        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"hourlyRate": 40.0, "available": false})
        );
    }

    #[test]
    fn profile_update_validation() {
        assert!(ProfileUpdate::default().validate().is_ok());

        let invalid = [
            ProfileUpdate {
                name: Some("  ".to_string()),
                ..ProfileUpdate::default()
            },
            ProfileUpdate {
                hourly_rate: Some(0.0),
                ..ProfileUpdate::default()
            },
            ProfileUpdate {
                services: Some(Vec::new()),
                ..ProfileUpdate::default()
            },
        ];

        for update in invalid {
            assert!(matches!(update.validate(), Err(ApiError::Validation(_))));
        }
    }
}
