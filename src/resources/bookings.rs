use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Page, require_id};
use crate::ApiClient;
use crate::error::ApiError;

/// Longest booking accepted in a single request, in hours.
pub const MAX_BOOKING_HOURS: f64 = 24.0;

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Waiting for the worker to accept.
    Pending,
    /// Accepted by the worker.
    Confirmed,
    /// The worker is on site.
    InProgress,
    /// Done.
    Completed,
    /// Cancelled by either side.
    Cancelled,
}

impl BookingStatus {
    /// Wire name, as used in query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A booking as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking ID.
    pub id: String,
    /// ID of the booked worker.
    pub worker_id: String,
    /// ID of the customer who booked.
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Booked service (`cleaning`, `plumbing`...).
    pub service: String,
    /// Start of the appointment.
    pub scheduled_at: DateTime<Utc>,
    /// Booked duration.
    pub hours: f64,
    /// Worker rate at booking time.
    pub hourly_rate: f64,
    /// `hourly_rate × hours`, as charged.
    pub total_cost: f64,
    /// Current state.
    pub status: BookingStatus,
    /// Where the service takes place.
    pub address: String,
    /// Free-form instructions for the worker.
    #[serde(default)]
    pub notes: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A booking about to be created.
///
/// # Example
/// ```rust,ignore
/// let draft = BookingDraft {
///     worker_id: "worker_42".to_string(),
///     service: "cleaning".to_string(),
///     scheduled_at: "2026-11-02T09:00:00Z".parse()?,
///     hours: 3.0,
///     hourly_rate: 25.0,
///     address: "12 Rue des Lilas, Lyon".to_string(),
///     notes: None,
/// };
///
/// assert_eq!(draft.total_cost(), 75.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    /// ID of the worker to book.
    pub worker_id: String,
    /// Service to book.
    pub service: String,
    /// Start of the appointment.
    pub scheduled_at: DateTime<Utc>,
    /// Duration, in hours.
    pub hours: f64,
    /// Worker hourly rate shown to the customer.
    pub hourly_rate: f64,
    /// Where the service takes place.
    pub address: String,
    /// Free-form instructions for the worker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl BookingDraft {
    /// Checks the draft before it is sent.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.worker_id.trim().is_empty() {
            return Err(ApiError::Validation("Please select a worker.".to_string()));
        }
        if self.service.trim().is_empty() {
            return Err(ApiError::Validation("Please select a service.".to_string()));
        }
        if self.address.trim().is_empty() {
            return Err(ApiError::Validation("Address is required.".to_string()));
        }
        if !self.hours.is_finite() || self.hours <= 0.0 || self.hours > MAX_BOOKING_HOURS {
            return Err(ApiError::Validation(format!(
                "Duration must be between 0 and {MAX_BOOKING_HOURS} hours."
            )));
        }
        if !self.hourly_rate.is_finite() || self.hourly_rate <= 0.0 {
            return Err(ApiError::Validation(
                "Hourly rate must be greater than 0.".to_string(),
            ));
        }

        Ok(())
    }

    /// `hourly_rate × hours`, rounded to cents.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        (self.hourly_rate * self.hours * 100.0).round() / 100.0
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBookingBody<'a> {
    #[serde(flatten)]
    draft: &'a BookingDraft,
    total_cost: f64,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// Booking endpoints, see [`ApiClient::bookings`].
pub struct Bookings<'a> {
    pub(crate) client: &'a ApiClient,
}

impl ApiClient {
    /// Booking endpoints.
    #[must_use]
    pub const fn bookings(&self) -> Bookings<'_> {
        Bookings { client: self }
    }
}

impl Bookings<'_> {
    /// Create a booking. The draft is validated first and sent with its total cost.
    ///
    /// A booking is never re-sent after a network error, so a timeout may
    /// leave it created on the server; list the bookings to find out.
    ///
    /// # Example
    /// ```rust,ignore
    /// let booking = client.bookings().create(&draft).await?;
    /// assert_eq!(booking.status, BookingStatus::Pending);
    /// ```
    pub async fn create(&self, draft: &BookingDraft) -> Result<Booking, ApiError> {
        draft.validate()?;

        self.client
            .post("/bookings")
            .json(&CreateBookingBody {
                draft,
                total_cost: draft.total_cost(),
            })
            .call()
            .await
    }

    /// Bookings of the logged-in user, optionally restricted to one status.
    ///
    /// # Arguments
    /// * `status` - Only return bookings in this state, or all of them with `None`.
    ///
    /// # Returns
    /// The first [`Page`] of matching bookings.
    ///
    /// # Example
    /// ```rust,ignore
    /// let upcoming = client
    ///     .bookings()
    ///     .list(Some(BookingStatus::Confirmed))
    ///     .await?;
    ///
    /// for booking in upcoming.items {
    ///     println!("{} on {}", booking.service, booking.scheduled_at);
    /// }
    /// ```
    pub async fn list(&self, status: Option<BookingStatus>) -> Result<Page<Booking>, ApiError> {
        let request = self.client.get("/bookings");

        let request = match status {
            Some(status) => request.query("status", status.as_str()),
            None => request,
        };

        request.call().await
    }

    /// Fetch a single booking.
    pub async fn get(&self, booking_id: &str) -> Result<Booking, ApiError> {
        let booking_id = require_id("booking", booking_id)?;

        self.client.get(&format!("/bookings/{booking_id}")).call().await
    }

    /// Move a booking to `status`.
    pub async fn update_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<Booking, ApiError> {
        let booking_id = require_id("booking", booking_id)?;

        self.client
            .patch(&format!("/bookings/{booking_id}/status"))
            .json(&StatusBody {
                status,
                reason: None,
            })
            .call()
            .await
    }

    /// Cancel a booking, optionally telling the other side why.
    pub async fn cancel(&self, booking_id: &str, reason: Option<&str>) -> Result<Booking, ApiError> {
        let booking_id = require_id("booking", booking_id)?;

        self.client
            .patch(&format!("/bookings/{booking_id}/status"))
            .json(&StatusBody {
                status: BookingStatus::Cancelled,
                reason: reason.map(str::trim).filter(|reason| !reason.is_empty()),
            })
            .call()
            .await
    }
}
