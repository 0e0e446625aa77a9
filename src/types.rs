use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    /// Wall-clock "HH:MM", 00:00..=23:59.
    pub static ref TIME_REGEX: Regex = Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Customer,
    BusinessOwner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
}

/// Token plus the profile it belongs to, as persisted by the session store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// One day's operating-hours row for a business. At most one row per
/// `(business_id, day_of_week)`; `open_time`/`close_time` are "HH:MM" and
/// only authoritative when the day is not closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub id: Uuid,
    pub business_id: Uuid,
    pub day_of_week: u32,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub is_closed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessCategory {
    pub id: Uuid,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_categories: Option<BusinessCategoryRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessCategoryRef {
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessDetail {
    #[serde(flatten)]
    pub summary: BusinessSummary,
    pub business_hours: Vec<BusinessHours>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationCancellation {
    pub reason: String,
    pub cancelled_by: String,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub business_id: Uuid,
    pub user_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub number_of_people: u32,
    pub status: ReservationStatus,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<ReservationUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_cancellations: Option<Vec<ReservationCancellation>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignInPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignUpPayload {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1))]
    pub phone: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInResponse {
    pub user: SignInUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCodePayload {
    pub user_id: Uuid,
    pub code: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCodeResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationPayload {
    pub business_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(range(min = 1, max = 8))]
    pub number_of_people: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CancelReservationPayload {
    #[validate(length(min = 1))]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertBusinessPayload {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub phone: String,
    #[validate(email)]
    pub email: String,
    pub category_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBusinessHoursPayload {
    #[validate(regex(path = *TIME_REGEX))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_time: Option<String>,
    #[validate(regex(path = *TIME_REGEX))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_time: Option<String>,
    pub is_closed: bool,
}
