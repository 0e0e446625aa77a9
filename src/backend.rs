use crate::types::{BusinessHours, CreateReservationPayload, Reservation};
use uuid::Uuid;

/// Supplies a business's weekly operating-hours rows, at most one per
/// day-of-week. The availability resolver looks the day up by index.
#[allow(async_fn_in_trait)]
pub trait ScheduleSource: Clone + Send + Sync + 'static {
    async fn business_hours(&self, business_id: Uuid) -> Result<Vec<BusinessHours>, String>;
}

/// Accepts a validated reservation window. One create request per
/// submission, no client-side retry.
#[allow(async_fn_in_trait)]
pub trait ReservationSink: Clone + Send + Sync + 'static {
    async fn create_reservation(
        &self,
        payload: CreateReservationPayload,
    ) -> Result<Reservation, String>;
}
