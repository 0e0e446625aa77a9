use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::{ReservationSink, ScheduleSource};
use crate::clock::Clock;
use crate::types::{
    BusinessHours, CreateReservationPayload, Reservation, ReservationStatus, User, UserRole,
};

#[derive(Debug, Clone)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn sample_user() -> User {
    User {
        id: Some(Uuid::new_v4()),
        name: "Ana".into(),
        email: "ana@example.com".into(),
        role: UserRole::Customer,
        phone: Some("555-0100".into()),
    }
}

pub fn hours_open(day_of_week: u32, open: &str, close: &str) -> BusinessHours {
    BusinessHours {
        id: Uuid::new_v4(),
        business_id: Uuid::new_v4(),
        day_of_week,
        open_time: Some(open.into()),
        close_time: Some(close.into()),
        is_closed: false,
    }
}

pub fn hours_closed(day_of_week: u32) -> BusinessHours {
    BusinessHours {
        id: Uuid::new_v4(),
        business_id: Uuid::new_v4(),
        day_of_week,
        open_time: Some("09:00".into()),
        close_time: Some("18:00".into()),
        is_closed: true,
    }
}

pub fn sample_business_hours(business_id: Uuid) -> BusinessHours {
    BusinessHours {
        business_id,
        ..hours_open(1, "09:00", "18:00")
    }
}

pub struct MockScheduleSourceInner {
    pub calls_to_business_hours: AtomicU64,
    pub hours: Mutex<Vec<BusinessHours>>,
}

#[derive(Clone)]
pub struct MockScheduleSource(pub Arc<MockScheduleSourceInner>);

impl MockScheduleSource {
    pub fn new(hours: Vec<BusinessHours>) -> Self {
        Self(Arc::new(MockScheduleSourceInner {
            calls_to_business_hours: AtomicU64::default(),
            hours: Mutex::new(hours),
        }))
    }
}

impl ScheduleSource for MockScheduleSource {
    async fn business_hours(&self, _business_id: Uuid) -> Result<Vec<BusinessHours>, String> {
        self.0
            .calls_to_business_hours
            .fetch_add(1, Ordering::SeqCst);
        Ok(self.0.hours.lock().unwrap().clone())
    }
}

pub struct MockReservationSinkInner {
    pub success: AtomicBool,
    pub calls_to_create_reservation: AtomicU64,
    pub last_payload: Mutex<Option<CreateReservationPayload>>,
}

#[derive(Clone)]
pub struct MockReservationSink(pub Arc<MockReservationSinkInner>);

impl MockReservationSink {
    pub fn new() -> Self {
        Self(Arc::new(MockReservationSinkInner {
            success: AtomicBool::new(true),
            calls_to_create_reservation: AtomicU64::default(),
            last_payload: Mutex::default(),
        }))
    }
}

impl ReservationSink for MockReservationSink {
    async fn create_reservation(
        &self,
        payload: CreateReservationPayload,
    ) -> Result<Reservation, String> {
        self.0
            .calls_to_create_reservation
            .fetch_add(1, Ordering::SeqCst);
        *self.0.last_payload.lock().unwrap() = Some(payload.clone());

        if !self.0.success.load(Ordering::SeqCst) {
            return Err("Supposed to fail".into());
        }
        Ok(Reservation {
            id: Uuid::new_v4(),
            business_id: payload.business_id,
            user_id: Uuid::new_v4(),
            start_time: payload.start_time,
            end_time: payload.end_time,
            number_of_people: payload.number_of_people,
            status: ReservationStatus::Pending,
            active: true,
            created_at: payload.start_time,
            users: None,
            reservation_cancellations: None,
        })
    }
}
