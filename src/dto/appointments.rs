use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentSlot, AppointmentStatus, AppointmentType, Profile};

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookAppointmentRequest {
    pub slot_id: Uuid,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

/// Appointment joined with its slot and, for back-office listings, the customer.
#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentEntry {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub slot: Option<AppointmentSlot>,
    pub customer: Option<Profile>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentList {
    pub items: Vec<AppointmentEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSlotRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateSlotsRequest {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GeneratedSlots {
    pub date: NaiveDate,
    /// Slots inserted; times that already existed are left untouched.
    pub created: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSlotRequest {
    pub is_available: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotList {
    pub items: Vec<AppointmentSlot>,
}
