//! `check_appointment_availability` and `schedule_appointment`

use serde::Deserialize;
use serde_json::{json, Value};

use super::store::{Booking, BookingRequest, DealershipStore};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AvailabilityParams {
    pub dealership_id: String,
    pub date: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleParams {
    pub user_id: String,
    pub dealership_id: String,
    pub date: String,
    pub time: String,
    pub car_model: String,
}

pub async fn check_appointment_availability(
    store: &DealershipStore,
    params: AvailabilityParams,
) -> Value {
    let slots = store
        .available_slots(&params.dealership_id, &params.date)
        .await;
    json!({
        "dealership": params.dealership_id,
        "date": params.date,
        "available_slots": slots,
    })
}

/// A taken or unknown slot is a normal answer (`status: "failed"`), not an error.
pub async fn schedule_appointment(store: &DealershipStore, params: ScheduleParams) -> Value {
    let time = params.time.clone();
    let request = BookingRequest {
        user_id: params.user_id,
        dealership_id: params.dealership_id,
        date: params.date,
        time: params.time,
        car_model: params.car_model,
    };

    match store.book(request).await {
        Booking::Confirmed {
            appointment_id,
            appointment,
        } => json!({
            "status": "success",
            "appointment_id": appointment_id,
            "details": appointment,
        }),
        Booking::SlotUnavailable => json!({
            "status": "failed",
            "message": format!("Time slot {time} not available"),
        }),
    }
}
