//! In-memory dealership and appointment fixture.
//!
//! Slot lists are guarded per (dealership, date) key, so two concurrent
//! bookings for the same slot are serialized and only one can win.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Address record returned by `get_dealership_address`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dealership {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub hours: String,
}

impl Dealership {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
        hours: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            phone: phone.into(),
            hours: hours.into(),
        }
    }
}

/// A booked test drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub user_id: String,
    pub dealership_id: String,
    pub date: String,
    pub time: String,
    pub car_model: String,
    pub status: String,
}

/// Requested booking
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub user_id: String,
    pub dealership_id: String,
    pub date: String,
    pub time: String,
    pub car_model: String,
}

/// Outcome of [`DealershipStore::book`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Booking {
    Confirmed {
        appointment_id: String,
        appointment: Appointment,
    },
    SlotUnavailable,
}

type SlotKey = (String, String);

/// Dealerships, open slots and booked appointments
#[derive(Debug, Default)]
pub struct DealershipStore {
    dealerships: HashMap<String, Dealership>,
    slots: HashMap<SlotKey, Mutex<Vec<String>>>,
    appointments: Mutex<Vec<(String, Appointment)>>,
}

impl DealershipStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// The demo data set served by the binary
    pub fn reference() -> Self {
        Self::new()
            .with_dealership(Dealership::new(
                "sc-001",
                "SuperCar Downtown",
                "123 Market Street, San Francisco, CA 94105",
                "(415) 555-0100",
                "Mon-Sat 9:00-19:00",
            ))
            .with_dealership(Dealership::new(
                "sc-002",
                "SuperCar Westside",
                "4500 Ocean Avenue, Los Angeles, CA 90066",
                "(310) 555-0142",
                "Mon-Sun 10:00-18:00",
            ))
            .with_dealership(Dealership::new(
                "sc-003",
                "SuperCar Lakeshore",
                "800 N Lake Shore Drive, Chicago, IL 60611",
                "(312) 555-0187",
                "Mon-Fri 9:00-20:00",
            ))
            .with_slots("sc-001", "2025-06-01", ["09:00", "10:00", "11:00", "14:00", "16:00"])
            .with_slots("sc-001", "2025-06-02", ["10:00", "13:00", "15:00"])
            .with_slots("sc-002", "2025-06-01", ["11:00", "12:00", "17:00"])
            .with_slots("sc-003", "2025-06-03", ["09:30", "14:30"])
    }

    /// Register a dealership (ids are stored lowercase)
    pub fn with_dealership(mut self, mut dealership: Dealership) -> Self {
        dealership.id = dealership.id.to_lowercase();
        self.dealerships.insert(dealership.id.clone(), dealership);
        self
    }

    /// Set the open slots for a dealership on a date
    pub fn with_slots<I, S>(mut self, dealership_id: &str, date: &str, times: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let times = times.into_iter().map(Into::into).collect();
        self.slots
            .insert((dealership_id.to_string(), date.to_string()), Mutex::new(times));
        self
    }

    /// Case-insensitive dealership lookup
    pub fn dealership(&self, dealership_id: &str) -> Option<&Dealership> {
        self.dealerships.get(&dealership_id.to_lowercase())
    }

    /// Open slots, in order; empty for unknown dealership/date pairs
    pub async fn available_slots(&self, dealership_id: &str, date: &str) -> Vec<String> {
        match self.slots.get(&(dealership_id.to_string(), date.to_string())) {
            Some(slots) => slots.lock().await.clone(),
            None => Vec::new(),
        }
    }

    /// Book a slot if it is still open.
    ///
    /// The slot list stays locked from the availability check until the slot
    /// is removed.
    pub async fn book(&self, request: BookingRequest) -> Booking {
        let key = (request.dealership_id.clone(), request.date.clone());
        let Some(slots) = self.slots.get(&key) else {
            return Booking::SlotUnavailable;
        };

        let mut slots = slots.lock().await;
        let Some(pos) = slots.iter().position(|t| *t == request.time) else {
            return Booking::SlotUnavailable;
        };

        let mut appointments = self.appointments.lock().await;
        let appointment_id = format!("apt-{}", appointments.len() + 1);
        let appointment = Appointment {
            user_id: request.user_id,
            dealership_id: request.dealership_id,
            date: request.date,
            time: request.time,
            car_model: request.car_model,
            status: "confirmed".to_string(),
        };
        appointments.push((appointment_id.clone(), appointment.clone()));
        slots.remove(pos);

        Booking::Confirmed {
            appointment_id,
            appointment,
        }
    }

    /// Snapshot of booked appointments in booking order
    pub async fn appointments(&self) -> Vec<(String, Appointment)> {
        self.appointments.lock().await.clone()
    }
}
