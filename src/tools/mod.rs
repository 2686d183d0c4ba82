//! Tool registry, reference tools and the executor.
//!
//! Tools are identified by the closed [`ToolName`] enum. Every variant maps to
//! exactly one handler and one [`ToolSchema`] through exhaustive `match`es, so
//! a tool cannot be advertised without being callable (or the reverse). String
//! names from the model are resolved once, at the executor boundary.

use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::ToolSchema;

mod appointment;
mod dealership;
mod executor;
pub mod store;
mod weather;

pub use executor::{ToolExecutor, ToolResult};
pub use store::{Appointment, Dealership, DealershipStore};

/// The tools this engine can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    GetWeather,
    GetDealershipAddress,
    CheckAppointmentAvailability,
    ScheduleAppointment,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::GetWeather,
        ToolName::GetDealershipAddress,
        ToolName::CheckAppointmentAvailability,
        ToolName::ScheduleAppointment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetWeather => "get_weather",
            Self::GetDealershipAddress => "get_dealership_address",
            Self::CheckAppointmentAvailability => "check_appointment_availability",
            Self::ScheduleAppointment => "schedule_appointment",
        }
    }

    /// Parameter schema advertised to the model
    pub fn schema(&self) -> ToolSchema {
        match self {
            Self::GetWeather => ToolSchema::function(
                self.as_str(),
                "Gets weather information for a city",
                json!({
                    "type": "object",
                    "properties": {
                        "city": {"type": "string", "description": "The city name"}
                    },
                    "required": ["city"]
                }),
            ),
            Self::GetDealershipAddress => ToolSchema::function(
                self.as_str(),
                "Returns address for a dealership",
                json!({
                    "type": "object",
                    "properties": {
                        "dealership_id": {"type": "string", "description": "Dealership ID"}
                    },
                    "required": ["dealership_id"]
                }),
            ),
            Self::CheckAppointmentAvailability => ToolSchema::function(
                self.as_str(),
                "Checks available test drive slots",
                json!({
                    "type": "object",
                    "properties": {
                        "dealership_id": {"type": "string"},
                        "date": {"type": "string", "format": "date"}
                    },
                    "required": ["dealership_id", "date"]
                }),
            ),
            Self::ScheduleAppointment => ToolSchema::function(
                self.as_str(),
                "Books a test drive appointment",
                json!({
                    "type": "object",
                    "properties": {
                        "user_id": {"type": "string"},
                        "dealership_id": {"type": "string"},
                        "date": {"type": "string", "format": "date"},
                        "time": {"type": "string"},
                        "car_model": {"type": "string"}
                    },
                    "required": ["user_id", "dealership_id", "date", "time", "car_model"]
                }),
            ),
        }
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide tool table. Read-only once built; share it behind an `Arc`.
#[derive(Debug)]
pub struct ToolRegistry {
    schemas: Vec<ToolSchema>,
    store: Arc<DealershipStore>,
}

impl ToolRegistry {
    /// Registry over the given data store
    pub fn new(store: Arc<DealershipStore>) -> Self {
        Self {
            schemas: ToolName::ALL.iter().map(ToolName::schema).collect(),
            store,
        }
    }

    /// Registry over [`DealershipStore::reference`]
    pub fn with_reference_tools() -> Self {
        Self::new(Arc::new(DealershipStore::reference()))
    }

    /// All tool schemas, in [`ToolName::ALL`] order
    pub fn schemas(&self) -> &[ToolSchema] {
        &self.schemas
    }

    pub fn store(&self) -> &Arc<DealershipStore> {
        &self.store
    }

    pub fn resolve(&self, name: &str) -> Result<ToolName, ToolError> {
        name.parse()
    }

    /// Run a tool with already-parsed arguments
    pub async fn dispatch(&self, tool: ToolName, arguments: Value) -> Result<Value, ToolError> {
        let store = self.store.as_ref();
        let output = match tool {
            ToolName::GetWeather => {
                let report = weather::get_weather(params(tool, arguments)?).await;
                json!(report)
            }
            ToolName::GetDealershipAddress => {
                dealership::get_dealership_address(store, params(tool, arguments)?).await
            }
            ToolName::CheckAppointmentAvailability => {
                appointment::check_appointment_availability(store, params(tool, arguments)?).await
            }
            ToolName::ScheduleAppointment => {
                appointment::schedule_appointment(store, params(tool, arguments)?).await
            }
        };
        Ok(output)
    }
}

fn params<T: DeserializeOwned>(tool: ToolName, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}
