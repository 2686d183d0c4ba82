//! `get_dealership_address`

use serde::Deserialize;
use serde_json::{json, Value};

use super::store::DealershipStore;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressParams {
    pub dealership_id: String,
}

/// Address record, or `{"error": "Dealership not found"}`
pub async fn get_dealership_address(store: &DealershipStore, params: AddressParams) -> Value {
    match store.dealership(&params.dealership_id) {
        Some(dealership) => json!(dealership),
        None => json!({ "error": "Dealership not found" }),
    }
}
