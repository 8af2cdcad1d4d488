use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Address, Profile};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddressInput {
    pub label: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub street_2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressList {
    pub items: Vec<Address>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerList {
    pub items: Vec<Profile>,
}
