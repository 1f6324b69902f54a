//! Shipping addresses, orders, and the request shape sent to the verification service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable address identifier. Doubles as the cache key and the correlation
/// key echoed back by the verification service.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AddressId(pub u64);

impl fmt::Display for AddressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A shipping address as owned by the order subsystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub country_code: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub street_name: String,
    #[serde(default)]
    pub street_number: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Address {
    /// Whether the address lies in one of the given countries (ISO codes, case-insensitive).
    pub fn is_domestic(&self, countries: &[String]) -> bool {
        countries
            .iter()
            .any(|c| c.eq_ignore_ascii_case(self.country_code.trim()))
    }

    /// Street name and number joined by a single space.
    pub fn street_line(&self) -> String {
        format!("{} {}", self.street_name.trim(), self.street_number.trim())
            .trim()
            .to_string()
    }
}

/// An order together with its current shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub shipping_address: Address,
}

/// One entry of a batched verification call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    /// Correlation key; the service echoes it as `record_id`.
    pub record_id: AddressId,
    pub country_code: String,
    pub postal_code: String,
    pub city: String,
    pub street_name: String,
    pub street_number: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&Address> for VerificationRequest {
    fn from(address: &Address) -> Self {
        Self {
            record_id: address.id,
            country_code: address.country_code.trim().to_ascii_uppercase(),
            postal_code: address.postal_code.trim().to_string(),
            city: address.city.trim().to_string(),
            street_name: address.street_name.trim().to_string(),
            street_number: address.street_number.trim().to_string(),
            first_name: address.first_name.trim().to_string(),
            last_name: address.last_name.trim().to_string(),
        }
    }
}
