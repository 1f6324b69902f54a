//! Response records returned by the address verification service.

use serde::{Deserialize, Serialize};

use crate::address::AddressId;

/// Corrected street address block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressBlock {
    pub postal_code: String,
    pub city: String,
    pub street_name: String,
    pub street_number: String,
    pub street_number_addition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonBlock {
    pub first_name: String,
    pub last_name: String,
}

/// Numbered delivery point: post office, parcel station or postal box.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryPoint {
    pub number: String,
    pub postal_code: String,
    pub city: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkReceiver {
    pub name: String,
    pub postal_code: String,
    pub city: String,
}

/// Address category as resolved by the verification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressSubtype {
    Street,
    PostOffice,
    ParcelStation,
    PostalBox,
    BulkReceiver,
}

impl AddressSubtype {
    /// Street-name substitute for numbered delivery points.
    pub fn street_label(&self) -> Option<&'static str> {
        match self {
            Self::ParcelStation => Some("Packstation"),
            Self::PostOffice => Some("Postfiliale"),
            Self::PostalBox => Some("Postfach"),
            Self::Street | Self::BulkReceiver => None,
        }
    }
}

/// One record of a verification response, keyed by the echoed correlation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub record_id: AddressId,
    #[serde(default)]
    pub address: Option<AddressBlock>,
    #[serde(default)]
    pub person: Option<PersonBlock>,
    #[serde(default)]
    pub post_office: Option<DeliveryPoint>,
    #[serde(default)]
    pub parcel_station: Option<DeliveryPoint>,
    #[serde(default)]
    pub postal_box: Option<DeliveryPoint>,
    #[serde(default)]
    pub bulk_receiver: Option<BulkReceiver>,
    #[serde(default)]
    pub status_codes: Vec<String>,
}

impl VerificationRecord {
    /// A bare record carrying only an id and codes.
    pub fn new(record_id: AddressId, status_codes: Vec<String>) -> Self {
        Self {
            record_id,
            address: None,
            person: None,
            post_office: None,
            parcel_station: None,
            postal_box: None,
            bulk_receiver: None,
            status_codes,
        }
    }

    /// Resolved subtype. At most one subtype block is expected; if several
    /// are populated, parcel station wins, then post office, postal box and
    /// bulk receiver.
    pub fn subtype(&self) -> AddressSubtype {
        if self.parcel_station.is_some() {
            AddressSubtype::ParcelStation
        } else if self.post_office.is_some() {
            AddressSubtype::PostOffice
        } else if self.postal_box.is_some() {
            AddressSubtype::PostalBox
        } else if self.bulk_receiver.is_some() {
            AddressSubtype::BulkReceiver
        } else {
            AddressSubtype::Street
        }
    }

    /// The numbered delivery point matching [`subtype`](Self::subtype), if any.
    pub fn delivery_point(&self) -> Option<&DeliveryPoint> {
        match self.subtype() {
            AddressSubtype::ParcelStation => self.parcel_station.as_ref(),
            AddressSubtype::PostOffice => self.post_office.as_ref(),
            AddressSubtype::PostalBox => self.postal_box.as_ref(),
            AddressSubtype::Street | AddressSubtype::BulkReceiver => None,
        }
    }
}
