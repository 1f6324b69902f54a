//! Durable per-address analysis results.

use serde::{Deserialize, Serialize};

use crate::address::{Address, AddressId};
use crate::codes::{Verdict, classify};
use crate::filter::filter_codes;
use crate::record::VerificationRecord;

/// Separator used when status codes are stored as a single column.
pub const CODE_DELIMITER: &str = ",";

/// Last known analysis of one address. Keyed by the address id itself;
/// there is at most one result per address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub address_id: AddressId,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub postal_code: String,
    pub street: String,
    pub street_number: String,
    pub status_codes: Vec<String>,
}

impl AnalysisResult {
    /// Map a fresh verification record, filtering its codes for the resolved subtype.
    ///
    /// Numbered delivery points (parcel station, post office, postal box) use
    /// the subtype label as street and their own number, postal code and city.
    /// Bulk receivers use the receiver name as street and carry no number.
    pub fn from_record(record: &VerificationRecord) -> Self {
        let (first_name, last_name) = record
            .person
            .as_ref()
            .map(|p| (p.first_name.trim().to_string(), p.last_name.trim().to_string()))
            .unwrap_or_default();

        let subtype = record.subtype();
        let (street, street_number, postal_code, city) =
            match (subtype.street_label(), record.delivery_point()) {
                (Some(label), Some(point)) => (
                    label.to_string(),
                    point.number.trim().to_string(),
                    point.postal_code.clone(),
                    point.city.clone(),
                ),
                _ => match (&record.bulk_receiver, &record.address) {
                    (Some(receiver), _) => (
                        receiver.name.trim().to_string(),
                        String::new(),
                        receiver.postal_code.clone(),
                        receiver.city.clone(),
                    ),
                    (None, Some(address)) => (
                        address.street_name.trim().to_string(),
                        format!(
                            "{}{}",
                            address.street_number, address.street_number_addition
                        )
                        .trim()
                        .to_string(),
                        address.postal_code.clone(),
                        address.city.clone(),
                    ),
                    (None, None) => Default::default(),
                },
            };

        Self {
            address_id: record.record_id,
            first_name,
            last_name,
            city: city.trim().to_string(),
            postal_code: postal_code.trim().to_string(),
            street,
            street_number,
            status_codes: filter_codes(record),
        }
    }

    /// Verdict recomputed from the stored codes.
    pub fn verdict(&self) -> Verdict {
        classify(&self.status_codes)
    }

    /// Street line as written back to an order: name and number joined by one space.
    pub fn street_line(&self) -> String {
        format!("{} {}", self.street.trim(), self.street_number.trim())
            .trim()
            .to_string()
    }

    /// Whether the result carries enough of an address to be written back.
    pub fn has_address(&self) -> bool {
        !self.street.is_empty() && !self.city.is_empty() && !self.postal_code.is_empty()
    }

    /// Whether writing this result back would change the given address.
    pub fn differs_from(&self, address: &Address) -> bool {
        self.street_line() != address.street_line()
            || self.city != address.city.trim()
            || self.postal_code != address.postal_code.trim()
            || suggested(&self.first_name, &address.first_name) != address.first_name.trim()
            || suggested(&self.last_name, &address.last_name) != address.last_name.trim()
    }

    /// `address` with the suggested name, street, city and postal code applied.
    ///
    /// Records without a person block carry no names; the order's names are kept.
    pub fn apply_to(&self, address: &Address) -> Address {
        Address {
            id: address.id,
            country_code: address.country_code.clone(),
            postal_code: self.postal_code.clone(),
            city: self.city.clone(),
            street_name: self.street.clone(),
            street_number: self.street_number.clone(),
            first_name: suggested(&self.first_name, &address.first_name).to_string(),
            last_name: suggested(&self.last_name, &address.last_name).to_string(),
        }
    }

    /// Codes joined for single-column storage.
    pub fn joined_codes(&self) -> String {
        join_codes(&self.status_codes)
    }
}

fn suggested<'a>(suggestion: &'a str, current: &'a str) -> &'a str {
    if suggestion.is_empty() {
        current.trim()
    } else {
        suggestion
    }
}

pub fn join_codes(codes: &[String]) -> String {
    codes.join(CODE_DELIMITER)
}

/// Parse a stored code column. An empty column is an empty list.
pub fn split_codes(joined: &str) -> Vec<String> {
    joined
        .split(CODE_DELIMITER)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
