//! Subtype-aware status code filtering.
//!
//! Post offices, parcel stations and postal boxes have no street, household
//! or person to verify, so the codes describing those fields are meaningless
//! for them and would skew [`classify`](crate::classify).

use crate::record::{AddressSubtype, VerificationRecord};

const STREET_FIELD_FAMILIES: &[&str] = &["PDC", "FNC"];
const PERSON_FIELD_FAMILIES: &[&str] = &["PDC"];

/// Status codes of a fresh record that are relevant for its subtype.
///
/// Order is preserved and duplicates are dropped. Not applied to persisted
/// codes, which were filtered when written.
pub fn filter_codes(record: &VerificationRecord) -> Vec<String> {
    let dropped: &[&str] = match record.subtype() {
        AddressSubtype::PostOffice | AddressSubtype::ParcelStation => STREET_FIELD_FAMILIES,
        AddressSubtype::PostalBox => PERSON_FIELD_FAMILIES,
        AddressSubtype::Street | AddressSubtype::BulkReceiver => &[],
    };

    let mut kept: Vec<String> = Vec::with_capacity(record.status_codes.len());
    for code in &record.status_codes {
        let code = code.trim();
        if code.is_empty() || dropped.iter().any(|prefix| code.starts_with(prefix)) {
            continue;
        }
        if !kept.iter().any(|k| k == code) {
            kept.push(code.to_string());
        }
    }
    kept
}
