//! Deliverability classification from verification status codes.
//!
//! A status code is a 9-character token: a 3-letter rule family (`PDC`
//! positive description code, `BAC` building address code, `FNC`, ...),
//! a 3-digit field position and a 3-digit outcome, e.g. `PDC050105` =
//! person / deliverable.
//!
//! [`classify`] is a priority cascade, not a score: the first matching rule
//! decides and later rules are reachable only when earlier ones fail.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const NOT_CORRECTABLE: &str = "BAC000111";

pub const PERSON_DELIVERABLE: &str = "PDC050105";
pub const PERSON_UNDELIVERABLE: &str = "PDC050106";
pub const PERSON_NOT_MATCHED: &str = "PDC050500";

pub const HOUSEHOLD_DELIVERABLE: &str = "PDC040105";
pub const HOUSEHOLD_UNDELIVERABLE: &str = "PDC040106";
pub const HOUSEHOLD_NOT_MATCHED: &str = "PDC040500";

pub const BUILDING_DELIVERABLE: &str = "PDC030105";
pub const BUILDING_UNDELIVERABLE: &str = "PDC030106";

/// Deliverability verdict derived from a set of status codes. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Deliverable,
    PossiblyDeliverable,
    Undeliverable,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deliverable => "deliverable",
            Self::PossiblyDeliverable => "possibly_deliverable",
            Self::Undeliverable => "undeliverable",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a set of status codes.
///
/// Rules, first match wins:
///
/// 1. `BAC000111` (not correctable) → undeliverable
/// 2. person deliverable → deliverable
/// 3. person undeliverable, household deliverable → deliverable
/// 4. person undeliverable, household undeliverable, building *not*
///    deliverable → undeliverable
/// 5. person not matched, household deliverable → deliverable
/// 6. person not matched, household undeliverable, building deliverable
///    → undeliverable
/// 7. person and household not matched, building deliverable → possibly
/// 8. person and household not matched, building undeliverable
///    → undeliverable
/// 9. anything else, including no codes → possibly deliverable
pub fn classify<S: AsRef<str>>(codes: &[S]) -> Verdict {
    let has = |code: &str| codes.iter().any(|c| c.as_ref() == code);

    if has(NOT_CORRECTABLE) {
        return Verdict::Undeliverable;
    }
    if has(PERSON_DELIVERABLE) {
        return Verdict::Deliverable;
    }
    if has(PERSON_UNDELIVERABLE) && has(HOUSEHOLD_DELIVERABLE) {
        return Verdict::Deliverable;
    }
    if has(PERSON_UNDELIVERABLE) && has(HOUSEHOLD_UNDELIVERABLE) && !has(BUILDING_DELIVERABLE) {
        return Verdict::Undeliverable;
    }
    if has(PERSON_NOT_MATCHED) && has(HOUSEHOLD_DELIVERABLE) {
        return Verdict::Deliverable;
    }
    if has(PERSON_NOT_MATCHED) && has(HOUSEHOLD_UNDELIVERABLE) && has(BUILDING_DELIVERABLE) {
        return Verdict::Undeliverable;
    }
    if has(PERSON_NOT_MATCHED) && has(HOUSEHOLD_NOT_MATCHED) && has(BUILDING_DELIVERABLE) {
        return Verdict::PossiblyDeliverable;
    }
    if has(PERSON_NOT_MATCHED) && has(HOUSEHOLD_NOT_MATCHED) && has(BUILDING_UNDELIVERABLE) {
        return Verdict::Undeliverable;
    }

    Verdict::PossiblyDeliverable
}

// ── Labels ──

/// Display weight of a single code, derived from its outcome part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeSeverity {
    Positive,
    Negative,
    Correction,
    Neutral,
}

/// Human-readable label for a status code, e.g. `"person: deliverable"`.
///
/// Codes that do not follow the `AAA000000` layout, or whose field and
/// outcome are both unknown, are returned unchanged.
pub fn describe(code: &str) -> String {
    if code == NOT_CORRECTABLE {
        return "address not correctable".to_string();
    }
    let Some((_, field, outcome)) = split_code(code) else {
        return code.to_string();
    };
    match (field_label(field), outcome_label(outcome)) {
        (Some(f), Some(o)) => format!("{f}: {o}"),
        (Some(f), None) => format!("{f}: {outcome}"),
        (None, Some(o)) => format!("{field}: {o}"),
        (None, None) => code.to_string(),
    }
}

/// Severity used to highlight a code in listings.
pub fn severity(code: &str) -> CodeSeverity {
    if code == NOT_CORRECTABLE {
        return CodeSeverity::Negative;
    }
    match split_code(code).map(|(_, _, outcome)| outcome) {
        Some("105") => CodeSeverity::Positive,
        Some("106" | "111" | "301" | "401" | "506") => CodeSeverity::Negative,
        Some("103" | "104" | "202") => CodeSeverity::Correction,
        _ => CodeSeverity::Neutral,
    }
}

fn split_code(code: &str) -> Option<(&str, &str, &str)> {
    if code.len() != 9 || !code.is_ascii() {
        return None;
    }
    let (family, rest) = code.split_at(3);
    let (field, outcome) = rest.split_at(3);
    if !family.bytes().all(|b| b.is_ascii_uppercase())
        || !rest.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    Some((family, field, outcome))
}

fn field_label(field: &str) -> Option<&'static str> {
    let label = match field {
        "000" => "address",
        "010" => "postal code",
        "011" => "delivery area",
        "020" => "city",
        "021" => "city district",
        "030" => "building",
        "040" => "household",
        "050" => "person",
        "060" => "street",
        "061" => "street name",
        "062" => "street number",
        "063" => "street number addition",
        "070" => "post office",
        "080" => "parcel station",
        "090" => "postal box",
        "100" => "bulk receiver",
        "110" => "first name",
        "111" => "last name",
        "120" => "company",
        "130" => "country",
        "140" => "relocation",
        "150" => "deceased",
        "160" => "address type",
        "170" => "delivery restriction",
        "173" => "move-out",
        _ => return None,
    };
    Some(label)
}

fn outcome_label(outcome: &str) -> Option<&'static str> {
    let label = match outcome {
        "103" => "corrected",
        "104" => "added",
        "105" => "deliverable",
        "106" => "undeliverable",
        "107" => "ambiguous",
        "108" => "not verifiable",
        "111" => "not correctable",
        "201" => "moved",
        "202" => "moved, new address known",
        "203" => "moved, new address unknown",
        "301" => "deceased",
        "401" => "unknown",
        "500" => "not matched",
        "501" => "partially matched",
        "502" => "matched with deviation",
        "503" => "phonetic match",
        "504" => "match not unique",
        "505" => "removed",
        "506" => "invalid",
        _ => return None,
    };
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PDC: &[&str] = &[
        PERSON_DELIVERABLE,
        PERSON_UNDELIVERABLE,
        PERSON_NOT_MATCHED,
        HOUSEHOLD_DELIVERABLE,
        HOUSEHOLD_UNDELIVERABLE,
        HOUSEHOLD_NOT_MATCHED,
        BUILDING_DELIVERABLE,
        BUILDING_UNDELIVERABLE,
    ];

    #[test]
    fn not_correctable_wins_over_everything() {
        assert_eq!(classify(&[NOT_CORRECTABLE]), Verdict::Undeliverable);
        assert_eq!(
            classify(&[PERSON_DELIVERABLE, NOT_CORRECTABLE]),
            Verdict::Undeliverable
        );

        // Every subset of the PDC codes, with BAC000111 added.
        for mask in 0u32..(1 << ALL_PDC.len()) {
            let mut codes: Vec<&str> = ALL_PDC
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, c)| *c)
                .collect();
            codes.push(NOT_CORRECTABLE);
            assert_eq!(classify(&codes), Verdict::Undeliverable, "codes: {codes:?}");
        }
    }

    #[test]
    fn person_deliverable() {
        assert_eq!(classify(&["PDC050105"]), Verdict::Deliverable);
    }

    #[test]
    fn person_undeliverable_household_deliverable() {
        assert_eq!(classify(&["PDC050106", "PDC040105"]), Verdict::Deliverable);
    }

    #[test]
    fn person_and_household_undeliverable() {
        assert_eq!(classify(&["PDC050106", "PDC040106"]), Verdict::Undeliverable);
    }

    #[test]
    fn building_deliverable_lifts_rule_four() {
        // Rules 5-8 need person-not-matched, so this falls through to the default.
        assert_eq!(
            classify(&["PDC050106", "PDC040106", "PDC030105"]),
            Verdict::PossiblyDeliverable
        );
    }

    #[test]
    fn person_not_matched_rules() {
        assert_eq!(classify(&["PDC050500", "PDC040105"]), Verdict::Deliverable);
        assert_eq!(
            classify(&["PDC050500", "PDC040106", "PDC030105"]),
            Verdict::Undeliverable
        );
        assert_eq!(
            classify(&["PDC050500", "PDC040500", "PDC030105"]),
            Verdict::PossiblyDeliverable
        );
        assert_eq!(
            classify(&["PDC050500", "PDC040500", "PDC030106"]),
            Verdict::Undeliverable
        );
    }

    #[test]
    fn empty_and_unrelated_codes_default_to_possibly() {
        let empty: [&str; 0] = [];
        assert_eq!(classify(&empty), Verdict::PossiblyDeliverable);
        assert_eq!(classify(&["FNC000500", "PDC010103"]), Verdict::PossiblyDeliverable);
    }

    #[test]
    fn classify_accepts_owned_strings() {
        let codes = vec!["PDC050105".to_string()];
        assert_eq!(classify(&codes), Verdict::Deliverable);
    }

    #[test]
    fn describe_known_codes() {
        assert_eq!(describe("PDC050105"), "person: deliverable");
        assert_eq!(describe("PDC040500"), "household: not matched");
        assert_eq!(describe("FNC062103"), "street number: corrected");
        assert_eq!(describe(NOT_CORRECTABLE), "address not correctable");
    }

    #[test]
    fn describe_partial_and_unknown() {
        assert_eq!(describe("PDC050999"), "person: 999");
        assert_eq!(describe("PDC999105"), "999: deliverable");
        assert_eq!(describe("PDC999999"), "PDC999999");
        assert_eq!(describe("garbage"), "garbage");
    }

    #[test]
    fn severity_from_outcome() {
        assert_eq!(severity("PDC050105"), CodeSeverity::Positive);
        assert_eq!(severity("PDC040106"), CodeSeverity::Negative);
        assert_eq!(severity("FNC010103"), CodeSeverity::Correction);
        assert_eq!(severity("PDC050500"), CodeSeverity::Neutral);
        assert_eq!(severity(NOT_CORRECTABLE), CodeSeverity::Negative);
    }
}
