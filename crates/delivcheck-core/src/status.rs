//! Per-order analysis status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codes::Verdict;

/// Where an order stands in the deliverability workflow.
///
/// ```text
/// NotAnalysed → Pending → {Deliverable | PossiblyDeliverable | Undeliverable | AnalysisFailed}
///                                           ↓
///                                    AddressCorrected
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAnalysisStatus {
    /// No stored status.
    #[default]
    NotAnalysed,
    /// Queued for the next sweep.
    Pending,
    Undeliverable,
    PossiblyDeliverable,
    Deliverable,
    AddressCorrected,
    AnalysisFailed,
}

#[derive(Debug, Error)]
#[error("unknown order analysis status: {0:?}")]
pub struct ParseStatusError(pub String);

impl OrderAnalysisStatus {
    pub const ALL: [Self; 7] = [
        Self::NotAnalysed,
        Self::Pending,
        Self::Undeliverable,
        Self::PossiblyDeliverable,
        Self::Deliverable,
        Self::AddressCorrected,
        Self::AnalysisFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAnalysed => "not_analysed",
            Self::Pending => "pending",
            Self::Undeliverable => "undeliverable",
            Self::PossiblyDeliverable => "possibly_deliverable",
            Self::Deliverable => "deliverable",
            Self::AddressCorrected => "address_corrected",
            Self::AnalysisFailed => "analysis_failed",
        }
    }

    pub fn from_verdict(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Deliverable => Self::Deliverable,
            Verdict::PossiblyDeliverable => Self::PossiblyDeliverable,
            Verdict::Undeliverable => Self::Undeliverable,
        }
    }

    /// Analysis has produced an outcome, successful or not.
    pub fn is_concluded(&self) -> bool {
        matches!(
            self,
            Self::AnalysisFailed | Self::Undeliverable | Self::PossiblyDeliverable | Self::Deliverable
        )
    }

    /// Never picked up again by automatic analysis.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AddressCorrected | Self::AnalysisFailed)
    }

    /// Status after the shipping address was edited by hand, or `None` when
    /// the edit does not change it. Pending analysis is not preempted.
    pub fn after_address_edit(&self) -> Option<Self> {
        self.is_concluded().then_some(Self::AddressCorrected)
    }
}

impl fmt::Display for OrderAnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderAnalysisStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}
