//! Reflection outcome domain type
//!
//! The verdict a reflection pass renders over an executed Plan: an overall
//! assessment, optional adjustments, and terminal signals. Outcomes are
//! transient, consumed by the orchestrator within one cycle.

use serde::{Deserialize, Serialize};

use super::adjustment::Adjustment;

/// Overall assessment of a plan's trajectory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    /// Execution is proceeding as intended
    #[default]
    OnTrack,
    /// Concrete corrections are proposed (possibly none applicable)
    NeedsAdjustment,
    /// The plan no longer serves the goal
    OffTrack,
    /// The goal has been achieved
    Complete,
    /// The goal cannot be achieved
    Failed,
}

impl std::fmt::Display for Assessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OnTrack => write!(f, "on_track"),
            Self::NeedsAdjustment => write!(f, "needs_adjustment"),
            Self::OffTrack => write!(f, "off_track"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl Assessment {
    /// Parse an assessment string from reflection output.
    /// Unknown strings yield `None`; the caller falls back conservatively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "on_track" => Some(Self::OnTrack),
            "needs_adjustment" => Some(Self::NeedsAdjustment),
            "off_track" => Some(Self::OffTrack),
            "complete" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Terminal assessments end the orchestration loop outright
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// The full verdict of one reflection pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionOutcome {
    /// Overall trajectory assessment
    pub assessment: Assessment,

    /// Why the assessment was reached
    pub reasoning: String,

    /// Proposed plan corrections
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,

    /// Free-form suggestions when no structured adjustment fits
    pub suggested_next_steps: Option<Vec<String>>,

    /// Confidence in the assessment, 0.0 to 1.0
    pub confidence: Option<f64>,

    /// Wrap-up summary, set when the assessment is Complete
    pub final_summary: Option<String>,

    /// Failure classification, set when the assessment is Failed
    pub error_type: Option<String>,
}

impl ReflectionOutcome {
    fn base(assessment: Assessment, reasoning: impl Into<String>) -> Self {
        Self {
            assessment,
            reasoning: reasoning.into(),
            adjustments: Vec::new(),
            suggested_next_steps: None,
            confidence: None,
            final_summary: None,
            error_type: None,
        }
    }

    /// Everything proceeding as intended, nothing to change
    pub fn on_track(reasoning: impl Into<String>) -> Self {
        Self::base(Assessment::OnTrack, reasoning)
    }

    /// Corrections proposed (the list may be empty when no concrete fix exists)
    pub fn needs_adjustment(reasoning: impl Into<String>, adjustments: Vec<Adjustment>) -> Self {
        let mut outcome = Self::base(Assessment::NeedsAdjustment, reasoning);
        outcome.adjustments = adjustments;
        outcome
    }

    /// The plan no longer serves the goal
    pub fn off_track(reasoning: impl Into<String>) -> Self {
        Self::base(Assessment::OffTrack, reasoning)
    }

    /// The goal has been achieved
    pub fn complete(reasoning: impl Into<String>, final_summary: impl Into<String>) -> Self {
        let mut outcome = Self::base(Assessment::Complete, reasoning);
        outcome.final_summary = Some(final_summary.into());
        outcome
    }

    /// The goal cannot be achieved
    pub fn failed(reasoning: impl Into<String>, error_type: impl Into<String>) -> Self {
        let mut outcome = Self::base(Assessment::Failed, reasoning);
        outcome.error_type = Some(error_type.into());
        outcome
    }

    /// Whether this outcome ends the orchestration loop
    pub fn is_terminal(&self) -> bool {
        self.assessment.is_terminal()
    }
}
