//! The claim's JSON analysis column and the updates its two writers submit.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::confidence::Confidence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuestionStatus {
    Correct,
    #[serde(rename = "Partially Correct")]
    PartiallyCorrect,
    #[default]
    Incorrect,
}

impl QuestionStatus {
    /// Lenient parse of a model-provided label.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "correct" => Some(Self::Correct),
            "partiallycorrect" | "partial" | "partiallyright" => Some(Self::PartiallyCorrect),
            "incorrect" | "wrong" => Some(Self::Incorrect),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionAssessment {
    pub status: QuestionStatus,
    pub score: Confidence,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum LinkedPostStatus {
    #[default]
    #[serde(rename = "No Match")]
    NoMatch,
    #[serde(rename = "Partial Match")]
    PartialMatch,
    #[serde(rename = "Strong Match")]
    StrongMatch,
}

impl LinkedPostStatus {
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "strongmatch" | "strong" | "match" => Some(Self::StrongMatch),
            "partialmatch" | "partial" | "weakmatch" => Some(Self::PartialMatch),
            "nomatch" | "none" | "mismatch" => Some(Self::NoMatch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedPostAssessment {
    pub status: LinkedPostStatus,
    pub score: Confidence,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvidenceStrength {
    Strong,
    Moderate,
    Weak,
    #[default]
    None,
}

impl EvidenceStrength {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "strong" | "high" => Some(Self::Strong),
            "moderate" | "medium" => Some(Self::Moderate),
            "weak" | "low" => Some(Self::Weak),
            "none" | "no evidence" | "" => Some(Self::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceAssessment {
    pub strength: EvidenceStrength,
    pub explanation: String,
    /// Photo-specific; only present when the claim carried photos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_count: Option<u32>,
    /// Photo-specific; `false` when the photos were discounted as internet-sourced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos_considered: Option<bool>,
}

impl EvidenceAssessment {
    pub fn clear_photo_fields(&mut self) {
        self.photo_count = None;
        self.photos_considered = None;
    }
}

/// One photo's authenticity verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoVerdict {
    pub url: String,
    pub is_likely_original: bool,
    pub confidence: Confidence,
    pub analysis: String,
    #[serde(default)]
    pub red_flags: Vec<String>,
}

/// Claim-level aggregate over all photo verdicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoVerificationSummary {
    pub photos_analyzed: usize,
    pub original_count: usize,
    pub average_confidence: Confidence,
    pub authentic: bool,
    pub overall_assessment: String,
    pub red_flags_summary: Vec<String>,
    /// The line appended to the claim's narrative.
    pub summary: String,
    pub photos: Vec<PhotoVerdict>,
    pub analyzed_at: DateTime<Utc>,
}

/// Contents of `claims.ai_question_analysis`.
///
/// Question assessments are stored under their question id; the three
/// reserved keys sit alongside them at the top level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_post_analysis: Option<LinkedPostAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_analysis: Option<EvidenceAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_verification: Option<PhotoVerificationSummary>,
    #[serde(flatten)]
    pub questions: BTreeMap<String, QuestionAssessment>,
}

impl ClaimAnalysis {
    pub fn is_empty(&self) -> bool {
        self.linked_post_analysis.is_none()
            && self.evidence_analysis.is_none()
            && self.photo_verification.is_none()
            && self.questions.is_empty()
    }
}

/// A key-scoped write to a claim's AI fields.
///
/// The store applies these atomically via
/// [`Claim::apply_analysis_update`](super::Claim::apply_analysis_update).
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimAnalysisUpdate {
    /// Question/linked-post/evidence verdict from the orchestrator.
    Verdict {
        confidence: Confidence,
        narrative: String,
        questions: BTreeMap<String, QuestionAssessment>,
        linked_post: Option<LinkedPostAssessment>,
        evidence: Option<EvidenceAssessment>,
    },
    /// Terminal state when no provider is configured.
    Unavailable { narrative: String },
    /// Aggregate from the photo checker.
    Photos(PhotoVerificationSummary),
}
