use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::{ClaimAnalysis, ClaimAnalysisUpdate};
use super::confidence::Confidence;
use crate::constants::PENDING_ANALYSIS_TEXT;

/// An owner-supplied verification question attached to an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub item_id: Uuid,
    pub question: String,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

impl Question {
    pub fn new(item_id: Uuid, question: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            question: question.into(),
            correct_answer: None,
        }
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.correct_answer = Some(answer.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Owner decision on a pending claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimDecision {
    Approve,
    Reject,
}

impl fmt::Display for ClaimDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimDecision::Approve => f.write_str("approve"),
            ClaimDecision::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for ClaimDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approve" | "approved" => Ok(Self::Approve),
            "reject" | "rejected" => Ok(Self::Reject),
            other => Err(format!("unknown claim decision: {other}")),
        }
    }
}

/// A claim as submitted by a claimant, before any AI enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewClaim {
    pub item_id: Uuid,
    pub claimant_id: Uuid,
    /// Answers keyed by question id.
    #[serde(default)]
    pub answers: BTreeMap<Uuid, String>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub linked_post_id: Option<Uuid>,
}

/// An ownership claim on a found item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: Uuid,
    pub item_id: Uuid,
    pub claimant_id: Uuid,
    #[serde(default)]
    pub answers: BTreeMap<Uuid, String>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(default)]
    pub linked_post_id: Option<Uuid>,
    #[serde(default)]
    pub status: ClaimStatus,
    /// Confidence percentage as a decimal string ("0" until analysed).
    pub ai_verdict: String,
    pub ai_analysis: String,
    #[serde(default)]
    pub ai_question_analysis: ClaimAnalysis,
    /// Bumped on every analysis write; used for conditional updates.
    #[serde(default)]
    pub analysis_version: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Claim {
    /// Materializes a submission with placeholder AI fields.
    pub fn submitted(new: NewClaim) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id: new.item_id,
            claimant_id: new.claimant_id,
            answers: new.answers,
            photo_urls: new.photo_urls,
            linked_post_id: new.linked_post_id,
            status: ClaimStatus::Pending,
            ai_verdict: Confidence::ZERO.to_string(),
            ai_analysis: PENDING_ANALYSIS_TEXT.to_string(),
            ai_question_analysis: ClaimAnalysis::default(),
            analysis_version: 0,
            created_at: Utc::now(),
            reviewed_at: None,
        }
    }

    pub fn has_photos(&self) -> bool {
        !self.photo_urls.is_empty()
    }

    /// Parsed `ai_verdict`; `None` when the stored string is not numeric.
    pub fn verdict_confidence(&self) -> Option<Confidence> {
        Confidence::parse_lenient(&self.ai_verdict)
    }

    pub fn answer_for(&self, question_id: &Uuid) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    /// Applies one writer's update to the AI fields.
    ///
    /// Each update touches only its own keys of `ai_question_analysis`, and
    /// the photo summary line survives a later verdict write, so applying a
    /// `Verdict` and a `Photos` update in either order yields the same row.
    pub fn apply_analysis_update(&mut self, update: &ClaimAnalysisUpdate) {
        match update {
            ClaimAnalysisUpdate::Verdict {
                confidence,
                narrative,
                questions,
                linked_post,
                evidence,
            } => {
                self.ai_verdict = confidence.to_string();
                self.ai_analysis = self.with_photo_line(narrative.clone());
                self.ai_question_analysis.questions = questions.clone();
                self.ai_question_analysis.linked_post_analysis = linked_post.clone();
                self.ai_question_analysis.evidence_analysis = evidence.clone();
            }
            ClaimAnalysisUpdate::Unavailable { narrative } => {
                self.ai_verdict = Confidence::ZERO.to_string();
                self.ai_analysis = self.with_photo_line(narrative.clone());
            }
            ClaimAnalysisUpdate::Photos(summary) => {
                let mut text = self.ai_analysis.clone();
                if let Some(previous) = &self.ai_question_analysis.photo_verification {
                    text = strip_line(&text, &previous.summary);
                }
                self.ai_analysis = append_line(&text, &summary.summary);
                self.ai_question_analysis.photo_verification = Some(summary.clone());
            }
        }
        self.analysis_version += 1;
    }

    fn with_photo_line(&self, narrative: String) -> String {
        match &self.ai_question_analysis.photo_verification {
            Some(photos) => append_line(&narrative, &photos.summary),
            None => narrative,
        }
    }
}

fn append_line(text: &str, line: &str) -> String {
    let text = text.trim_end();
    if text.is_empty() {
        line.to_string()
    } else {
        format!("{text}\n\n{line}")
    }
}

fn strip_line(text: &str, line: &str) -> String {
    match text.rfind(line) {
        Some(pos) => {
            let mut out = String::with_capacity(text.len());
            out.push_str(text[..pos].trim_end());
            out.push_str(&text[pos + line.len()..]);
            out
        }
        None => text.to_string(),
    }
}
