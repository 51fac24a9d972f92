//! Coercion of the verification model's reply into typed assessments.
//!
//! Every field has a default, so a reply that is valid JSON but the wrong
//! shape still produces a complete verdict.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use super::dossier::Dossier;
use crate::constants::{
    DEFAULT_CLAIM_CONFIDENCE, ELABORATION_MARKER, FALLBACK_ANALYSIS_TEXT, VERDICT_MARKER,
};
use crate::llm::json::{bool_field, extract_object, string_field};
use crate::model::{
    ClaimAnalysisUpdate, Confidence, EvidenceAssessment, EvidenceStrength, LinkedPostAssessment,
    LinkedPostStatus, QuestionAssessment, QuestionStatus,
};

/// A verdict after coercion, before the deterministic guards.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedVerdict {
    pub confidence: Confidence,
    pub analysis: String,
    pub questions: BTreeMap<String, QuestionAssessment>,
    pub linked_post: Option<LinkedPostAssessment>,
    pub evidence: Option<EvidenceAssessment>,
    /// `true` when the reply could not be parsed at all.
    pub fallback: bool,
}

impl ParsedVerdict {
    /// Confidence 50, generic text, no assessments.
    pub fn fallback() -> Self {
        Self {
            confidence: Confidence::new(DEFAULT_CLAIM_CONFIDENCE),
            analysis: FALLBACK_ANALYSIS_TEXT.to_string(),
            questions: BTreeMap::new(),
            linked_post: None,
            evidence: None,
            fallback: true,
        }
    }

    pub fn into_update(self) -> ClaimAnalysisUpdate {
        ClaimAnalysisUpdate::Verdict {
            confidence: self.confidence,
            narrative: self.analysis,
            questions: self.questions,
            linked_post: self.linked_post,
            evidence: self.evidence,
        }
    }
}

pub fn parse_verdict(reply: &str, dossier: &Dossier<'_>) -> ParsedVerdict {
    let Some(obj) = extract_object(reply) else {
        warn!(
            claim_id = %dossier.claim.id,
            reply_len = reply.len(),
            "Verification reply was not JSON; using fallback verdict"
        );
        return ParsedVerdict::fallback();
    };

    let confidence = ["confidence_percentage", "confidence"]
        .iter()
        .filter_map(|k| obj.get(*k))
        .find_map(Confidence::from_json)
        .unwrap_or(Confidence::new(DEFAULT_CLAIM_CONFIDENCE));

    let linked_post = dossier
        .linked_post
        .map(|_| match obj.get("linked_post_analysis") {
            Some(Value::Object(raw)) => linked_post_assessment(raw),
            _ => LinkedPostAssessment::default(),
        });

    let evidence = match obj.get("evidence_analysis") {
        Some(Value::Object(raw)) => Some(evidence_assessment(raw, dossier.photo_count())),
        _ => None,
    };

    ParsedVerdict {
        confidence,
        analysis: analysis_text(obj.get("analysis")),
        questions: question_assessments(obj.get("question_analysis"), dossier),
        linked_post,
        evidence,
        fallback: false,
    }
}

/// Accepts the marker string form or `{verdict, elaboration}`.
fn analysis_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Object(parts)) => {
            let verdict = string_field(parts, &["verdict", "summary"]);
            let elaboration = string_field(parts, &["elaboration", "details", "explanation"]);
            match (verdict, elaboration) {
                (Some(v), Some(e)) => format!("{VERDICT_MARKER} {v}\n{ELABORATION_MARKER} {e}"),
                (Some(v), None) => format!("{VERDICT_MARKER} {v}"),
                (None, Some(e)) => format!("{ELABORATION_MARKER} {e}"),
                (None, None) => FALLBACK_ANALYSIS_TEXT.to_string(),
            }
        }
        _ => FALLBACK_ANALYSIS_TEXT.to_string(),
    }
}

/// Keeps only entries keyed by one of the dossier's question ids.
fn question_assessments(
    value: Option<&Value>,
    dossier: &Dossier<'_>,
) -> BTreeMap<String, QuestionAssessment> {
    let Some(Value::Object(raw)) = value else {
        return BTreeMap::new();
    };

    dossier
        .questions
        .iter()
        .filter_map(|q| {
            let key = q.id.to_string();
            let Some(Value::Object(entry)) = raw.get(&key) else {
                return None;
            };
            let status = string_field(entry, &["status"])
                .and_then(|s| QuestionStatus::from_label(&s))
                .unwrap_or_default();
            let score = entry
                .get("score")
                .and_then(Confidence::from_json)
                .unwrap_or(match status {
                    QuestionStatus::Correct => Confidence::MAX,
                    QuestionStatus::PartiallyCorrect => Confidence::new(50),
                    QuestionStatus::Incorrect => Confidence::ZERO,
                });
            Some((
                key,
                QuestionAssessment {
                    status,
                    score,
                    explanation: string_field(entry, &["explanation", "reasoning"])
                        .unwrap_or_default(),
                },
            ))
        })
        .collect()
}

fn linked_post_assessment(raw: &Map<String, Value>) -> LinkedPostAssessment {
    LinkedPostAssessment {
        status: string_field(raw, &["status", "match"])
            .and_then(|s| LinkedPostStatus::from_label(&s))
            .unwrap_or_default(),
        score: raw
            .get("score")
            .and_then(Confidence::from_json)
            .unwrap_or_default(),
        explanation: string_field(raw, &["explanation", "reasoning"]).unwrap_or_default(),
    }
}

/// Photo fields come from the claim itself, never from the model's count.
fn evidence_assessment(raw: &Map<String, Value>, photo_count: usize) -> EvidenceAssessment {
    let mut evidence = EvidenceAssessment {
        strength: string_field(raw, &["strength", "evidence_strength"])
            .and_then(|s| EvidenceStrength::from_label(&s))
            .unwrap_or_default(),
        explanation: string_field(raw, &["explanation", "reasoning"]).unwrap_or_default(),
        photo_count: None,
        photos_considered: None,
    };
    if photo_count > 0 {
        evidence.photo_count = Some(photo_count as u32);
        evidence.photos_considered =
            Some(bool_field(raw, &["photos_considered", "photos_valid"]).unwrap_or(true));
    }
    evidence
}
