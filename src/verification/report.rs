use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::constants::{ELABORATION_MARKER, PENDING_ANALYSIS_TEXT, VERDICT_MARKER};
use crate::model::{
    Claim, ClaimStatus, Confidence, EvidenceAssessment, LinkedPostAssessment,
    PhotoVerificationSummary, QuestionAssessment,
};

/// Display-ready view of a claim's AI fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimReport {
    pub claim_id: Uuid,
    pub item_id: Uuid,
    pub status: ClaimStatus,
    /// `true` until the verdict writer has run.
    pub pending: bool,
    pub confidence: Option<Confidence>,
    pub verdict: String,
    pub elaboration: String,
    pub questions: BTreeMap<String, QuestionAssessment>,
    pub linked_post: Option<LinkedPostAssessment>,
    pub evidence: Option<EvidenceAssessment>,
    pub photos: Option<PhotoVerificationSummary>,
}

impl ClaimReport {
    pub fn from_claim(claim: &Claim) -> Self {
        let (verdict, elaboration) = split_analysis(&claim.ai_analysis);
        let analysis = &claim.ai_question_analysis;
        Self {
            claim_id: claim.id,
            item_id: claim.item_id,
            status: claim.status,
            pending: claim.ai_analysis.starts_with(PENDING_ANALYSIS_TEXT),
            confidence: claim.verdict_confidence(),
            verdict,
            elaboration,
            questions: analysis.questions.clone(),
            linked_post: analysis.linked_post_analysis.clone(),
            evidence: analysis.evidence_analysis.clone(),
            photos: analysis.photo_verification.clone(),
        }
    }
}

/// Splits `"[VERDICT] v [ELABORATION] e"` into `(v, e)`, dropping the markers.
///
/// Text without markers is returned whole as the verdict.
pub fn split_analysis(text: &str) -> (String, String) {
    let body = text.trim();
    let body = body.strip_prefix(VERDICT_MARKER).unwrap_or(body);
    match body.split_once(ELABORATION_MARKER) {
        Some((verdict, elaboration)) => {
            (verdict.trim().to_string(), elaboration.trim().to_string())
        }
        None => (body.trim().to_string(), String::new()),
    }
}
