use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::error::VerificationError;
use crate::llm::json::{bool_field, extract_object, string_field, string_list};
use crate::llm::{ChatMessage, ChatProvider, ChatRequest, ModelPurpose};
use crate::model::{ClaimAnalysisUpdate, Confidence, PhotoVerdict, PhotoVerificationSummary};
use crate::store::Store;

const PHOTO_MAX_TOKENS: u32 = 600;

const PHOTO_SYSTEM_PROMPT: &str = "You are a photo forensics assistant. Decide whether an \
image looks like an original photo taken by an ordinary person with a phone or camera, or \
like a downloaded, stock, marketplace or screenshot image. Reply with exactly one JSON object.";

const PHOTO_USER_PROMPT: &str = "Is this an original photo of a personal item? Look for stock \
photo watermarks, studio lighting or plain backgrounds, marketplace layouts, screenshot UI \
elements, heavy compression and inconsistent metadata cues. Reply as \
{\"is_likely_original\": true|false, \"confidence\": <0-100>, \"analysis\": \"...\", \
\"red_flags\": [\"...\"]}.";

const UNANALYZED_PHOTO_TEXT: &str = "Automated analysis was not available for this photo.";

pub const AUTHENTIC_ASSESSMENT: &str = "Photos appear authentic";
pub const SUSPECT_ASSESSMENT: &str = "Photos may not be original";

#[derive(Debug, Clone, PartialEq)]
pub enum PhotoOutcome {
    Completed { authentic: bool, photos: usize },
    /// No photos, or no provider configured; nothing was written.
    Skipped,
}

/// Judges each claim photo independently and writes the aggregate.
pub struct PhotoVerifier {
    store: Arc<dyn Store>,
    llm: Arc<dyn ChatProvider>,
}

impl PhotoVerifier {
    pub fn new(store: Arc<dyn Store>, llm: Arc<dyn ChatProvider>) -> Self {
        Self { store, llm }
    }

    #[instrument(skip(self), fields(claim_id = %claim_id))]
    pub async fn verify(&self, claim_id: Uuid) -> Result<PhotoOutcome, VerificationError> {
        let claim = self
            .store
            .get_claim(claim_id)
            .await?
            .ok_or(VerificationError::ClaimNotFound { claim_id })?;

        if !claim.has_photos() {
            return Ok(PhotoOutcome::Skipped);
        }
        if !self.llm.is_enabled() {
            info!("Vision model not configured; skipping photo verification");
            return Ok(PhotoOutcome::Skipped);
        }

        let verdicts = join_all(claim.photo_urls.iter().map(|url| self.check_photo(url))).await;
        let summary = summarize_photos(verdicts);
        let outcome = PhotoOutcome::Completed {
            authentic: summary.authentic,
            photos: summary.photos_analyzed,
        };

        info!(
            photos = summary.photos_analyzed,
            original = summary.original_count,
            average_confidence = %summary.average_confidence,
            "Photos verified"
        );
        self.store
            .update_claim_analysis(claim_id, &ClaimAnalysisUpdate::Photos(summary))
            .await?;
        Ok(outcome)
    }

    /// Any failure for one photo yields an "original, confidence 0" verdict
    /// rather than failing the batch.
    pub async fn check_photo(&self, url: &str) -> PhotoVerdict {
        let request = ChatRequest::json(vec![
            ChatMessage::system(PHOTO_SYSTEM_PROMPT),
            ChatMessage::user_with_image(PHOTO_USER_PROMPT, url),
        ])
        .with_purpose(ModelPurpose::Vision)
        .with_max_tokens(PHOTO_MAX_TOKENS);

        match self.llm.complete(request).await {
            Ok(reply) => parse_photo_verdict(url, &reply).unwrap_or_else(|| {
                warn!(url, "Photo verdict was not parseable");
                unanalyzed(url)
            }),
            Err(e) => {
                warn!(url, error = %e, "Photo analysis request failed");
                unanalyzed(url)
            }
        }
    }
}

fn unanalyzed(url: &str) -> PhotoVerdict {
    PhotoVerdict {
        url: url.to_string(),
        is_likely_original: true,
        confidence: Confidence::ZERO,
        analysis: UNANALYZED_PHOTO_TEXT.to_string(),
        red_flags: Vec::new(),
    }
}

fn parse_photo_verdict(url: &str, reply: &str) -> Option<PhotoVerdict> {
    let obj = extract_object(reply)?;
    let is_likely_original = bool_field(&obj, &["is_likely_original", "is_original", "original"])?;
    Some(PhotoVerdict {
        url: url.to_string(),
        is_likely_original,
        confidence: obj
            .get("confidence")
            .and_then(Confidence::from_json)
            .unwrap_or_default(),
        analysis: string_field(&obj, &["analysis", "explanation"]).unwrap_or_default(),
        red_flags: string_list(obj.get("red_flags")),
    })
}

/// Aggregates per-photo verdicts.
///
/// Authentic when at least half are judged original; red flags are
/// de-duplicated keeping first-seen order.
pub fn summarize_photos(photos: Vec<PhotoVerdict>) -> PhotoVerificationSummary {
    let total = photos.len();
    let original_count = photos.iter().filter(|p| p.is_likely_original).count();
    let average_confidence = Confidence::mean(photos.iter().map(|p| p.confidence));
    let authentic = total > 0 && original_count * 2 >= total;

    let mut red_flags_summary: Vec<String> = Vec::new();
    for flag in photos.iter().flat_map(|p| p.red_flags.iter()) {
        if !red_flags_summary
            .iter()
            .any(|seen| seen.eq_ignore_ascii_case(flag))
        {
            red_flags_summary.push(flag.clone());
        }
    }

    let overall_assessment = if authentic {
        AUTHENTIC_ASSESSMENT
    } else {
        SUSPECT_ASSESSMENT
    };

    let mut summary = format!(
        "Photo verification: {original_count} of {total} photo(s) appear original \
(average confidence {average_confidence}%). {overall_assessment}."
    );
    if !red_flags_summary.is_empty() {
        summary.push_str(&format!(" Red flags: {}.", red_flags_summary.join("; ")));
    }

    PhotoVerificationSummary {
        photos_analyzed: total,
        original_count,
        average_confidence,
        authentic,
        overall_assessment: overall_assessment.to_string(),
        red_flags_summary,
        summary,
        photos,
        analyzed_at: Utc::now(),
    }
}
