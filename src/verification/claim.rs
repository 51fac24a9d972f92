use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dossier::Dossier;
use super::error::VerificationError;
use super::guards::apply_guards;
use super::schema::{ParsedVerdict, parse_verdict};
use crate::constants::UNAVAILABLE_ANALYSIS_TEXT;
use crate::llm::{ChatMessage, ChatProvider, ChatRequest, LlmError};
use crate::model::{Claim, ClaimAnalysisUpdate, Confidence, Item};
use crate::store::Store;

const VERIFIER_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    /// The model's verdict (after guards) was written.
    Completed { confidence: Confidence },
    /// The reply was unusable; the documented fallback verdict was written.
    Fallback,
    /// No provider configured; the claim was marked unavailable.
    Unavailable,
}

/// Produces and writes back the claim-level verdict.
pub struct ClaimVerifier {
    store: Arc<dyn Store>,
    llm: Arc<dyn ChatProvider>,
}

impl ClaimVerifier {
    pub fn new(store: Arc<dyn Store>, llm: Arc<dyn ChatProvider>) -> Self {
        Self { store, llm }
    }

    /// Transport failures propagate so the caller can retry; a missing
    /// provider or an unusable reply is written to the claim instead.
    #[instrument(skip(self), fields(claim_id = %claim_id))]
    pub async fn verify(&self, claim_id: Uuid) -> Result<VerificationOutcome, VerificationError> {
        let claim = self
            .store
            .get_claim(claim_id)
            .await?
            .ok_or(VerificationError::ClaimNotFound { claim_id })?;

        if !self.llm.is_enabled() {
            info!("Language model not configured; marking verification unavailable");
            self.write(
                claim_id,
                ClaimAnalysisUpdate::Unavailable {
                    narrative: UNAVAILABLE_ANALYSIS_TEXT.to_string(),
                },
            )
            .await?;
            return Ok(VerificationOutcome::Unavailable);
        }

        let item = self
            .store
            .get_item(claim.item_id)
            .await?
            .ok_or(VerificationError::ItemNotFound {
                claim_id,
                item_id: claim.item_id,
            })?;
        let linked_post = self.linked_post(&claim).await?;
        let questions = self.store.questions_for_item(item.id).await?;
        let dossier = Dossier::new(&claim, &item, linked_post.as_ref(), &questions);

        let verdict = self.evaluate(&dossier).await?;
        let outcome = if verdict.fallback {
            VerificationOutcome::Fallback
        } else {
            VerificationOutcome::Completed {
                confidence: verdict.confidence,
            }
        };

        info!(
            confidence = %verdict.confidence,
            questions = verdict.questions.len(),
            fallback = verdict.fallback,
            "Claim verified"
        );
        self.write(claim_id, verdict.into_update()).await?;
        Ok(outcome)
    }

    /// Runs the model over a dossier and applies the guards.
    pub async fn evaluate(&self, dossier: &Dossier<'_>) -> Result<ParsedVerdict, VerificationError> {
        let request = ChatRequest::json(vec![
            ChatMessage::system(dossier.system_prompt()),
            ChatMessage::user(dossier.render()),
        ])
        .with_max_tokens(VERIFIER_MAX_TOKENS);

        let reply = match self.llm.complete(request).await {
            Ok(reply) => reply,
            Err(LlmError::MalformedResponse { reason }) => {
                warn!(reason = %reason, "Verification completion was empty or malformed");
                return Ok(ParsedVerdict::fallback());
            }
            Err(e) => return Err(e.into()),
        };

        let mut verdict = parse_verdict(&reply, dossier);
        if !verdict.fallback {
            apply_guards(&mut verdict, dossier);
        }
        Ok(verdict)
    }

    /// A dangling linked-post reference is treated as no linked post.
    async fn linked_post(&self, claim: &Claim) -> Result<Option<Item>, VerificationError> {
        let Some(post_id) = claim.linked_post_id else {
            return Ok(None);
        };
        let post = self.store.get_item(post_id).await?;
        if post.is_none() {
            warn!(linked_post_id = %post_id, "Linked post not found");
        }
        Ok(post)
    }

    async fn write(
        &self,
        claim_id: Uuid,
        update: ClaimAnalysisUpdate,
    ) -> Result<Claim, VerificationError> {
        Ok(self.store.update_claim_analysis(claim_id, &update).await?)
    }
}
