use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::prompt::{scorer_system_prompt, scorer_user_prompt};
use super::types::{Candidate, MatchingConfig, ScoredMatch};
use crate::llm::json::{extract_object, string_field};
use crate::llm::{ChatMessage, ChatProvider, ChatRequest};
use crate::model::{Confidence, Item};

const SCORER_MAX_TOKENS: u32 = 1500;

/// Re-ranks candidates with a language model.
///
/// The reply is untrusted: unknown or duplicate candidate ids, missing or
/// non-numeric confidences and anything below the threshold are dropped,
/// and an unparseable reply counts as no matches. Ordering is left as the
/// model returned it.
pub struct MatchScorer {
    llm: Arc<dyn ChatProvider>,
    config: MatchingConfig,
}

impl MatchScorer {
    pub fn new(llm: Arc<dyn ChatProvider>, config: MatchingConfig) -> Self {
        Self { llm, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.llm.is_enabled()
    }

    pub async fn score(&self, item: &Item, candidates: &[Candidate]) -> Vec<ScoredMatch> {
        if candidates.is_empty() || !self.is_enabled() {
            return Vec::new();
        }

        let request = ChatRequest::json(vec![
            ChatMessage::system(scorer_system_prompt()),
            ChatMessage::user(scorer_user_prompt(
                item,
                candidates,
                self.config.min_confidence.value(),
                self.config.max_matches,
            )),
        ])
        .with_max_tokens(SCORER_MAX_TOKENS);

        let reply = match self.llm.complete(request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(item_id = %item.id, error = %e, "Match scoring request failed");
                return Vec::new();
            }
        };

        let matches = self.parse_reply(&reply, candidates);
        info!(
            item_id = %item.id,
            candidates = candidates.len(),
            accepted = matches.len(),
            "Scored candidates"
        );
        matches
    }

    pub(crate) fn parse_reply(&self, reply: &str, candidates: &[Candidate]) -> Vec<ScoredMatch> {
        let Some(entries) = extract_object(reply).and_then(|mut obj| match obj.remove("matches") {
            Some(Value::Array(entries)) => Some(entries),
            _ => None,
        }) else {
            warn!(reply_len = reply.len(), "Scorer reply was not a matches object");
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        for entry in entries {
            let Value::Object(entry) = entry else {
                continue;
            };
            let Some((candidate_id, confidence)) = entry_fields(&entry) else {
                debug!("Dropping scorer entry without id or confidence");
                continue;
            };
            if confidence < self.config.min_confidence {
                continue;
            }
            let Some(candidate) = candidates.iter().find(|c| c.item.id == candidate_id) else {
                debug!(%candidate_id, "Dropping scorer entry for unknown candidate");
                continue;
            };
            if !seen.insert(candidate_id) {
                continue;
            }

            accepted.push(ScoredMatch {
                candidate: candidate.item.clone(),
                confidence,
                reasoning: string_field(&entry, &["reasoning", "reason", "explanation"])
                    .unwrap_or_default(),
            });
            if accepted.len() >= self.config.max_matches {
                break;
            }
        }
        accepted
    }
}

fn entry_fields(entry: &Map<String, Value>) -> Option<(Uuid, Confidence)> {
    let id = string_field(entry, &["candidate_id", "id", "item_id"])
        .and_then(|raw| Uuid::parse_str(&raw).ok())?;
    let confidence = ["confidence", "confidence_score", "score"]
        .iter()
        .filter_map(|k| entry.get(*k))
        .find_map(Confidence::from_json)?;
    Some((id, confidence))
}
