//! Deterministic adjustments applied after the model's verdict is coerced.

use std::collections::HashSet;

use tracing::debug;

use super::dossier::Dossier;
use super::schema::ParsedVerdict;
use crate::constants::{STRONG_LINK_BONUS, STRONG_LINK_OVERLAP, UNCERTAINTY_PENALTY};
use crate::model::{Confidence, LinkedPostAssessment, LinkedPostStatus};

const UNCERTAIN_PHRASES: &[&str] = &[
    "i dont know",
    "i do not know",
    "dont know",
    "do not know",
    "idk",
    "no idea",
    "not sure",
    "unsure",
    "i am not sure",
    "i am unsure",
    "i dont remember",
    "i do not remember",
    "dont remember",
    "cant remember",
    "cannot remember",
    "i forget",
    "i forgot",
    "no clue",
];

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Words that may pad an uncertainty phrase without adding content.
const FILLER_WORDS: &[&str] = &[
    "im", "sorry", "really", "honestly", "just", "um", "uh", "well", "actually", "totally",
];

/// Whether an answer is an "I don't know" in one of its usual spellings.
///
/// The whole answer must be the phrase, give or take filler words, so a
/// hedge followed by real content ("not sure, but it is a Fossil") is not
/// counted. Blank answers are not counted; they are reported as unanswered
/// instead.
pub fn is_uncertain_answer(answer: &str) -> bool {
    let core = normalize(answer)
        .split_whitespace()
        .filter(|word| !FILLER_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ");
    !core.is_empty() && UNCERTAIN_PHRASES.contains(&core.as_str())
}

/// Uncertain answers strictly exceed half of the questions.
pub fn uncertainty_penalty_applies(dossier: &Dossier<'_>) -> bool {
    let total = dossier.questions.len();
    if total == 0 {
        return false;
    }
    let uncertain = dossier
        .answers()
        .filter(|(_, answer)| answer.is_some_and(is_uncertain_answer))
        .count();
    uncertain * 2 > total
}

fn tokens(text: &str) -> HashSet<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Jaccard overlap of the two texts' word sets; 0 when either is empty.
pub fn token_overlap(a: &str, b: &str) -> f32 {
    let a = tokens(a);
    let b = tokens(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(&b).count();
    let union = a.union(&b).count();
    shared as f32 / union as f32
}

/// Applies, in order: the uncertainty penalty, the linked-post overlap
/// upgrade, the strong-link bonus, and photo field clearing.
pub fn apply_guards(verdict: &mut ParsedVerdict, dossier: &Dossier<'_>) {
    if uncertainty_penalty_applies(dossier) {
        debug!(claim_id = %dossier.claim.id, "Applying uncertainty penalty");
        verdict.confidence = verdict.confidence.saturating_sub(UNCERTAINTY_PENALTY);
    }

    if let Some(post) = dossier.linked_post {
        let overlap = token_overlap(&post.description, &dossier.item.description);
        let linked = verdict
            .linked_post
            .get_or_insert_with(LinkedPostAssessment::default);
        if overlap >= STRONG_LINK_OVERLAP && linked.status != LinkedPostStatus::StrongMatch {
            debug!(
                claim_id = %dossier.claim.id,
                overlap,
                "Linked post description overlaps the item; upgrading to Strong Match"
            );
            linked.status = LinkedPostStatus::StrongMatch;
            linked.score = linked
                .score
                .max(Confidence::new((overlap * 100.0).round() as u8));
            if linked.explanation.is_empty() {
                linked.explanation =
                    "The linked post's description closely matches the found item.".to_string();
            }
        }
        if linked.status == LinkedPostStatus::StrongMatch {
            verdict.confidence = verdict.confidence.saturating_add(STRONG_LINK_BONUS);
        }
    } else {
        verdict.linked_post = None;
    }

    if dossier.photo_count() == 0
        && let Some(evidence) = verdict.evidence.as_mut()
    {
        evidence.clear_photo_fields();
    }
}
