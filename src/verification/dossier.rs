use std::fmt::Write;

use crate::constants::{ELABORATION_MARKER, VERDICT_MARKER};
use crate::matching::describe_item;
use crate::model::{Claim, Item, Question};

const NOT_PROVIDED: &str = "not provided";
const NO_ANSWER: &str = "(no answer)";

/// Everything the verification model sees about one claim.
#[derive(Debug, Clone, Copy)]
pub struct Dossier<'a> {
    pub claim: &'a Claim,
    pub item: &'a Item,
    pub linked_post: Option<&'a Item>,
    pub questions: &'a [Question],
}

impl<'a> Dossier<'a> {
    pub fn new(
        claim: &'a Claim,
        item: &'a Item,
        linked_post: Option<&'a Item>,
        questions: &'a [Question],
    ) -> Self {
        Self {
            claim,
            item,
            linked_post,
            questions,
        }
    }

    pub fn photo_count(&self) -> usize {
        self.claim.photo_urls.len()
    }

    /// Claimant answers in question order; unanswered questions yield `None`.
    pub fn answers(&self) -> impl Iterator<Item = (&'a Question, Option<&'a str>)> + 'a {
        let claim = self.claim;
        self.questions
            .iter()
            .map(move |q| (q, claim.answer_for(&q.id)))
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You verify ownership claims for found items. Score each answer against the owner's \
answer when one is provided, otherwise against the item description.\n\
Scoring policy:\n\
- An imprecise answer that is close to the truth is Correct.\n\
- A vague answer that is not wrong is Partially Correct.\n\
- \"I don't know\" is neutral, unless it is the answer to more than half of the questions; \
then treat it as a negative signal.\n\
- A linked lost post that describes the same item is the strongest positive signal and \
should materially raise confidence.\n\
- If the claimant admits the photos come from the internet, discount them entirely and \
leave them out of the evidence analysis.\n\
Reply with exactly one JSON object:\n\
{{\"confidence_percentage\": <0-100>, \
\"analysis\": \"{VERDICT_MARKER} <one sentence verdict> {ELABORATION_MARKER} <short explanation>\", \
\"question_analysis\": {{\"<question id>\": {{\"status\": \"Correct|Partially Correct|Incorrect\", \
\"score\": <0-100>, \"explanation\": \"...\"}}}}, \
\"linked_post_analysis\": {{\"status\": \"Strong Match|Partial Match|No Match\", \"score\": <0-100>, \
\"explanation\": \"...\"}}, \
\"evidence_analysis\": {{\"strength\": \"Strong|Moderate|Weak|None\", \"explanation\": \"...\", \
\"photos_considered\": <true|false>}}}}"
        )
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "FOUND ITEM\n{}\n", describe_item(self.item));

        match self.linked_post {
            Some(post) => {
                let _ = writeln!(
                    out,
                    "LINKED LOST POST (submitted by the claimant)\n{}\n",
                    describe_item(post)
                );
            }
            None => {
                let _ = writeln!(out, "LINKED LOST POST\nnone\n");
            }
        }

        let _ = writeln!(
            out,
            "PHOTOS\nThe claimant uploaded {} photo(s).",
            self.photo_count()
        );
        if self.photo_count() > 0 {
            let _ = writeln!(
                out,
                "If any answer admits the photos were taken from the internet, ignore the photos."
            );
        }

        let _ = writeln!(out, "\nQUESTIONS");
        if self.questions.is_empty() {
            let _ = writeln!(out, "none");
        }
        for (question, answer) in self.answers() {
            let answer = answer.map(str::trim).filter(|a| !a.is_empty());
            let _ = writeln!(
                out,
                "\nQuestion id: {}\nQuestion: {}\nClaimant's answer: {}\nOwner's answer: {}",
                question.id,
                question.question,
                answer.unwrap_or(NO_ANSWER),
                question
                    .correct_answer
                    .as_deref()
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .unwrap_or(NOT_PROVIDED),
            );
        }
        out
    }
}
