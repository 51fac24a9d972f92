use std::fmt::Write;

use super::types::Candidate;
use crate::model::Item;

const SCORER_SYSTEM_PROMPT: &str = "You match lost-item reports against found-item reports. \
Judge whether two reports describe the same physical object using every detail given: \
category, title, description, colors, brands, distinguishing marks, location, dates and tags. \
Reply with exactly one JSON object and nothing else.";

/// Multi-line description of an item for model prompts.
pub fn describe_item(item: &Item) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Status: {}", item.status);
    let _ = writeln!(out, "Title: {}", item.title);
    if !item.description.trim().is_empty() {
        let _ = writeln!(out, "Description: {}", item.description.trim());
    }
    if !item.category.trim().is_empty() {
        let _ = writeln!(out, "Category: {}", item.category.trim());
    }
    if !item.location.text.trim().is_empty() {
        let _ = writeln!(out, "Location: {}", item.location.text.trim());
    }
    if let Some(city_state) = item.location.city_state() {
        let _ = writeln!(out, "City/State: {city_state}");
    }
    if let Some(date) = item.date {
        let _ = writeln!(out, "Date {}: {date}", item.status);
    }
    if !item.ai_tags.is_empty() {
        let _ = writeln!(out, "Tags: {}", item.ai_tags.join(", "));
    }
    let _ = write!(out, "Posted: {}", item.created_at.format("%Y-%m-%d"));
    out
}

pub(crate) fn scorer_system_prompt() -> &'static str {
    SCORER_SYSTEM_PROMPT
}

pub(crate) fn scorer_user_prompt(
    item: &Item,
    candidates: &[Candidate],
    min_confidence: u8,
    max_matches: usize,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "A new {} item was reported:\n{}\n",
        item.status,
        describe_item(item)
    );
    let _ = writeln!(
        out,
        "Candidate {} items ({}):",
        item.status.opposite(),
        candidates.len()
    );
    for candidate in candidates {
        let _ = writeln!(out, "\n--- candidate_id: {} ---", candidate.item.id);
        if let Some(similarity) = candidate.similarity {
            let _ = writeln!(
                out,
                "Text similarity to the new item: {:.0}%",
                similarity * 100.0
            );
        }
        let _ = writeln!(out, "{}", describe_item(&candidate.item));
    }
    let _ = write!(
        out,
        "\nReturn {{\"matches\": [{{\"candidate_id\": \"<id>\", \"confidence\": <0-100>, \
\"reasoning\": \"<one or two sentences>\"}}]}}. Include only candidates with confidence of \
at least {min_confidence}, at most {max_matches} entries, sorted by confidence descending. \
Return {{\"matches\": []}} when nothing plausibly matches."
    );
    out
}
