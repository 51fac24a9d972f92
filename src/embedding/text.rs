use crate::model::Item;

/// Consolidates an item's descriptive fields into one embedding input.
///
/// Fields are joined with `". "` in a fixed order (title, description,
/// category, location, city/state, tags); empty fields are skipped so two
/// items differing only in missing fields embed identically.
pub fn embedding_text(item: &Item) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(6);

    for field in [
        item.title.as_str(),
        item.description.as_str(),
        item.category.as_str(),
        item.location.text.as_str(),
    ] {
        let field = field.trim();
        if !field.is_empty() {
            parts.push(field.to_string());
        }
    }

    if let Some(city_state) = item.location.city_state() {
        parts.push(city_state);
    }

    let tags: Vec<&str> = item
        .ai_tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if !tags.is_empty() {
        parts.push(format!("Tags: {}", tags.join(", ")));
    }

    parts.join(". ")
}
