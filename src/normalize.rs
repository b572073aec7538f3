//! Conversion of raw catalog responses into stored records.
//!
//! Every accessor here falls back to the record's "unknown" value instead of
//! failing: the catalog omits keys freely and sometimes returns `null` or a
//! differently shaped value where an object or list is expected.

use serde_json::Value;

use crate::domain::DramaId;
use crate::models::drama::{DramaRecord, RawDrama, Tag};

/// Builds the canonical record for `id` out of `raw`.
///
/// The id is supplied by the caller, who is responsible for having extracted
/// a usable one (see [`RawDrama::id`]).
///
/// # Examples
///
/// ```rust
/// use dramarr::domain::DramaId;
/// use dramarr::models::drama::RawDrama;
/// use dramarr::normalize::normalize;
/// use serde_json::json;
///
/// let raw = RawDrama::new(json!({
///     "id": 5,
///     "title": "A",
///     "alt_titles": ["A2"],
///     "original_title": "A",
///     "tags": [{"name": "Drama"}],
///     "genres": ["Romance"]
/// }));
///
/// let record = normalize(DramaId::new(5), &raw);
/// assert_eq!(record.synonyms, ["A2", "A"]);
/// ```
#[must_use]
pub fn normalize(id: DramaId, raw: &RawDrama) -> DramaRecord {
    let images = raw.get("images");

    DramaRecord {
        id,
        sources: string_list(raw.get("sources")),
        title: string_field(raw.get("title")),
        kind: string_field(raw.get("type")),
        episodes: scalar_field(raw.get("episodes")),
        status: string_field(raw.get("status")),
        year: scalar_field(raw.get("year")),
        picture: string_field(images.and_then(|i| i.get("poster"))),
        thumbnail: string_field(images.and_then(|i| i.get("thumb"))),
        synonyms: synonyms(raw),
        tags: tags(raw),
        foreign: serde_json::Map::new(),
    }
}

/// Alternate titles followed by the original title, unless it is already
/// listed. Repeats within the alternate titles are kept as sent.
fn synonyms(raw: &RawDrama) -> Vec<String> {
    let mut synonyms = string_list(raw.get("alt_titles"));

    if let Some(Value::String(original)) = raw.get("original_title")
        && !original.is_empty()
        && !synonyms.contains(original)
    {
        synonyms.push(original.clone());
    }

    synonyms
}

fn tags(raw: &RawDrama) -> Vec<Tag> {
    ["tags", "genres"]
        .into_iter()
        .filter_map(|key| raw.get(key).and_then(Value::as_array))
        .flatten()
        .map(Tag::from_raw)
        .collect()
}

fn string_field(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Episode counts and years come back as numbers or strings depending on the
/// endpoint; either is stored as sent.
fn scalar_field(value: Option<&Value>) -> Value {
    match value {
        Some(v @ (Value::Number(_) | Value::String(_))) => v.clone(),
        _ => Value::String(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::drama::CANONICAL_FIELDS;
    use serde_json::json;

    fn normalize_json(value: Value) -> DramaRecord {
        let raw = RawDrama::new(value);
        let id = raw.id().unwrap_or_default();
        normalize(id, &raw)
    }

    #[test]
    fn test_full_record() {
        let record = normalize_json(json!({
            "id": 5,
            "sources": ["https://mydramalist.com/5"],
            "title": "A",
            "type": "Drama",
            "episodes": 16,
            "status": "Airing",
            "year": 2024,
            "images": {"poster": "p.jpg", "thumb": "t.jpg"},
            "alt_titles": ["A2"],
            "original_title": "A",
            "tags": [{"id": 1, "name": "Drama"}],
            "genres": ["Romance"],
            "rating": 9.1
        }));

        assert_eq!(record.id, DramaId::new(5));
        assert_eq!(record.sources, ["https://mydramalist.com/5"]);
        assert_eq!(record.title, "A");
        assert_eq!(record.kind, "Drama");
        assert_eq!(record.episodes, json!(16));
        assert_eq!(record.status, "Airing");
        assert_eq!(record.year, json!(2024));
        assert_eq!(record.picture, "p.jpg");
        assert_eq!(record.thumbnail, "t.jpg");
        assert_eq!(record.synonyms, ["A2", "A"]);
        assert_eq!(record.tags, [Tag::from("Drama"), Tag::from("Romance")]);
        assert!(!record.has_foreign_fields());
    }

    #[test]
    fn test_output_has_exactly_canonical_keys() {
        let record = normalize_json(json!({"id": 1, "unexpected": {"deep": true}}));
        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let mut expected = CANONICAL_FIELDS.to_vec();
        expected.sort_unstable();
        let mut keys_sorted = keys.clone();
        keys_sorted.sort_unstable();
        assert_eq!(keys_sorted, expected);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let record = normalize_json(json!({"id": 2}));
        assert_eq!(record, DramaRecord::empty(DramaId::new(2)));
    }

    #[test]
    fn test_malformed_nested_fields_do_not_fail() {
        let record = normalize_json(json!({
            "id": 3,
            "images": "not-an-object",
            "alt_titles": null,
            "tags": {"name": "NotAList"},
            "genres": [null, 4],
            "episodes": null,
            "title": 12
        }));

        assert_eq!(record.picture, "");
        assert_eq!(record.thumbnail, "");
        assert!(record.synonyms.is_empty());
        assert_eq!(
            record.tags,
            [Tag::Unflattened(Value::Null), Tag::Unflattened(json!(4))]
        );
        assert_eq!(record.episodes, json!(""));
        assert_eq!(record.title, "");
    }

    #[test]
    fn test_images_without_thumb() {
        let record = normalize_json(json!({"id": 4, "images": {"poster": "p.jpg"}}));
        assert_eq!(record.picture, "p.jpg");
        assert_eq!(record.thumbnail, "");
    }

    #[test]
    fn test_original_title_appended_once() {
        let record = normalize_json(json!({
            "id": 6,
            "alt_titles": ["X", "Y"],
            "original_title": "Z"
        }));
        assert_eq!(record.synonyms, ["X", "Y", "Z"]);

        let record = normalize_json(json!({
            "id": 6,
            "alt_titles": ["X", "Y"],
            "original_title": "Y"
        }));
        assert_eq!(record.synonyms, ["X", "Y"]);
    }

    #[test]
    fn test_synonym_match_is_case_sensitive() {
        let record = normalize_json(json!({
            "id": 7,
            "alt_titles": ["hello"],
            "original_title": "Hello"
        }));
        assert_eq!(record.synonyms, ["hello", "Hello"]);
    }

    #[test]
    fn test_alt_title_repeats_are_preserved() {
        let record = normalize_json(json!({
            "id": 8,
            "alt_titles": ["Dup", "Dup"],
            "original_title": "Dup"
        }));
        assert_eq!(record.synonyms, ["Dup", "Dup"]);
    }

    #[test]
    fn test_mixed_tags_flatten_in_order() {
        let record = normalize_json(json!({
            "id": 9,
            "tags": ["One", {"name": "Two"}, "Three"],
            "genres": [{"name": "Four"}, "Five"]
        }));
        let names: Vec<&str> = record.tags.iter().filter_map(Tag::as_name).collect();
        assert_eq!(names, ["One", "Two", "Three", "Four", "Five"]);
    }

    #[test]
    fn test_string_episodes_preserved() {
        let record = normalize_json(json!({"id": 10, "episodes": "12", "year": "2023"}));
        assert_eq!(record.episodes, json!("12"));
        assert_eq!(record.year, json!("2023"));
    }
}
