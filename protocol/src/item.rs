use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// A catalog entry as stored on disk and returned over HTTP.
///
/// Only `id` is required. Fields the catalog does not know about are kept in
/// `extra` and written back unchanged. The text fields accept any JSON value:
/// `null` reads as absent and other non-strings read as their JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(
        default,
        deserialize_with = "lenient_category",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Build an item from an arbitrary JSON object, forcing `id`.
    ///
    /// Any `id` already present in `fields` is replaced.
    pub fn from_fields(mut fields: Map<String, Value>, id: i64) -> Result<Self, serde_json::Error> {
        fields.insert("id".to_string(), Value::from(id));
        serde_json::from_value(Value::Object(fields))
    }

    /// Case-insensitive substring match against the name.
    ///
    /// `needle` must already be lowercased.
    pub fn name_matches(&self, needle: &str) -> bool {
        needle.is_empty() || self.name.to_lowercase().contains(needle)
    }
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(text_of)
        .unwrap_or_default())
}

fn lenient_category<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .filter(|value| !value.is_null())
        .map(text_of))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn unknown_fields_survive_roundtrip() {
        let raw = json!({
            "id": 7,
            "name": "Laptop Pro",
            "category": "Electronics",
            "price": 2499,
            "tags": ["sale"]
        });

        let item: Item = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(item.extra.get("price"), Some(&json!(2499)));
        assert_eq!(item.description, "");

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["price"], raw["price"]);
        assert_eq!(back["tags"], raw["tags"]);
        assert_eq!(back["category"], raw["category"]);
    }

    #[test]
    fn missing_category_is_not_serialized() {
        let item: Item = serde_json::from_value(json!({ "id": 1, "name": "Gamma" })).unwrap();
        let back = serde_json::to_value(&item).unwrap();
        assert!(back.get("category").is_none());
    }

    #[test]
    fn from_fields_overrides_client_supplied_id() {
        let fields = json!({ "id": 1, "name": "Delta", "category": "misc" });
        let Value::Object(fields) = fields else {
            panic!("expected object");
        };

        let item = Item::from_fields(fields, 1_700_000_000_000).unwrap();
        assert_eq!(item.id, 1_700_000_000_000);
        assert_eq!(item.name, "Delta");
        assert_eq!(item.category.as_deref(), Some("misc"));
        assert!(item.extra.is_empty());
    }

    #[test]
    fn loosely_typed_text_fields_are_tolerated() {
        let item: Item = serde_json::from_value(json!({
            "id": 2,
            "name": null,
            "description": null,
            "category": 7
        }))
        .unwrap();
        assert_eq!(item.name, "");
        assert_eq!(item.description, "");
        assert_eq!(item.category.as_deref(), Some("7"));

        let item: Item =
            serde_json::from_value(json!({ "id": 3, "name": 42, "category": null })).unwrap();
        assert_eq!(item.name, "42");
        assert_eq!(item.category, None);
    }

    #[test]
    fn from_fields_accepts_any_field_types() {
        let Value::Object(fields) = json!({ "name": ["a", "b"], "description": null }) else {
            panic!("expected object");
        };
        let item = Item::from_fields(fields, 1).unwrap();
        assert_eq!(item.name, r#"["a","b"]"#);
        assert_eq!(item.description, "");
    }

    #[test]
    fn name_matching_ignores_case() {
        let item: Item = serde_json::from_value(json!({ "id": 1, "name": "Alpha Widget" })).unwrap();
        assert!(item.name_matches("alpha"));
        assert!(item.name_matches("widget"));
        assert!(item.name_matches(""));
        assert!(!item.name_matches("gadget"));
    }
}
