use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::Item;

/// Bucket used for items that carry no category.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Aggregate counts over the whole catalog.
///
/// `by_category` values always sum to `total`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
}

impl Stats {
    pub fn from_items(items: &[Item]) -> Self {
        let mut by_category = BTreeMap::new();
        for item in items {
            let key = item.category.as_deref().unwrap_or(UNCATEGORIZED);
            *by_category.entry(key.to_string()).or_insert(0) += 1;
        }
        Self {
            total: items.len(),
            by_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn items(raw: serde_json::Value) -> Vec<Item> {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn tallies_by_category() {
        let items = items(json!([
            { "id": 1, "name": "Alpha Widget", "category": "tools" },
            { "id": 2, "name": "Beta Gadget", "category": "tools" },
            { "id": 3, "name": "Gamma", "category": "misc" }
        ]));

        let stats = Stats::from_items(&items);
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({ "total": 3, "byCategory": { "misc": 1, "tools": 2 } })
        );
    }

    #[test]
    fn missing_category_lands_in_uncategorized() {
        let items = items(json!([
            { "id": 1, "name": "a" },
            { "id": 2, "name": "b", "category": "misc" }
        ]));

        let stats = Stats::from_items(&items);
        assert_eq!(stats.by_category.get(UNCATEGORIZED), Some(&1));
        assert_eq!(stats.by_category.values().sum::<usize>(), stats.total);
    }

    #[test]
    fn non_string_category_is_keyed_by_its_json_text() {
        let items = items(json!([
            { "id": 1, "name": "a", "category": 7 },
            { "id": 2, "name": "b", "category": null, "description": null }
        ]));

        let stats = Stats::from_items(&items);
        assert_eq!(stats.by_category.get("7"), Some(&1));
        assert_eq!(stats.by_category.get(UNCATEGORIZED), Some(&1));
        assert_eq!(stats.total, 2);
    }

    #[test]
    fn empty_catalog() {
        assert_eq!(Stats::from_items(&[]), Stats::default());
    }
}
