//! Request and response shapes for the `/api` routes.

use serde::Deserialize;
use serde::Serialize;

use crate::Item;

/// Response body of `GET /api/items`.
///
/// `total` counts every item matching the search, before pagination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsPage {
    pub items: Vec<Item>,
    pub total: usize,
}

/// Body returned with every non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Query parameters accepted by `GET /api/items`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Case-insensitive substring matched against `name`.
    pub q: Option<String>,
    /// Page size. Without it the whole match set is returned.
    pub limit: Option<usize>,
    /// 1-based page number; only meaningful together with `limit`.
    pub page: Option<usize>,
}

impl ListQuery {
    /// Parse decoded query pairs. Empty or unparsable values are ignored and
    /// the last occurrence of a key wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "q" => query.q = (!value.is_empty()).then(|| value.to_string()),
                "limit" => match value.trim().parse::<usize>() {
                    Ok(limit) => query.limit = Some(limit),
                    Err(err) => tracing::debug!("ignoring limit={value:?}: {err}"),
                },
                "page" => match value.trim().parse::<usize>() {
                    Ok(page) if page >= 1 => query.page = Some(page),
                    _ => tracing::debug!("ignoring page={value:?}"),
                },
                _ => {}
            }
        }
        query
    }

    /// Encode as `(key, value)` pairs in the order the client sends them.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) {
            pairs.push(("q", q.to_string()));
        }
        pairs
    }

    /// Filter `items` by name, then cut out the requested page.
    pub fn apply(&self, items: Vec<Item>) -> ItemsPage {
        let needle = self.q.as_deref().unwrap_or_default().to_lowercase();
        let matching: Vec<Item> = items
            .into_iter()
            .filter(|item| item.name_matches(&needle))
            .collect();
        let total = matching.len();

        let items = match self.limit {
            Some(limit) => {
                let page = self.page.unwrap_or(1).max(1);
                let start = (page - 1).saturating_mul(limit);
                matching.into_iter().skip(start).take(limit).collect()
            }
            None => matching,
        };

        ItemsPage { items, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn catalog() -> Vec<Item> {
        serde_json::from_value(json!([
            { "id": 1, "name": "Alpha Widget", "category": "tools" },
            { "id": 2, "name": "Beta Gadget", "category": "tools" },
            { "id": 3, "name": "Gamma", "category": "misc" },
            { "id": 4, "name": "alphabet soup", "category": "food" },
            { "id": 5, "name": "Delta", "category": "misc" }
        ]))
        .unwrap()
    }

    fn ids(page: &ItemsPage) -> Vec<i64> {
        page.items.iter().map(|item| item.id).collect()
    }

    #[test]
    fn search_matches_name_case_insensitively() {
        let query = ListQuery::from_pairs([("q", "ALPHA")]);
        let page = query.apply(catalog());

        assert_eq!(ids(&page), vec![1, 4]);
        assert_eq!(page.total, 2);
        for item in &page.items {
            assert!(item.name.to_lowercase().contains("alpha"));
        }
    }

    #[test]
    fn search_does_not_look_at_category() {
        let page = ListQuery::from_pairs([("q", "tools")]).apply(catalog());
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn limit_truncates_to_min_of_limit_and_matches() {
        for n in 0..8 {
            let query = ListQuery::from_pairs([("limit", n.to_string())]);
            let page = query.apply(catalog());
            assert_eq!(page.items.len(), n.min(5), "limit={n}");
            assert_eq!(page.total, 5);
        }
    }

    #[test]
    fn page_selects_window() {
        let query = ListQuery::from_pairs([("page", "2"), ("limit", "2")]);
        assert_eq!(ids(&query.apply(catalog())), vec![3, 4]);

        let query = ListQuery::from_pairs([("page", "3"), ("limit", "2")]);
        assert_eq!(ids(&query.apply(catalog())), vec![5]);

        let query = ListQuery::from_pairs([("page", "9"), ("limit", "2")]);
        let page = query.apply(catalog());
        assert!(page.items.is_empty());
        assert_eq!(page.total, 5);
    }

    #[test]
    fn page_without_limit_is_ignored() {
        let query = ListQuery::from_pairs([("page", "4")]);
        assert_eq!(query.apply(catalog()).items.len(), 5);
    }

    #[test]
    fn garbage_values_are_ignored() {
        let query = ListQuery::from_pairs([("limit", "ten"), ("page", "0"), ("q", "")]);
        assert_eq!(query, ListQuery::default());
    }

    #[test]
    fn pairs_skip_empty_search() {
        let query = ListQuery {
            q: Some(String::new()),
            limit: Some(20),
            page: Some(1),
        };
        assert_eq!(
            query.to_pairs(),
            vec![("page", "1".to_string()), ("limit", "20".to_string())]
        );
    }

    #[test]
    fn items_page_wire_shape() {
        let page = ListQuery::from_pairs([("q", "gamma")]).apply(catalog());
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({
                "items": [{ "id": 3, "name": "Gamma", "description": "", "category": "misc" }],
                "total": 1
            })
        );
    }
}
