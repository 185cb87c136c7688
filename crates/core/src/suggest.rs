use crate::api::QuizApi;

/// Company names for answer autocomplete, fetched once and filtered locally.
#[derive(Debug, Clone, Default)]
pub struct StockSuggestions {
    names: Vec<String>,
}

impl StockSuggestions {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Any failure leaves the list empty.
    pub async fn load(api: &dyn QuizApi) -> Self {
        match api.fetch_stock_list().await {
            Ok(names) => {
                tracing::debug!(count = names.len(), "stock list loaded");
                Self::new(names)
            }
            Err(err) => {
                tracing::warn!(error = %err, "stock list unavailable; suggestions disabled");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Case-insensitive substring match, in list order. An empty query matches nothing.
    pub fn filter(&self, query: &str) -> Vec<&str> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.names
            .iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> StockSuggestions {
        StockSuggestions::new(
            ["Samsung Electronics", "SK hynix", "Samsung SDI", "NAVER"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }

    #[test]
    fn filters_case_insensitively_in_order() {
        let s = names();
        assert_eq!(s.filter("samsung"), vec!["Samsung Electronics", "Samsung SDI"]);
        assert_eq!(s.filter("NIX"), vec!["SK hynix"]);
        assert!(s.filter("kakao").is_empty());
    }

    #[test]
    fn empty_query_suggests_nothing() {
        assert!(names().filter("").is_empty());
        assert!(names().filter("  ").is_empty());
    }
}
