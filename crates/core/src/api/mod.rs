pub mod error;
pub mod http;

use crate::domain::quiz::{QuizHistoryItem, QuizItem};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use http::HttpQuizApi;

/// Remote quiz service as seen by a session.
#[async_trait::async_trait]
pub trait QuizApi: Send + Sync {
    async fn fetch_current_quiz_set(&self) -> Result<Vec<QuizItem>>;

    async fn fetch_round_quiz_set(&self, round: i64) -> Result<Vec<QuizItem>>;

    async fn fetch_history(&self) -> Result<Vec<QuizHistoryItem>>;

    async fn fetch_stock_list(&self) -> Result<Vec<String>>;

    async fn check_answer(&self, quiz_id: i64, answer: &str) -> Result<CheckAnswerResponse>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswerRequest<'a> {
    pub quiz_id: i64,
    pub answer: &'a str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckAnswerResponse {
    #[serde(default)]
    pub is_success: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default)]
    pub is_success: bool,
    #[serde(default)]
    pub history: Value,
}

impl HistoryResponse {
    pub(crate) fn into_items(self) -> Result<Vec<QuizHistoryItem>> {
        if !self.is_success || !self.history.is_array() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(self.history)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StockListResponse {
    #[serde(default)]
    pub is_success: bool,
    #[serde(default)]
    pub list: Value,
}

impl StockListResponse {
    pub(crate) fn into_names(self) -> Vec<String> {
        if !self.is_success {
            return Vec::new();
        }
        match self.list {
            Value::Array(values) => values
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn check_answer_request_uses_camel_case() {
        let body = serde_json::to_value(CheckAnswerRequest {
            quiz_id: 12,
            answer: "Samsung",
        })
        .unwrap();
        assert_eq!(body, json!({"quizId": 12, "answer": "Samsung"}));
    }

    #[test]
    fn check_answer_response_keeps_extra_fields() {
        let res: CheckAnswerResponse =
            serde_json::from_value(json!({"is_success": false, "message": "nope"})).unwrap();
        assert!(!res.is_success);
        assert_eq!(res.extra.get("message"), Some(&json!("nope")));
    }

    #[test]
    fn failed_history_response_is_empty() {
        let res: HistoryResponse =
            serde_json::from_value(json!({"is_success": false, "history": [{"created_at": "", "round": 1}]}))
                .unwrap();
        assert!(res.into_items().unwrap().is_empty());

        let res: HistoryResponse =
            serde_json::from_value(json!({"is_success": true, "history": "oops"})).unwrap();
        assert!(res.into_items().unwrap().is_empty());
    }

    #[test]
    fn stock_list_skips_non_strings() {
        let res: StockListResponse = serde_json::from_value(
            json!({"is_success": true, "list": ["Samsung", 3, null, "Kakao"]}),
        )
        .unwrap();
        assert_eq!(res.into_names(), vec!["Samsung", "Kakao"]);

        let res: StockListResponse =
            serde_json::from_value(json!({"is_success": true, "list": {}})).unwrap();
        assert!(res.into_names().is_empty());
    }
}
