use crate::api::error::ApiStatusError;
use crate::api::{
    CheckAnswerRequest, CheckAnswerResponse, HistoryResponse, QuizApi, StockListResponse,
};
use crate::config::Settings;
use crate::domain::quiz::{QuizHistoryItem, QuizItem};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;

const PATH_GET_QUIZ: &str = "/quiz/getQuiz";
const PATH_GET_HISTORY: &str = "/quiz/getQuizHistory";
const PATH_STOCK_LIST: &str = "/quiz/stockList";
const PATH_CHECK_ANSWER: &str = "/quiz/checkAnswer";

#[derive(Debug, Clone)]
pub struct HttpQuizApi {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl HttpQuizApi {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_api_base_url()?.to_string();
        let timeout_secs = settings.api_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let retries = settings.api_retries.unwrap_or(DEFAULT_RETRIES);
        Self::new(base_url, Duration::from_secs(timeout_secs), retries)
    }

    pub fn new(base_url: impl Into<String>, timeout: Duration, retries: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build quiz API http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            retries: retries.max(1),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let res = self
            .http
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .with_context(|| format!("quiz API request failed: GET {endpoint}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read response body: GET {endpoint}"))?;

        if !status.is_success() {
            return Err(ApiStatusError {
                endpoint,
                status,
                body: text,
            }
            .into());
        }

        serde_json::from_str::<T>(&text)
            .with_context(|| format!("unexpected response shape from GET {endpoint}: {text}"))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.get_once(endpoint, query).await {
                Ok(parsed) => return Ok(parsed),
                Err(err) => {
                    let retryable = err
                        .downcast_ref::<ApiStatusError>()
                        .map_or(true, ApiStatusError::is_retryable);
                    if !retryable || attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, endpoint, error = %err, "quiz API fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl QuizApi for HttpQuizApi {
    async fn fetch_current_quiz_set(&self) -> Result<Vec<QuizItem>> {
        self.get_json(PATH_GET_QUIZ, &[]).await
    }

    async fn fetch_round_quiz_set(&self, round: i64) -> Result<Vec<QuizItem>> {
        self.get_json(PATH_GET_QUIZ, &[("round", round.to_string())])
            .await
            .with_context(|| format!("failed to load quiz set for round {round}"))
    }

    async fn fetch_history(&self) -> Result<Vec<QuizHistoryItem>> {
        let res: HistoryResponse = self.get_json(PATH_GET_HISTORY, &[]).await?;
        res.into_items().context("failed to parse quiz history items")
    }

    async fn fetch_stock_list(&self) -> Result<Vec<String>> {
        let res: StockListResponse = self.get_json(PATH_STOCK_LIST, &[]).await?;
        Ok(res.into_names())
    }

    async fn check_answer(&self, quiz_id: i64, answer: &str) -> Result<CheckAnswerResponse> {
        // Not retried: every call counts as an attempt.
        let res = self
            .http
            .post(self.url(PATH_CHECK_ANSWER))
            .json(&CheckAnswerRequest { quiz_id, answer })
            .send()
            .await
            .context("quiz API request failed: POST /quiz/checkAnswer")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read checkAnswer response body")?;

        match serde_json::from_str::<CheckAnswerResponse>(&text) {
            Ok(parsed) => {
                tracing::debug!(quiz_id, %status, correct = parsed.is_success, "answer checked");
                Ok(parsed)
            }
            Err(err) if !status.is_success() => Err(anyhow::Error::new(ApiStatusError {
                endpoint: PATH_CHECK_ANSWER,
                status,
                body: text,
            })
            .context(err.to_string())),
            Err(err) => Err(err)
                .with_context(|| format!("unexpected response shape from POST /quiz/checkAnswer: {text}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_url_without_double_slash() {
        let api = HttpQuizApi::new("http://localhost:3000/api/", Duration::from_secs(1), 0).unwrap();
        assert_eq!(api.url(PATH_GET_QUIZ), "http://localhost:3000/api/quiz/getQuiz");
        assert_eq!(api.retries, 1);
    }

    #[test]
    fn from_settings_requires_base_url() {
        let settings = Settings {
            api_base_url: None,
            api_timeout_secs: None,
            api_retries: None,
            sentry_dsn: None,
        };
        assert!(HttpQuizApi::from_settings(&settings).is_err());
    }
}
