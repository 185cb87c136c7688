use crate::domain::chart::{self, Candle};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// One question of a quiz set as served by `/quiz/getQuiz`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizItem {
    pub id: i64,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    // Checked server-side only.
    #[serde(rename = "correctAnswer", default, skip_serializing)]
    pub correct_answer: Option<String>,
    /// JSON array of price points, serialized as a string.
    pub quiz_data: String,
    /// JSON array of hint strings, serialized as a string.
    #[serde(default)]
    pub hint: String,
}

impl QuizItem {
    pub fn hints(&self) -> anyhow::Result<Vec<String>> {
        chart::parse_hints(&self.hint)
    }

    /// Hints for display; a malformed payload counts as no hints.
    pub fn hints_lenient(&self) -> Vec<String> {
        match self.hints() {
            Ok(hints) => hints,
            Err(err) => {
                tracing::warn!(quiz_id = self.id, error = %err, "malformed hint payload");
                Vec::new()
            }
        }
    }

    pub fn hint_count(&self) -> usize {
        self.hints_lenient().len()
    }

    pub fn candles(&self) -> anyhow::Result<Vec<Candle>> {
        chart::parse_candles(&self.quiz_data)
    }
}

/// Per-item progress within the loaded quiz set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizState {
    pub solved: bool,
    pub correct: bool,
    pub attempts: u32,
}

impl QuizState {
    pub fn fresh_for(items: &[QuizItem]) -> Vec<QuizState> {
        vec![QuizState::default(); items.len()]
    }
}

/// One past round listed by `/quiz/getQuizHistory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizHistoryItem {
    #[serde(default)]
    pub created_at: String,
    #[serde(deserialize_with = "de_round")]
    pub round: i64,
}

impl QuizHistoryItem {
    /// Calendar date of `created_at`, accepting RFC 3339, `YYYY-MM-DD HH:MM:SS[+tz]` and plain dates.
    pub fn created_date(&self) -> Option<NaiveDate> {
        let t = self.created_at.trim();
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(t) {
            return Some(dt.date_naive());
        }
        // Postgres style timestamps ("2025-02-10 09:00:00.123+00").
        let date_part = t.get(..10)?;
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }
}

fn de_round<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Round {
        Int(i64),
        Text(String),
    }

    match Round::deserialize(deserializer)? {
        Round::Int(n) => Ok(n),
        Round::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("round is not a number: {s}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_quiz_item_wire_shape() {
        let v = json!({
            "id": 7,
            "question": "Which company is this?",
            "options": [],
            "correctAnswer": "Samsung",
            "quiz_data": "[]",
            "hint": "[\"KOSPI listed\", \"Semiconductors\"]"
        });

        let item: QuizItem = serde_json::from_value(v).unwrap();
        assert_eq!(item.id, 7);
        assert_eq!(item.hints().unwrap(), vec!["KOSPI listed", "Semiconductors"]);
        assert_eq!(item.hint_count(), 2);

        let back = serde_json::to_value(&item).unwrap();
        assert!(back.get("correctAnswer").is_none());
    }

    #[test]
    fn malformed_hints_count_as_none() {
        let v = json!({"id": 1, "quiz_data": "[]", "hint": "not json"});
        let item: QuizItem = serde_json::from_value(v).unwrap();
        assert!(item.hints().is_err());
        assert_eq!(item.hint_count(), 0);
    }

    #[test]
    fn history_round_accepts_number_or_string() {
        let items: Vec<QuizHistoryItem> = serde_json::from_value(json!([
            {"created_at": "2025-02-10T00:00:00.000Z", "round": 3},
            {"created_at": "2025-02-03 09:00:00+00", "round": "2"},
        ]))
        .unwrap();

        assert_eq!(items[0].round, 3);
        assert_eq!(items[1].round, 2);
        assert_eq!(
            items[0].created_date(),
            NaiveDate::from_ymd_opt(2025, 2, 10)
        );
        assert_eq!(items[1].created_date(), NaiveDate::from_ymd_opt(2025, 2, 3));
    }

    #[test]
    fn history_round_rejects_garbage() {
        let res = serde_json::from_value::<QuizHistoryItem>(json!({"created_at": "", "round": "x"}));
        assert!(res.is_err());
    }
}
