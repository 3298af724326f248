use serde::{ Serialize, Deserialize };

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Faq {
    pub id: i64,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Form contents for creating or editing a FAQ. `id == None` means create.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaqDraft {
    pub id: Option<i64>,
    pub question: String,
    pub answer: String,
    pub category: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct FaqPayload<'a> {
    pub question: &'a str,
    pub answer: &'a str,
    pub category: &'a str,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UnknownQuestion {
    pub id: i64,
    pub question: String,
    #[serde(default)]
    pub asked_at: Option<String>,
    #[serde(default, deserialize_with = "int_or_bool")]
    pub answered: bool,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnswerUnknownRequest<'a> {
    pub question_id: i64,
    pub answer: &'a str,
    pub category: &'a str,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PopularQuestion {
    pub user_message: String,
    pub frequency: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DateCount {
    pub date: String,
    pub count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CategoryCount {
    #[serde(default)]
    pub category: Option<String>,
    pub count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub total_faqs: u64,
    pub unknown_total: u64,
    pub unknown_unanswered: u64,
    pub total_chats: u64,
    pub chats_today: u64,
    pub popular_questions: Vec<PopularQuestion>,
    pub unknown_trend: Vec<DateCount>,
    pub categories: Vec<CategoryCount>,
}

impl DashboardStats {
    pub fn answered_count(&self) -> u64 {
        self.unknown_total.saturating_sub(self.unknown_unanswered)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Analytics {
    pub daily_chats: Vec<DateCount>,
    pub daily_unknown: Vec<DateCount>,
    pub response_rate: f64,
    pub total_queries: u64,
    pub pending_unknown: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub similarity_threshold: f64,
    pub exact_threshold: f64,
    pub enable_suggestions: bool,
    pub enable_tts: bool,
    pub auto_refresh: bool,
}

/// Filter for the unknown-question triage list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum UnknownFilter {
    All,
    Answered,
    #[default]
    Unanswered,
}

impl UnknownFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnknownFilter::All => "all",
            UnknownFilter::Answered => "answered",
            UnknownFilter::Unanswered => "unanswered",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaqQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnknownPage {
    pub questions: Vec<UnknownQuestion>,
    pub pagination: Option<Pagination>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FaqPage {
    pub faqs: Vec<Faq>,
    pub categories: Vec<String>,
    pub pagination: Option<Pagination>,
}

// SQLite reports booleans as 0/1, PostgreSQL as true/false.
fn int_or_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where D: serde::Deserializer<'de>
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_question_answered_flag_accepts_integers() {
        let q: UnknownQuestion = serde_json::from_str(
            r#"{"id":3,"question":"q","asked_at":"2024-01-01 10:00:00","answered":1,"session_id":null}"#
        ).unwrap();
        assert!(q.answered);
        let q: UnknownQuestion = serde_json::from_str(r#"{"id":4,"question":"q","answered":false}"#).unwrap();
        assert!(!q.answered);
    }

    #[test]
    fn stats_answered_count_never_underflows() {
        let stats = DashboardStats { unknown_total: 2, unknown_unanswered: 5, ..Default::default() };
        assert_eq!(stats.answered_count(), 0);
    }
}
