use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{ AtomicBool, Ordering };
use crate::api::{ AdminApi, ApiError };
use crate::models::admin::{
    Analytics,
    CategoryCount,
    DashboardStats,
    Faq,
    FaqPage,
    FaqPayload,
    FaqQuery,
    Settings,
    UnknownFilter,
    UnknownPage,
    UnknownQuestion,
};

/// In-memory admin backend that accepts a single token.
pub struct FakeAdminApi {
    token: String,
    login_error: Option<String>,
    failure: Option<String>,
    expired: AtomicBool,
    faqs: Vec<Faq>,
    unknown: Vec<UnknownQuestion>,
    calls: Mutex<Vec<String>>,
}

impl FakeAdminApi {
    pub fn new(token: &str) -> Self {
        let faqs = (1..=3)
            .map(|id| Faq {
                id,
                question: format!("Question {}", id),
                answer: format!("Answer {}", id),
                category: Some("General".into()),
                created_at: None,
                updated_at: None,
            })
            .collect();
        Self {
            token: token.to_string(),
            login_error: None,
            failure: None,
            expired: AtomicBool::new(false),
            faqs,
            unknown: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting_login(mut self, message: &str) -> Self {
        self.login_error = Some(message.to_string());
        self
    }

    /// Every authenticated call is rejected with `message` (none when empty).
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn with_unknown(mut self, count: i64) -> Self {
        self.unknown = (1..=count)
            .map(|id| UnknownQuestion {
                id,
                question: format!("Unknown {}", id),
                asked_at: None,
                answered: false,
                session_id: None,
            })
            .collect();
        self
    }

    pub fn expire_token(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn authorize(&self, token: &str) -> Result<(), ApiError> {
        if token != self.token || self.expired.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthorized { message: Some("Invalid token".into()) });
        }
        match &self.failure {
            Some(message) => Err(ApiError::Rejected {
                message: Some(message.clone()).filter(|m| !m.is_empty()),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AdminApi for FakeAdminApi {
    async fn login(&self, username: &str, _password: &str) -> Result<String, ApiError> {
        self.record(format!("login {}", username));
        match &self.login_error {
            Some(message) => Err(ApiError::Rejected { message: Some(message.clone()) }),
            None => Ok(self.token.clone()),
        }
    }

    async fn verify(&self, token: &str) -> Result<(), ApiError> {
        self.record("verify".into());
        self.authorize(token)
    }

    async fn stats(&self, token: &str) -> Result<DashboardStats, ApiError> {
        self.record("stats".into());
        self.authorize(token)?;
        Ok(DashboardStats {
            total_faqs: self.faqs.len() as u64,
            unknown_total: self.unknown.len() as u64,
            unknown_unanswered: self.unknown.iter().filter(|q| !q.answered).count() as u64,
            categories: vec![CategoryCount { category: Some("General".into()), count: self.faqs.len() as u64 }],
            ..Default::default()
        })
    }

    async fn unknown_questions(
        &self,
        token: &str,
        filter: UnknownFilter,
        page: u32,
        limit: u32
    ) -> Result<UnknownPage, ApiError> {
        self.record(format!("unknown_questions {} {} {}", filter.as_str(), page, limit));
        self.authorize(token)?;
        let questions = self.unknown
            .iter()
            .filter(|q| match filter {
                UnknownFilter::All => true,
                UnknownFilter::Answered => q.answered,
                UnknownFilter::Unanswered => !q.answered,
            })
            .skip(((page.max(1) - 1) * limit) as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(UnknownPage { questions, pagination: None })
    }

    async fn unknown_question(&self, token: &str, id: i64) -> Result<UnknownQuestion, ApiError> {
        self.record(format!("unknown_question {}", id));
        self.authorize(token)?;
        self.unknown
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .ok_or(ApiError::Status { status: 404, message: Some("Question not found".into()) })
    }

    async fn answer_unknown(
        &self,
        token: &str,
        question_id: i64,
        _answer: &str,
        _category: &str
    ) -> Result<Option<i64>, ApiError> {
        self.record(format!("answer_unknown {}", question_id));
        self.authorize(token)?;
        Ok(Some(self.faqs.len() as i64 + 1))
    }

    async fn faqs(&self, token: &str, query: &FaqQuery) -> Result<FaqPage, ApiError> {
        self.record(format!("faqs {}", query.page));
        self.authorize(token)?;
        Ok(FaqPage { faqs: self.faqs.clone(), categories: vec!["General".into()], pagination: None })
    }

    async fn faq(&self, token: &str, id: i64) -> Result<Faq, ApiError> {
        self.record(format!("faq {}", id));
        self.authorize(token)?;
        self.faqs
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or(ApiError::Status { status: 404, message: Some("FAQ not found".into()) })
    }

    async fn create_faq(&self, token: &str, _faq: &FaqPayload<'_>) -> Result<Option<i64>, ApiError> {
        self.record("create_faq".into());
        self.authorize(token)?;
        Ok(Some(self.faqs.len() as i64 + 1))
    }

    async fn update_faq(&self, token: &str, id: i64, _faq: &FaqPayload<'_>) -> Result<(), ApiError> {
        self.record(format!("update_faq {}", id));
        self.authorize(token)
    }

    async fn delete_faq(&self, token: &str, id: i64) -> Result<(), ApiError> {
        self.record(format!("delete_faq {}", id));
        self.authorize(token)
    }

    async fn analytics(&self, token: &str, days: u32) -> Result<Analytics, ApiError> {
        self.record(format!("analytics {}", days));
        self.authorize(token)?;
        Ok(Analytics::default())
    }

    async fn settings(&self, token: &str) -> Result<Settings, ApiError> {
        self.record("settings".into());
        self.authorize(token)?;
        Ok(Settings::default())
    }
}
