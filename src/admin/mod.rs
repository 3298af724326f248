//! Admin dashboard controller: token lifecycle, tab navigation, and FAQ / unknown-question
//! management on top of [`AdminApi`].
#[cfg(test)]
mod testing;

use log::{ debug, error, info, warn };
use std::sync::Arc;
use thiserror::Error;
use crate::api::{ AdminApi, ApiError };
use crate::models::admin::{
    Analytics,
    DashboardStats,
    Faq,
    FaqDraft,
    FaqPage,
    FaqPayload,
    FaqQuery,
    Settings,
    UnknownFilter,
    UnknownPage,
    UnknownQuestion,
};
use crate::platform::{ Confirm, NotificationKind, Notifier };
use crate::storage::{ KeyValueStore, StorageError, ADMIN_TOKEN_KEY };

pub const RECENT_UNKNOWN_LIMIT: u32 = 5;
pub const DELETE_FAQ_PROMPT: &str = "Are you sure you want to delete this FAQ?";

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("not logged in")]
    NotAuthenticated,
    #[error("session expired, log in again")]
    Unauthorized,
    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ApiError,
    },
    #[error("local storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminView {
    Login,
    Dashboard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Unknown,
    Faqs,
    Analytics,
    Settings,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TabData {
    Overview {
        stats: DashboardStats,
        recent_unknown: Vec<UnknownQuestion>,
    },
    Unknown(UnknownPage),
    Faqs(FaqPage),
    Analytics(Analytics),
    Settings(Settings),
}

/// Notification texts for one remote operation: `failed` when the server rejects the
/// request without a message, `error` when it cannot be reached.
struct OpMessages {
    failed: &'static str,
    error: &'static str,
}

const LOAD_DASHBOARD: OpMessages = OpMessages {
    failed: "Failed to load dashboard data",
    error: "Error loading dashboard data",
};
const LOAD_UNKNOWN: OpMessages = OpMessages {
    failed: "Failed to load unknown questions",
    error: "Error loading unknown questions",
};
const LOAD_FAQS: OpMessages = OpMessages { failed: "Failed to load FAQs", error: "Error loading FAQs" };
const LOAD_ANALYTICS: OpMessages = OpMessages {
    failed: "Failed to load analytics",
    error: "Error loading analytics",
};
const LOAD_SETTINGS: OpMessages = OpMessages {
    failed: "Failed to load settings",
    error: "Error loading settings",
};
const ANSWER_UNKNOWN: OpMessages = OpMessages { failed: "Failed to add answer", error: "Error submitting answer" };
const SAVE_FAQ: OpMessages = OpMessages { failed: "Operation failed", error: "Error saving FAQ" };
const DELETE_FAQ: OpMessages = OpMessages { failed: "Delete failed", error: "Error deleting FAQ" };

pub struct AdminDashboard {
    api: Arc<dyn AdminApi>,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
    token: Option<String>,
    view: AdminView,
    tab: Tab,
    analytics_days: u32,
}

impl AdminDashboard {
    /// Picks up a cached token. The view stays on `Login` until the token is verified.
    pub async fn open(
        api: Arc<dyn AdminApi>,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>
    ) -> Result<Self, AdminError> {
        let token = store.get(ADMIN_TOKEN_KEY).await?.filter(|t| !t.is_empty());
        Ok(Self {
            api,
            store,
            notifier,
            confirm,
            token,
            view: AdminView::Login,
            tab: Tab::Overview,
            analytics_days: 7,
        })
    }

    pub fn view(&self) -> AdminView {
        self.view
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_analytics_days(&mut self, days: u32) {
        self.analytics_days = days.max(1);
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), AdminError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(self.invalid("Please enter username and password"));
        }
        match self.api.login(username, password).await {
            Ok(token) => {
                self.store.set(ADMIN_TOKEN_KEY, &token).await?;
                self.token = Some(token);
                self.view = AdminView::Dashboard;
                self.tab = Tab::Overview;
                info!("Logged in as {}", username);
                self.notifier.notify(NotificationKind::Success, "Login successful!");
                Ok(())
            }
            Err(e) => {
                error!("Login error: {}", e);
                let message = match &e {
                    ApiError::Unreachable(_) | ApiError::Transport(_) =>
                        "Connection error. Make sure backend is running.".to_string(),
                    other => other.server_message().unwrap_or("Login failed").to_string(),
                };
                self.notifier.notify(NotificationKind::Error, &message);
                Err(AdminError::Api { message, source: e })
            }
        }
    }

    /// Checks the cached token with the backend. Any failure discards it.
    pub async fn verify_token(&mut self) -> Result<(), AdminError> {
        let token = self.token.clone().ok_or(AdminError::NotAuthenticated)?;
        match self.api.verify(&token).await {
            Ok(()) => {
                self.view = AdminView::Dashboard;
                Ok(())
            }
            Err(e) => {
                warn!("Token verification error: {}", e);
                self.drop_token().await;
                Err(AdminError::Unauthorized)
            }
        }
    }

    pub async fn logout(&mut self) -> Result<(), AdminError> {
        self.token = None;
        self.view = AdminView::Login;
        self.store.remove(ADMIN_TOKEN_KEY).await?;
        self.notifier.notify(NotificationKind::Success, "Logged out successfully");
        Ok(())
    }

    pub async fn switch_tab(&mut self, tab: Tab) -> Result<TabData, AdminError> {
        self.tab = tab;
        debug!("Switching to {:?} tab", tab);
        match tab {
            Tab::Overview => self.overview().await,
            Tab::Unknown => Ok(TabData::Unknown(self.unknown_questions(UnknownFilter::Unanswered, 1, 20).await?)),
            Tab::Faqs => Ok(TabData::Faqs(self.faqs(&FaqQuery { page: 1, limit: 20, ..Default::default() }).await?)),
            Tab::Analytics => {
                let days = self.analytics_days;
                Ok(TabData::Analytics(self.analytics(days).await?))
            }
            Tab::Settings => Ok(TabData::Settings(self.settings().await?)),
        }
    }

    /// Dashboard counters plus the most recent unanswered questions.
    pub async fn overview(&mut self) -> Result<TabData, AdminError> {
        let token = self.token()?;
        let stats = self.api.stats(&token).await;
        let stats = self.settle(stats, &LOAD_DASHBOARD).await?;
        let recent = self.api.unknown_questions(&token, UnknownFilter::Unanswered, 1, RECENT_UNKNOWN_LIMIT).await;
        let recent_unknown = match recent {
            Ok(page) => page.questions,
            Err(ApiError::Unauthorized { .. }) => {
                self.drop_token().await;
                return Err(AdminError::Unauthorized);
            }
            Err(e) => {
                // The counters are still worth showing.
                error!("Error loading recent unknown questions: {}", e);
                Vec::new()
            }
        };
        Ok(TabData::Overview { stats, recent_unknown })
    }

    pub async fn unknown_questions(
        &mut self,
        filter: UnknownFilter,
        page: u32,
        limit: u32
    ) -> Result<UnknownPage, AdminError> {
        let token = self.token()?;
        let result = self.api.unknown_questions(&token, filter, page.max(1), limit.max(1)).await;
        self.settle(result, &LOAD_UNKNOWN).await
    }

    pub async fn unknown_question(&mut self, id: i64) -> Result<UnknownQuestion, AdminError> {
        let token = self.token()?;
        let result = self.api.unknown_question(&token, id).await;
        self.settle(result, &LOAD_UNKNOWN).await
    }

    /// Publishes an answer for an unknown question. Returns the created FAQ id when reported.
    pub async fn answer_unknown(
        &mut self,
        question_id: i64,
        answer: &str,
        category: &str
    ) -> Result<Option<i64>, AdminError> {
        let (answer, category) = (answer.trim(), category.trim());
        if answer.is_empty() || category.is_empty() {
            return Err(self.invalid("Please fill all fields"));
        }
        let token = self.token()?;
        let result = self.api.answer_unknown(&token, question_id, answer, category).await;
        let faq_id = self.settle(result, &ANSWER_UNKNOWN).await?;
        self.notifier.notify(NotificationKind::Success, "Answer added successfully!");
        Ok(faq_id)
    }

    pub async fn faqs(&mut self, query: &FaqQuery) -> Result<FaqPage, AdminError> {
        let token = self.token()?;
        let result = self.api.faqs(&token, query).await;
        self.settle(result, &LOAD_FAQS).await
    }

    pub async fn faq(&mut self, id: i64) -> Result<Faq, AdminError> {
        let token = self.token()?;
        let result = self.api.faq(&token, id).await;
        self.settle(result, &LOAD_FAQS).await
    }

    /// Creates the FAQ when the draft has no id, otherwise updates it in place.
    pub async fn save_faq(&mut self, draft: &FaqDraft) -> Result<Option<i64>, AdminError> {
        let payload = FaqPayload {
            question: draft.question.trim(),
            answer: draft.answer.trim(),
            category: draft.category.trim(),
        };
        if payload.question.is_empty() || payload.answer.is_empty() || payload.category.is_empty() {
            return Err(self.invalid("Please fill all fields"));
        }
        let token = self.token()?;
        match draft.id {
            Some(id) => {
                let result = self.api.update_faq(&token, id, &payload).await;
                self.settle(result, &SAVE_FAQ).await?;
                self.notifier.notify(NotificationKind::Success, "FAQ updated!");
                Ok(Some(id))
            }
            None => {
                let result = self.api.create_faq(&token, &payload).await;
                let id = self.settle(result, &SAVE_FAQ).await?;
                self.notifier.notify(NotificationKind::Success, "FAQ created!");
                Ok(id)
            }
        }
    }

    /// Returns `false` when the user declines the confirmation.
    pub async fn delete_faq(&mut self, id: i64) -> Result<bool, AdminError> {
        let token = self.token()?;
        if !self.confirm.confirm(DELETE_FAQ_PROMPT).await {
            return Ok(false);
        }
        let result = self.api.delete_faq(&token, id).await;
        self.settle(result, &DELETE_FAQ).await?;
        self.notifier.notify(NotificationKind::Success, "FAQ deleted!");
        Ok(true)
    }

    pub async fn analytics(&mut self, days: u32) -> Result<Analytics, AdminError> {
        let token = self.token()?;
        let result = self.api.analytics(&token, days.max(1)).await;
        self.settle(result, &LOAD_ANALYTICS).await
    }

    pub async fn settings(&mut self) -> Result<Settings, AdminError> {
        let token = self.token()?;
        let result = self.api.settings(&token).await;
        self.settle(result, &LOAD_SETTINGS).await
    }

    fn token(&self) -> Result<String, AdminError> {
        self.token.clone().ok_or(AdminError::NotAuthenticated)
    }

    fn invalid(&self, message: &'static str) -> AdminError {
        self.notifier.notify(NotificationKind::Error, message);
        AdminError::Validation(message)
    }

    async fn drop_token(&mut self) {
        self.token = None;
        self.view = AdminView::Login;
        if let Err(e) = self.store.remove(ADMIN_TOKEN_KEY).await {
            error!("Failed to remove admin token: {}", e);
        }
    }

    /// Maps an API outcome onto the controller: a 401 logs the admin out, any other
    /// failure is reported with the server's text or the operation's generic message.
    async fn settle<T>(&mut self, result: Result<T, ApiError>, messages: &OpMessages) -> Result<T, AdminError> {
        match result {
            Ok(value) => Ok(value),
            Err(ApiError::Unauthorized { message }) => {
                warn!("Admin request rejected as unauthorized: {:?}", message);
                self.drop_token().await;
                self.notifier.notify(NotificationKind::Error, "Session expired. Please log in again.");
                Err(AdminError::Unauthorized)
            }
            Err(e) => {
                error!("{}: {}", messages.error, e);
                let message = match &e {
                    ApiError::Unreachable(_) | ApiError::Transport(_) | ApiError::Decode(_) =>
                        messages.error.to_string(),
                    other => other.server_message().unwrap_or(messages.failed).to_string(),
                };
                self.notifier.notify(NotificationKind::Error, &message);
                Err(AdminError::Api { message, source: e })
            }
        }
    }
}
