use async_trait::async_trait;
use log::{ debug, info, warn };
use reqwest::header::AUTHORIZATION;
use reqwest::{ Client as HttpClient, Method, RequestBuilder, StatusCode };
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use url::Url;
use super::{ AdminApi, ApiError, ChatApi };
use crate::models::admin::{
    AnswerUnknownRequest,
    Analytics,
    DashboardStats,
    Faq,
    FaqPage,
    FaqPayload,
    FaqQuery,
    LoginRequest,
    LoginResponse,
    Settings,
    UnknownFilter,
    UnknownPage,
    UnknownQuestion,
};
use crate::models::chat::{ ChatRequest, ChatResponse, SuggestionsResponse };

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ApiConfig {
    fn build_client(&self) -> Result<HttpClient, ApiError> {
        let mut builder = HttpClient::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

/// Resolves `route` (no leading slash) against a base that may or may not end in `/`.
fn endpoint(base: &Url, route: &str) -> Result<Url, ApiError> {
    Ok(base.join(route.trim_start_matches('/'))?)
}

fn parse_base(base_url: &str) -> Result<Url, ApiError> {
    Ok(Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?)
}

/// Pulls `error` or `message` out of a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<JsonValue>(trimmed) {
        Ok(json) =>
            ["error", "message"]
                .iter()
                .find_map(|k| json.get(*k).and_then(|v| v.as_str()))
                .map(str::to_string),
        Err(_) => Some(trimmed.to_string()),
    }
}

#[derive(Debug)]
pub struct HttpChatApi {
    http: HttpClient,
    base: Url,
    base_url: String,
}

impl HttpChatApi {
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http: config.build_client()?,
            base: parse_base(&config.base_url)?,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        let url = endpoint(&self.base, "chat")?;
        debug!("POST {} session={}", url, request.session_id);
        let resp = self.http.post(url).json(request).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            warn!("Chat request failed with {}: {}", status, body);
            return Err(ApiError::Status { status: status.as_u16(), message: error_message(&body) });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn suggestions(&self) -> Result<Vec<String>, ApiError> {
        let url = endpoint(&self.base, "chat/suggestions")?;
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16(), message: None });
        }
        let body = resp.text().await?;
        let data: SuggestionsResponse = serde_json::from_str(&body)?;
        info!("Suggestions received: {}", data.suggestions.len());
        Ok(data.suggestions)
    }

    async fn health(&self) -> Result<(), ApiError> {
        let url = endpoint(&self.base, "health")?;
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Status { status: status.as_u16(), message: None })
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug)]
pub struct HttpAdminApi {
    http: HttpClient,
    base: Url,
}

impl HttpAdminApi {
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let base = parse_base(&config.base_url)?;
        Ok(Self {
            http: config.build_client()?,
            base: endpoint(&base, "admin/")?,
        })
    }

    fn request(&self, method: Method, route: &str, token: Option<&str>) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(&self.base, route)?;
        debug!("{} {}", method, url);
        let mut req = self.http.request(method, url);
        if let Some(token) = token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        Ok(req)
    }

    /// Sends the request and unwraps the `{success, ...}` envelope every admin route uses.
    async fn send(&self, req: RequestBuilder) -> Result<JsonValue, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized { message: error_message(&body) });
        }
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16(), message: error_message(&body) });
        }
        let json: JsonValue = serde_json::from_str(&body)?;
        if json.get("success").and_then(JsonValue::as_bool) != Some(true) {
            return Err(ApiError::Rejected { message: error_message(&body) });
        }
        Ok(json)
    }

    fn field<T: DeserializeOwned>(json: &mut JsonValue, name: &str) -> Result<T, ApiError> {
        let value = json.get_mut(name).map(JsonValue::take).unwrap_or(JsonValue::Null);
        Ok(serde_json::from_value(value)?)
    }

    fn optional_field<T: DeserializeOwned>(json: &mut JsonValue, name: &str) -> Option<T> {
        json.get_mut(name)
            .map(JsonValue::take)
            .and_then(|v| serde_json::from_value(v).ok())
    }
}

#[async_trait]
impl AdminApi for HttpAdminApi {
    async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let body = LoginRequest { username: username.to_string(), password: password.to_string() };
        let resp = self.request(Method::POST, "login", None)?.json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let data: LoginResponse = serde_json::from_str(&text).unwrap_or_default();

        match data.token {
            Some(token) if status.is_success() && data.success => Ok(token),
            _ => Err(ApiError::Rejected { message: data.message.or_else(|| error_message(&text)) }),
        }
    }

    async fn verify(&self, token: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::GET, "verify", Some(token))?).await?;
        Ok(())
    }

    async fn stats(&self, token: &str) -> Result<DashboardStats, ApiError> {
        let mut json = self.send(self.request(Method::GET, "stats", Some(token))?).await?;
        Self::field(&mut json, "stats")
    }

    async fn unknown_questions(
        &self,
        token: &str,
        filter: UnknownFilter,
        page: u32,
        limit: u32
    ) -> Result<UnknownPage, ApiError> {
        let req = self
            .request(Method::GET, "unknown", Some(token))?
            .query(&[("filter", filter.as_str().to_string()), ("page", page.to_string()), ("limit", limit.to_string())]);
        let mut json = self.send(req).await?;
        Ok(UnknownPage {
            questions: Self::field(&mut json, "questions")?,
            pagination: Self::optional_field(&mut json, "pagination"),
        })
    }

    async fn unknown_question(&self, token: &str, id: i64) -> Result<UnknownQuestion, ApiError> {
        let route = format!("unknown/{}", id);
        let mut json = self.send(self.request(Method::GET, &route, Some(token))?).await?;
        Self::field(&mut json, "question")
    }

    async fn answer_unknown(
        &self,
        token: &str,
        question_id: i64,
        answer: &str,
        category: &str
    ) -> Result<Option<i64>, ApiError> {
        let body = AnswerUnknownRequest { question_id, answer, category };
        let req = self
            .request(Method::POST, "unknown/answer", Some(token))?
            .json(&body);
        let mut json = self.send(req).await?;
        Ok(Self::optional_field(&mut json, "faq_id"))
    }

    async fn faqs(&self, token: &str, query: &FaqQuery) -> Result<FaqPage, ApiError> {
        let mut params = vec![("page", query.page.to_string()), ("limit", query.limit.to_string())];
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(category) = query.category.as_deref().filter(|s| !s.is_empty()) {
            params.push(("category", category.to_string()));
        }
        let req = self.request(Method::GET, "faqs", Some(token))?.query(&params);
        let mut json = self.send(req).await?;
        Ok(FaqPage {
            faqs: Self::field(&mut json, "faqs")?,
            categories: Self::optional_field(&mut json, "categories").unwrap_or_default(),
            pagination: Self::optional_field(&mut json, "pagination"),
        })
    }

    async fn faq(&self, token: &str, id: i64) -> Result<Faq, ApiError> {
        let route = format!("faqs/{}", id);
        let mut json = self.send(self.request(Method::GET, &route, Some(token))?).await?;
        Self::field(&mut json, "faq")
    }

    async fn create_faq(&self, token: &str, faq: &FaqPayload<'_>) -> Result<Option<i64>, ApiError> {
        let req = self.request(Method::POST, "faqs", Some(token))?.json(faq);
        let mut json = self.send(req).await?;
        Ok(Self::optional_field(&mut json, "faq_id"))
    }

    async fn update_faq(&self, token: &str, id: i64, faq: &FaqPayload<'_>) -> Result<(), ApiError> {
        let route = format!("faqs/{}", id);
        self.send(self.request(Method::PUT, &route, Some(token))?.json(faq)).await?;
        Ok(())
    }

    async fn delete_faq(&self, token: &str, id: i64) -> Result<(), ApiError> {
        let route = format!("faqs/{}", id);
        self.send(self.request(Method::DELETE, &route, Some(token))?).await?;
        Ok(())
    }

    async fn analytics(&self, token: &str, days: u32) -> Result<Analytics, ApiError> {
        let req = self
            .request(Method::GET, "analytics", Some(token))?
            .query(&[("days", days.to_string())]);
        let mut json = self.send(req).await?;
        Self::field(&mut json, "analytics")
    }

    async fn settings(&self, token: &str) -> Result<Settings, ApiError> {
        let mut json = self.send(self.request(Method::GET, "settings", Some(token))?).await?;
        Self::field(&mut json, "settings")
    }
}
