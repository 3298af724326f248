use serde::{ Serialize, Deserialize, Deserializer };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

/// A "did you mean" entry attached to an assistant answer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Suggestion {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

// The backend sends either bare strings or `{question, confidence}` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSuggestion {
    Text(String),
    Entry {
        question: String,
        #[serde(default)]
        confidence: Option<f64>,
    },
}

impl<'de> Deserialize<'de> for Suggestion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        Ok(match RawSuggestion::deserialize(deserializer)? {
            RawSuggestion::Text(question) => Suggestion { question, confidence: None },
            RawSuggestion::Entry { question, confidence } => Suggestion { question, confidence },
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub text: String,
    pub sender: Sender,
    pub timestamp: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub match_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ConversationMessage {
    pub fn user(text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            timestamp: timestamp.into(),
            confidence: None,
            match_type: None,
            suggestions: Vec::new(),
            is_error: false,
        }
    }

    pub fn assistant(response: ChatResponse, timestamp: impl Into<String>) -> Self {
        Self {
            text: response.answer,
            sender: Sender::Assistant,
            timestamp: timestamp.into(),
            confidence: response.confidence,
            match_type: response.match_type,
            suggestions: response.suggestions,
            is_error: false,
        }
    }

    pub fn assistant_error(text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Assistant,
            timestamp: timestamp.into(),
            confidence: None,
            match_type: None,
            suggestions: Vec::new(),
            is_error: true,
        }
    }

    /// Confidence as a rounded percentage, for the "NN% match" badge.
    /// A zero score renders no badge.
    pub fn confidence_percent(&self) -> Option<u32> {
        self.confidence
            .filter(|c| *c > 0.0)
            .map(|c| (c.clamp(0.0, 1.0) * 100.0).round() as u32)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub question: String,
    pub session_id: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub match_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Suggestion>, D::Error>
    where D: Deserializer<'de>
{
    Ok(Option::<Vec<Suggestion>>::deserialize(deserializer)?.unwrap_or_default())
}
