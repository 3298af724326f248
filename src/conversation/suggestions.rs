use log::{ info, warn };
use crate::api::ChatApi;

pub const FALLBACK_SUGGESTIONS: [&str; 6] = [
    "What is the cut-off mark for Medicine?",
    "How much are school fees?",
    "Where is the best area to live?",
    "Does LAUTECH accept second choice?",
    "How do I check admission status?",
    "What documents are needed for verification?",
];

pub fn fallback_suggestions() -> Vec<String> {
    FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect()
}

/// Example questions shown before a conversation starts. Never empty: any fetch
/// problem falls back to the built-in list.
pub async fn load_suggestions(api: &dyn ChatApi) -> Vec<String> {
    info!("Loading suggestions from API...");
    match api.suggestions().await {
        Ok(suggestions) => {
            let cleaned: Vec<String> = suggestions
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if cleaned.is_empty() {
                warn!("Backend returned no usable suggestions, using fallback");
                fallback_suggestions()
            } else {
                cleaned
            }
        }
        Err(e) => {
            warn!("Could not load suggestions, using fallback: {}", e);
            fallback_suggestions()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::testing::FakeChatApi;

    #[tokio::test]
    async fn fetch_failure_uses_fallback_exactly() {
        let api = FakeChatApi::offline();
        assert_eq!(load_suggestions(&api).await, fallback_suggestions());
    }

    #[tokio::test]
    async fn empty_list_uses_fallback() {
        let api = FakeChatApi::default().with_suggestions(vec!["  ".into()]);
        assert_eq!(load_suggestions(&api).await, fallback_suggestions());
    }

    #[tokio::test]
    async fn backend_list_wins_when_present() {
        let api = FakeChatApi::default().with_suggestions(vec!["Is there a hostel?".into()]);
        assert_eq!(load_suggestions(&api).await, vec!["Is there a hostel?".to_string()]);
    }
}
