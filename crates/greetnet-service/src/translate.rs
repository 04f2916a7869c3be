//! Machine-translation provider client.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

/// Attempts per text before giving up on a rate-limited provider.
const MAX_ATTEMPTS: u32 = 5;
/// Wait after the first 429, doubled on each further one.
const INITIAL_RATE_LIMIT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("translation provider rate limit persisted after {0} attempts")]
    RateLimited(u32),
    #[error("translation provider returned status {0}")]
    Status(u16),
    #[error("translation provider returned no translations")]
    EmptyResponse,
    #[error("translation is not configured")]
    NotConfigured,
}

/// Map key for a target language inside a stored translation object.
/// Provider codes carry dashes (`en-gb`); stored keys use underscores.
pub fn lang_key(lang: &str) -> String {
    lang.to_ascii_lowercase().replace('-', "_")
}

/// A text translation provider.
///
/// The orchestration layer is generic over this trait; tests swap in a
/// recording stub.
pub trait Translator: Send + Sync {
    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> impl Future<Output = Result<String, TranslateError>> + Send;
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

/// DeepL-backed [`Translator`].
#[derive(Clone)]
pub struct DeepLTranslator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl DeepLTranslator {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }
}

impl Translator for DeepLTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        let body = json!({
            "text": [text],
            "source_lang": source_lang.to_uppercase(),
            "target_lang": target_lang.to_uppercase(),
        });

        let mut delay = INITIAL_RATE_LIMIT_DELAY;
        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .client
                .post(&self.api_url)
                .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if status.as_u16() == 429 {
                warn!(attempt, delay_secs = delay.as_secs(), "Translation provider rate limit");
                tokio::time::sleep(delay).await;
                delay *= 2;
                continue;
            }
            if !status.is_success() {
                return Err(TranslateError::Status(status.as_u16()));
            }

            let parsed: DeepLResponse = response.json().await?;
            return parsed
                .translations
                .into_iter()
                .next()
                .map(|t| t.text)
                .ok_or(TranslateError::EmptyResponse);
        }

        Err(TranslateError::RateLimited(MAX_ATTEMPTS))
    }
}
