//! Service configuration.

/// Configuration for the orchestration layer.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Language the admins write in (`source_lang` for the provider).
    pub source_lang: String,
    /// Languages translations are produced for. The source language is
    /// skipped even when listed here.
    pub target_langs: Vec<String>,
    /// DeepL API key. `None` disables translation fan-out.
    pub deepl_api_key: Option<String>,
    /// DeepL endpoint (the free and pro tiers use different hosts).
    pub deepl_api_url: String,
    /// Mailjet API key pair. `None` disables outbound mail.
    pub mailjet_api_key: Option<String>,
    pub mailjet_api_secret: Option<String>,
    /// Sender address for transactional mail.
    pub mail_from: String,
    /// Root directory for uploaded media (greeter photos, logos).
    pub media_root: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            source_lang: "fr".into(),
            target_langs: vec!["en-gb".into(), "de".into(), "es".into(), "it".into()],
            deepl_api_key: None,
            deepl_api_url: "https://api-free.deepl.com/v2/translate".into(),
            mailjet_api_key: None,
            mailjet_api_secret: None,
            mail_from: "noreply@greetnet.example".into(),
            media_root: "media".into(),
        }
    }
}

impl ServiceConfig {
    /// Build configuration from `GREETNET_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            source_lang: std::env::var("GREETNET_SOURCE_LANG").unwrap_or(defaults.source_lang),
            target_langs: std::env::var("GREETNET_TARGET_LANGS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.target_langs),
            deepl_api_key: std::env::var("GREETNET_DEEPL_API_KEY").ok(),
            deepl_api_url: std::env::var("GREETNET_DEEPL_API_URL").unwrap_or(defaults.deepl_api_url),
            mailjet_api_key: std::env::var("GREETNET_MAILJET_API_KEY").ok(),
            mailjet_api_secret: std::env::var("GREETNET_MAILJET_API_SECRET").ok(),
            mail_from: std::env::var("GREETNET_MAIL_FROM").unwrap_or(defaults.mail_from),
            media_root: std::env::var("GREETNET_MEDIA_ROOT").unwrap_or(defaults.media_root),
        }
    }
}
