//! Transactional mail provider client.
//!
//! Mail is always template-based: the provider holds the layouts, the
//! backend sends a template id plus variables.

use std::collections::BTreeMap;

use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("mail provider returned status {0}")]
    Status(u16),
    #[error("mail is not configured")]
    NotConfigured,
}

/// One outbound transactional message.
#[derive(Debug, Clone)]
pub struct OutboundMail {
    pub to_email: String,
    pub to_name: String,
    pub provider_template_id: i64,
    pub variables: BTreeMap<String, serde_json::Value>,
}

/// A transactional mail provider.
pub trait Mailer: Send + Sync {
    fn send(&self, mail: OutboundMail) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// Mailjet-backed [`Mailer`].
#[derive(Clone)]
pub struct MailjetMailer {
    client: reqwest::Client,
    api_key: String,
    api_secret: String,
    from_email: String,
}

impl MailjetMailer {
    const API_URL: &'static str = "https://api.mailjet.com/v3.1/send";

    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        from_email: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            from_email: from_email.into(),
        }
    }
}

impl Mailer for MailjetMailer {
    async fn send(&self, mail: OutboundMail) -> Result<(), MailError> {
        let body = json!({
            "Messages": [{
                "From": { "Email": self.from_email },
                "To": [{ "Email": mail.to_email, "Name": mail.to_name }],
                "TemplateID": mail.provider_template_id,
                "TemplateLanguage": true,
                "Variables": mail.variables,
            }]
        });

        let response = self
            .client
            .post(Self::API_URL)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Status(status.as_u16()));
        }

        Ok(())
    }
}
