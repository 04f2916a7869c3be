//! Effect executors and the async dispatcher.
//!
//! Each queued [`Effect`] maps to one executor here. The dispatcher
//! runs every effect on its own tokio task with the retry schedule
//! from [`RetryPolicy`]; exhausted retries are logged and dropped.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use greetnet_core::error::GreetnetError;
use greetnet_core::models::entity::EntityRef;
use greetnet_core::models::tag::{join_tag_list, parse_tag_list};
use greetnet_core::repository::{
    EmailTemplateRepository, TagRepository, TranslationRepository, UserRepository,
};
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::effects::{Effect, RetryPolicy};
use crate::email::{MailError, Mailer, OutboundMail};
use crate::translate::{TranslateError, Translator, lang_key};

/// Pixel bound for uploaded photo thumbnails.
const THUMBNAIL_SIZE: u32 = 200;

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Domain(#[from] GreetnetError),
    #[error(transparent)]
    Translate(#[from] TranslateError),
    #[error(transparent)]
    Mail(#[from] MailError),
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("{0}")]
    Internal(String),
}

/// Everything an effect executor may need. Cheap to share behind an
/// `Arc` across spawned tasks.
pub struct JobContext<TR, TG, U, E, T, M> {
    pub translations: TR,
    pub tags: TG,
    pub users: U,
    pub templates: E,
    /// `None` when translation is not configured; translation effects
    /// then become no-ops.
    pub translator: Option<T>,
    /// `None` when mail is not configured; mail effects then become
    /// no-ops.
    pub mailer: Option<M>,
    pub config: ServiceConfig,
    pub retry: RetryPolicy,
}

impl<TR, TG, U, E, T, M> JobContext<TR, TG, U, E, T, M>
where
    TR: TranslationRepository,
    TG: TagRepository,
    U: UserRepository,
    E: EmailTemplateRepository,
    T: Translator,
    M: Mailer,
{
    /// Run one effect to completion or first error.
    pub async fn run_effect(&self, effect: Effect) -> Result<(), JobError> {
        match effect {
            Effect::TranslateField { entity, field } => {
                self.translate_field(entity, &field).await
            }
            Effect::TranslateFieldItems { entity, field } => {
                self.translate_field_items(entity, &field).await
            }
            Effect::TranslateTag { tag_id } => self.translate_tag(tag_id).await,
            Effect::SendTemplateEmail {
                code,
                user_id,
                variables,
            } => self.send_template_email(&code, user_id, variables).await,
            Effect::ResizeImage { path } => self.resize_image(&path).await,
        }
    }

    /// Translate a prose field into every configured target language
    /// and store the whole map in one write.
    pub async fn translate_field(&self, entity: EntityRef, field: &str) -> Result<(), JobError> {
        let Some(translator) = self.translator.as_ref() else {
            debug!(%entity, field, "Translation not configured, skipping");
            return Ok(());
        };

        let Some(text) = self.translations.load_field(entity, field).await? else {
            return Ok(());
        };
        if text.trim().is_empty() {
            // Empty source means nothing to translate and no provider
            // call at all.
            return Ok(());
        }

        let mut map = BTreeMap::new();
        for lang in &self.config.target_langs {
            if lang.eq_ignore_ascii_case(&self.config.source_lang) {
                continue;
            }
            let translated = translator
                .translate(&text, &self.config.source_lang, lang)
                .await?;
            map.insert(lang_key(lang), translated);
        }

        self.translations
            .store_field_translations(entity, field, map)
            .await?;
        Ok(())
    }

    /// Translate a comma-separated list field item by item, preserving
    /// item order in each language.
    pub async fn translate_field_items(
        &self,
        entity: EntityRef,
        field: &str,
    ) -> Result<(), JobError> {
        let Some(translator) = self.translator.as_ref() else {
            debug!(%entity, field, "Translation not configured, skipping");
            return Ok(());
        };

        let Some(raw) = self.translations.load_field(entity, field).await? else {
            return Ok(());
        };
        let items = parse_tag_list(&raw);
        if items.is_empty() {
            return Ok(());
        }

        let mut map = BTreeMap::new();
        for lang in &self.config.target_langs {
            if lang.eq_ignore_ascii_case(&self.config.source_lang) {
                continue;
            }
            let mut translated_items = Vec::with_capacity(items.len());
            for item in &items {
                translated_items.push(
                    translator
                        .translate(item, &self.config.source_lang, lang)
                        .await?,
                );
            }
            map.insert(lang_key(lang), join_tag_list(&translated_items));
        }

        self.translations
            .store_field_translations(entity, field, map)
            .await?;
        Ok(())
    }

    /// Translate a tag label into the tag's own translation map.
    pub async fn translate_tag(&self, tag_id: Uuid) -> Result<(), JobError> {
        let Some(translator) = self.translator.as_ref() else {
            debug!(%tag_id, "Translation not configured, skipping");
            return Ok(());
        };

        let tag = self.tags.get_by_id(tag_id).await?;

        let mut map = BTreeMap::new();
        for lang in &self.config.target_langs {
            if lang.eq_ignore_ascii_case(&self.config.source_lang) {
                continue;
            }
            let translated = translator
                .translate(&tag.label, &self.config.source_lang, lang)
                .await?;
            map.insert(lang_key(lang), translated);
        }

        self.tags.set_translations(tag_id, map).await?;
        Ok(())
    }

    /// Send a template mail to a user, resolving the template in the
    /// recipient's language with a fallback to the source language.
    pub async fn send_template_email(
        &self,
        code: &str,
        user_id: Uuid,
        variables: BTreeMap<String, serde_json::Value>,
    ) -> Result<(), JobError> {
        let Some(mailer) = self.mailer.as_ref() else {
            debug!(code, %user_id, "Mail not configured, skipping");
            return Ok(());
        };

        let user = self.users.get_by_id(user_id).await?;

        let template = match self.templates.get(code, &user.comm_lang).await {
            Ok(t) => t,
            Err(GreetnetError::NotFound { .. }) => {
                self.templates.get(code, &self.config.source_lang).await?
            }
            Err(e) => return Err(e.into()),
        };

        mailer
            .send(OutboundMail {
                to_email: user.email.clone(),
                to_name: user.full_name(),
                provider_template_id: template.provider_template_id,
                variables,
            })
            .await?;
        Ok(())
    }

    /// Shrink an uploaded image to a thumbnail, in place.
    pub async fn resize_image(&self, path: &str) -> Result<(), JobError> {
        let full_path = Path::new(&self.config.media_root).join(path);

        tokio::task::spawn_blocking(move || -> Result<(), JobError> {
            let img = image::open(&full_path)?;
            let thumb = img.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE);
            thumb.save(&full_path)?;
            Ok(())
        })
        .await
        .map_err(|e| JobError::Internal(e.to_string()))??;

        Ok(())
    }
}

/// Dispatch a batch of effects onto background tasks.
///
/// Called after the originating write has committed; nothing here can
/// fail that write anymore.
pub fn spawn_all<TR, TG, U, E, T, M>(
    ctx: Arc<JobContext<TR, TG, U, E, T, M>>,
    effects: Vec<Effect>,
) where
    TR: TranslationRepository + 'static,
    TG: TagRepository + 'static,
    U: UserRepository + 'static,
    E: EmailTemplateRepository + 'static,
    T: Translator + 'static,
    M: Mailer + 'static,
{
    for effect in effects {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            let mut attempt = 1;
            loop {
                match ctx.run_effect(effect.clone()).await {
                    Ok(()) => return,
                    Err(err) if attempt < ctx.retry.max_attempts => {
                        warn!(%err, attempt, ?effect, "Effect failed, retrying");
                        tokio::time::sleep(ctx.retry.delay_for(attempt)).await;
                        attempt += 1;
                    }
                    Err(err) => {
                        error!(%err, ?effect, "Effect failed permanently, dropping");
                        return;
                    }
                }
            }
        });
    }
}
