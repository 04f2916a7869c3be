//! Post-commit effects.
//!
//! Save flows never call providers inline. They queue effects while
//! validating and persisting, then flush the queue once the write has
//! succeeded. A failing effect is retried with capped backoff and, when
//! it keeps failing, logged and dropped; it never fails the request
//! that queued it.

use std::collections::BTreeMap;
use std::time::Duration;

use greetnet_core::models::entity::EntityRef;
use rand::Rng;
use uuid::Uuid;

/// Work deferred until after a successful save.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fan the field's current text out to every configured language.
    TranslateField { entity: EntityRef, field: String },
    /// Like `TranslateField`, but the value is a comma-separated list
    /// translated item by item.
    TranslateFieldItems { entity: EntityRef, field: String },
    /// Translate a tag label into the tag's own translation map.
    TranslateTag { tag_id: Uuid },
    /// Send a template mail to a user, resolved in their language.
    SendTemplateEmail {
        code: String,
        user_id: Uuid,
        variables: BTreeMap<String, serde_json::Value>,
    },
    /// Shrink an uploaded image in place.
    ResizeImage { path: String },
}

/// Ordered queue of effects built up during one save flow.
#[derive(Debug, Default)]
pub struct EffectQueue {
    effects: Vec<Effect>,
}

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Take everything queued so far, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}

/// Retry schedule for effect execution.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(600),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry (1-based), with jitter so herds of
    /// effects queued together spread out.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(retry.saturating_sub(1) as i32);
        let capped = base.min(self.max_delay.as_secs_f64());
        let jitter = rand::rng().random_range(0.8..1.2);
        Duration::from_secs_f64(capped * jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_drains_in_insertion_order() {
        let mut queue = EffectQueue::new();
        queue.push(Effect::TranslateTag { tag_id: Uuid::nil() });
        queue.push(Effect::ResizeImage {
            path: "media/photo.jpg".into(),
        });

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());
        assert!(matches!(drained[0], Effect::TranslateTag { .. }));
    }

    #[test]
    fn delays_grow_and_stay_capped() {
        let policy = RetryPolicy::default();
        let first = policy.delay_for(1);
        assert!(first >= Duration::from_millis(800));
        assert!(first <= Duration::from_millis(1200));

        // Far beyond the cap: 1s * 2^29 >> 600s.
        let late = policy.delay_for(30);
        assert!(late <= Duration::from_secs_f64(600.0 * 1.2));
    }
}
