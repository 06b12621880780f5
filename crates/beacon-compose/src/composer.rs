use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::{error, info, warn};

use beacon_core::clock::Clock;
use beacon_core::settings::PostSettings;
use beacon_llm::{fallback, GenerationProvider};
use beacon_notify::{ChatSink, DestinationSink, SinkError};

use crate::budget::ContentBudgeter;
use crate::stats::ActivityStats;

/// How long after publishing the engagement probe samples reactions.
const ENGAGEMENT_PROBE_DELAY: Duration = Duration::from_secs(5 * 60);

/// Where composed posts go. Split from [`DestinationSink`] because the
/// composer also reads the posted message back for the engagement probe.
#[async_trait]
pub trait PostChannel: Send + Sync {
    fn is_configured(&self) -> bool;
    async fn publish(&self, text: &str) -> Result<Option<String>, SinkError>;
    async fn reaction_count(&self, message_id: &str) -> Result<u64, SinkError>;
}

#[async_trait]
impl PostChannel for ChatSink {
    fn is_configured(&self) -> bool {
        DestinationSink::is_configured(self)
    }

    async fn publish(&self, text: &str) -> Result<Option<String>, SinkError> {
        self.send(text).await
    }

    async fn reaction_count(&self, message_id: &str) -> Result<u64, SinkError> {
        ChatSink::reaction_count(self, message_id).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// Fired by the daily trigger.
    Scheduled,
    /// Operator-requested run outside the schedule.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Posted {
        truncated: bool,
        chars: usize,
        message_id: Option<String>,
    },
    /// Nothing attempted; a collaborator is not configured.
    Skipped(&'static str),
    /// Publish failed. Left for the next tick.
    Failed(String),
}

/// Builds and publishes one scheduled post: pick a topic, generate the post
/// and a discussion prompt, fit the pair under the platform ceiling, publish,
/// then sample reactions a few minutes later.
///
/// Generation failures never abort a run. A failed post generation falls
/// back to canned content and a failed discussion prompt falls back to a
/// canned question; only a publish failure ends a run without a post.
pub struct PostComposer {
    provider: Arc<dyn GenerationProvider>,
    channel: Arc<dyn PostChannel>,
    budgeter: ContentBudgeter,
    stats: Arc<ActivityStats>,
    clock: Arc<dyn Clock>,
    topics: Vec<String>,
    max_chars: usize,
    probe_delay: Duration,
}

impl PostComposer {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        channel: Arc<dyn PostChannel>,
        stats: Arc<ActivityStats>,
        clock: Arc<dyn Clock>,
        settings: &PostSettings,
    ) -> Self {
        Self {
            budgeter: ContentBudgeter::new(provider.clone()),
            provider,
            channel,
            stats,
            clock,
            topics: settings.topics.clone(),
            max_chars: settings.max_chars,
            probe_delay: ENGAGEMENT_PROBE_DELAY,
        }
    }

    #[cfg(test)]
    fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    pub async fn run(&self, kind: RunKind) -> RunOutcome {
        if !self.channel.is_configured() {
            info!("post channel not configured, skipping run");
            return RunOutcome::Skipped("post channel not configured");
        }
        if !self.provider.is_configured() {
            warn!("generation provider not configured, skipping run");
            return RunOutcome::Skipped("generation provider not configured");
        }

        let topic = self.pick_topic();
        info!(?kind, topic = %topic, "composing scheduled post");

        let post = match self.provider.generate_post(&topic).await {
            Ok(post) => post,
            Err(err) => {
                warn!(error = %err, "post generation failed, using fallback content");
                fallback::random_post()
            }
        };

        let prompt = match self.provider.generate_discussion_prompt(&post).await {
            Ok(prompt) => prompt,
            Err(err) => {
                warn!(error = %err, "discussion prompt generation failed, using fallback");
                fallback::random_discussion_prompt()
            }
        };

        let fitted = self
            .budgeter
            .fit(&post, Some(&prompt), self.max_chars)
            .await;
        let chars = fitted.text.chars().count();

        match self.channel.publish(&fitted.text).await {
            Ok(message_id) => {
                info!(chars, truncated = fitted.truncated, "scheduled post published");
                if let Some(id) = &message_id {
                    self.spawn_engagement_probe(id.clone());
                }
                self.stats.reset(self.clock.now());
                RunOutcome::Posted {
                    truncated: fitted.truncated,
                    chars,
                    message_id,
                }
            }
            Err(err) => {
                error!(error = %err, "failed to publish scheduled post");
                RunOutcome::Failed(err.to_string())
            }
        }
    }

    fn pick_topic(&self) -> String {
        self.topics
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| "remote work trends".to_string())
    }

    fn spawn_engagement_probe(&self, message_id: String) {
        let channel = self.channel.clone();
        let delay = self.probe_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match channel.reaction_count(&message_id).await {
                Ok(count) => {
                    info!(message_id = %message_id, reactions = count, "post engagement sample")
                }
                Err(err) => {
                    warn!(message_id = %message_id, error = %err, "engagement probe failed")
                }
            }
        });
    }
}
