//! Process settings: compiled defaults overridden by environment variables.
//!
//! All values are static for the process lifetime. Missing credentials are
//! represented as `None` and surface as "not configured" skips at the call
//! sites, never as startup failures.

use chrono::NaiveTime;
use chrono_tz::Tz;
use secrecy::SecretString;

/// Rate-limit tier configuration for the admission gate.
#[derive(Clone, Debug)]
pub struct LimitSettings {
    /// Per-user rejoin cooldown.
    pub cooldown_seconds: u64,
    /// Global notifications allowed per burst window.
    pub burst_limit: u32,
    pub burst_window_minutes: u64,
    /// Global notifications allowed per calendar day.
    pub daily_limit: u32,
    /// Notifications allowed per user per hour.
    pub user_hourly_limit: u32,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            cooldown_seconds: 5,
            burst_limit: 10,
            burst_window_minutes: 10,
            daily_limit: 500,
            user_hourly_limit: 3,
        }
    }
}

/// Chat-platform destination (bot token + channel ids).
#[derive(Clone, Debug)]
pub struct ChatSettings {
    pub bot_token: Option<SecretString>,
    /// Channel that receives join notifications.
    pub notify_channel_id: Option<String>,
    /// Channel that receives scheduled posts.
    pub post_channel_id: Option<String>,
    pub template: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            notify_channel_id: None,
            post_channel_id: None,
            template: "@everyone 🎤 **{displayName}** just joined **{channelName}**! Come hang out! 🎉".into(),
        }
    }
}

/// Messaging-gateway destination (hosted API instance).
#[derive(Clone, Debug)]
pub struct GatewaySettings {
    pub instance_id: Option<String>,
    pub api_token: Option<SecretString>,
    pub group_id: Option<String>,
    /// The gateway's own outbound hourly cap, independent of the admission gate.
    pub hourly_limit: u32,
    pub template: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            instance_id: None,
            api_token: None,
            group_id: None,
            hourly_limit: 50,
            template: "🎤 {displayName} just joined \"{channelName}\" voice channel! 🎉".into(),
        }
    }
}

/// Generation provider selection and credentials.
#[derive(Clone, Debug)]
pub struct GenerationSettings {
    /// Which provider to construct: "openai", "anthropic", or "perplexity".
    pub provider: String,
    pub openai_api_key: Option<SecretString>,
    pub anthropic_api_key: Option<SecretString>,
    pub perplexity_api_key: Option<SecretString>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            openai_api_key: None,
            anthropic_api_key: None,
            perplexity_api_key: None,
        }
    }
}

/// Scheduled post composition.
#[derive(Clone, Debug)]
pub struct PostSettings {
    /// Local time of day the daily post fires.
    pub post_time: NaiveTime,
    pub timezone: Tz,
    /// Hard per-message character ceiling enforced by the chat platform.
    pub max_chars: usize,
    /// Topic pool; one is chosen uniformly at random per run.
    pub topics: Vec<String>,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            post_time: NaiveTime::from_hms_opt(9, 0, 0).expect("valid default post time"),
            timezone: chrono_tz::America::New_York,
            max_chars: 2000,
            topics: default_topics(),
        }
    }
}

/// Status server.
#[derive(Clone, Debug)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Top-level settings bundle.
#[derive(Clone, Debug, Default)]
pub struct BeaconSettings {
    pub limits: LimitSettings,
    pub chat: ChatSettings,
    pub gateway: GatewaySettings,
    pub generation: GenerationSettings,
    pub post: PostSettings,
    pub server: ServerSettings,
}

impl BeaconSettings {
    /// Load settings from the environment over compiled defaults.
    ///
    /// Unparseable numeric values fall back to the default rather than
    /// failing startup.
    pub fn from_env() -> Self {
        let mut s = Self::default();

        if let Some(v) = env_parse::<u64>("USER_COOLDOWN_SECONDS") {
            s.limits.cooldown_seconds = v;
        }
        if let Some(v) = env_parse::<u32>("BURST_LIMIT_COUNT") {
            s.limits.burst_limit = v;
        }
        if let Some(v) = env_parse::<u64>("BURST_LIMIT_WINDOW_MINUTES") {
            s.limits.burst_window_minutes = v;
        }
        if let Some(v) = env_parse::<u32>("GLOBAL_DAILY_LIMIT") {
            s.limits.daily_limit = v;
        }
        if let Some(v) = env_parse::<u32>("USER_HOURLY_LIMIT") {
            s.limits.user_hourly_limit = v;
        }

        s.chat.bot_token = env_secret("CHAT_BOT_TOKEN");
        s.chat.notify_channel_id = env_string("NOTIFICATION_CHANNEL_ID");
        s.chat.post_channel_id = env_string("SCHEDULED_POST_CHANNEL_ID");
        if let Some(v) = env_string("CHAT_MESSAGE_TEMPLATE") {
            s.chat.template = v;
        }

        s.gateway.instance_id = env_string("GATEWAY_INSTANCE_ID");
        s.gateway.api_token = env_secret("GATEWAY_API_TOKEN");
        s.gateway.group_id = env_string("GATEWAY_GROUP_ID");
        if let Some(v) = env_parse::<u32>("GATEWAY_HOURLY_LIMIT") {
            s.gateway.hourly_limit = v;
        }
        if let Some(v) = env_string("GATEWAY_MESSAGE_TEMPLATE") {
            s.gateway.template = v;
        }

        if let Some(v) = env_string("GENERATION_PROVIDER") {
            s.generation.provider = v;
        }
        s.generation.openai_api_key = env_secret("OPENAI_API_KEY");
        s.generation.anthropic_api_key = env_secret("ANTHROPIC_API_KEY");
        s.generation.perplexity_api_key = env_secret("PERPLEXITY_API_KEY");

        if let Some(v) = env_string("POST_TIME") {
            if let Ok(t) = NaiveTime::parse_from_str(&v, "%H:%M") {
                s.post.post_time = t;
            }
        }
        if let Some(v) = env_string("POST_TIMEZONE") {
            if let Ok(tz) = v.parse::<Tz>() {
                s.post.timezone = tz;
            }
        }
        if let Some(v) = env_parse::<usize>("POST_MAX_CHARS") {
            s.post.max_chars = v;
        }
        if let Some(v) = env_string("POST_TOPICS") {
            let topics: Vec<String> = v
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if !topics.is_empty() {
                s.post.topics = topics;
            }
        }

        if let Some(v) = env_parse::<u16>("STATUS_PORT") {
            s.server.port = v;
        }

        s
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_secret(key: &str) -> Option<SecretString> {
    env_string(key).map(SecretString::from)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

fn default_topics() -> Vec<String> {
    [
        "latest remote work statistics and productivity trends",
        "work from home mental health and wellbeing research",
        "home office ergonomics and setup best practices",
        "remote team collaboration and communication strategies",
        "digital nomad lifestyle and location independence trends",
        "work life balance challenges and solutions for remote workers",
        "hybrid workplace culture and management approaches",
        "remote work tools and technology adoption",
        "virtual meeting fatigue and video call optimization",
        "remote work career advancement and professional development",
        "distributed team management and leadership",
        "remote work cybersecurity and data protection",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_expectations() {
        let s = BeaconSettings::default();
        assert_eq!(s.limits.cooldown_seconds, 5);
        assert_eq!(s.limits.burst_limit, 10);
        assert_eq!(s.limits.burst_window_minutes, 10);
        assert_eq!(s.limits.daily_limit, 500);
        assert_eq!(s.limits.user_hourly_limit, 3);
        assert_eq!(s.gateway.hourly_limit, 50);
        assert_eq!(s.post.max_chars, 2000);
        assert_eq!(s.post.topics.len(), 12);
        assert_eq!(s.server.port, 3000);
        assert_eq!(s.generation.provider, "openai");
        assert!(s.chat.bot_token.is_none());
    }

    #[test]
    fn default_templates_have_placeholders() {
        let s = BeaconSettings::default();
        for template in [&s.chat.template, &s.gateway.template] {
            assert!(template.contains("{displayName}"));
            assert!(template.contains("{channelName}"));
        }
    }

    #[test]
    fn default_post_time_is_morning() {
        let s = BeaconSettings::default();
        assert_eq!(s.post.post_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(s.post.timezone, chrono_tz::America::New_York);
    }
}
