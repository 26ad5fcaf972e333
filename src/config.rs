use crate::compose::{DEFAULT_ATTRIBUTION, DEFAULT_EXCERPT_CHARS};
use crate::tracker::DEFAULT_MIN_FRAME_HEIGHT;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub reply: ReplyConfig,
    pub frame: FrameConfig,
}

#[derive(Debug)]
pub struct ServerConfig {
    pub base_url: String,
}

#[derive(Debug)]
pub struct ReplyConfig {
    pub excerpt_chars: usize,
    pub attribution: String,
}

#[derive(Debug)]
pub struct FrameConfig {
    pub min_content_height: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    server: Option<RawServerConfig>,
    #[serde(default)]
    reply: RawReplyConfig,
    #[serde(default)]
    frame: RawFrameConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawServerConfig {
    base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReplyConfig {
    #[serde(default = "default_excerpt_chars")]
    excerpt_chars: usize,
    #[serde(default = "default_attribution")]
    attribution: String,
}

impl Default for RawReplyConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: default_excerpt_chars(),
            attribution: default_attribution(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFrameConfig {
    #[serde(default = "default_min_content_height")]
    min_content_height: u32,
}

impl Default for RawFrameConfig {
    fn default() -> Self {
        Self {
            min_content_height: default_min_content_height(),
        }
    }
}

fn default_excerpt_chars() -> usize {
    DEFAULT_EXCERPT_CHARS
}

fn default_attribution() -> String {
    DEFAULT_ATTRIBUTION.to_string()
}

fn default_min_content_height() -> u32 {
    DEFAULT_MIN_FRAME_HEIGHT
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let base_url = raw
            .server
            .and_then(|s| s.base_url)
            .ok_or_else(|| ConfigError::Parse("missing base_url in [server]".to_string()))?;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Parse(format!(
                "base_url '{}' must start with http:// or https://",
                base_url
            )));
        }

        if raw.reply.excerpt_chars == 0 {
            return Err(ConfigError::Parse(
                "excerpt_chars must be greater than 0 in [reply]".to_string(),
            ));
        }

        Ok(Config {
            server: ServerConfig { base_url },
            reply: ReplyConfig {
                excerpt_chars: raw.reply.excerpt_chars,
                attribution: raw.reply.attribution,
            },
            frame: FrameConfig {
                min_content_height: raw.frame.min_content_height,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = Config::parse(
            r#"
[server]
base_url = "https://mail.example.se"
"#,
        )
        .unwrap();

        assert_eq!(config.server.base_url, "https://mail.example.se");
        assert_eq!(config.reply.excerpt_chars, 500);
        assert_eq!(config.reply.attribution, "skrev");
        assert_eq!(config.frame.min_content_height, 20);
    }

    #[test]
    fn test_parse_overrides() {
        let config = Config::parse(
            r#"
[server]
base_url = "http://localhost:8080"

[reply]
excerpt_chars = 200
attribution = "wrote"

[frame]
min_content_height = 40
"#,
        )
        .unwrap();

        assert_eq!(config.reply.excerpt_chars, 200);
        assert_eq!(config.reply.attribution, "wrote");
        assert_eq!(config.frame.min_content_height, 40);
    }

    #[test]
    fn test_missing_base_url() {
        let err = Config::parse("[reply]\nexcerpt_chars = 10\n").unwrap_err();
        match err {
            ConfigError::Parse(msg) => assert!(msg.contains("missing base_url"), "got: {}", msg),
            _ => panic!("expected parse error"),
        }
    }

    #[test]
    fn test_unknown_section_or_key_errors() {
        let err = Config::parse(
            r#"
[server]
base_url = "http://localhost"
retries = 3
"#,
        )
        .unwrap_err();
        match err {
            ConfigError::Parse(msg) => assert!(msg.contains("unknown field"), "got: {}", msg),
            _ => panic!("expected parse error"),
        }
    }

    #[test]
    fn test_rejects_non_http_base_url_and_zero_excerpt() {
        assert!(Config::parse("[server]\nbase_url = \"ftp://x\"\n").is_err());
        assert!(Config::parse(
            "[server]\nbase_url = \"http://x\"\n[reply]\nexcerpt_chars = 0\n"
        )
        .is_err());
    }
}
