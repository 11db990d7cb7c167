//! Configuration structures for the tokenizer, assembler and replacement
//! engine.
//!
//! Plain `serde`-derived structs with `Default` impls and no hidden global
//! state. There is no project-wide config-file discovery here — this crate
//! keeps no persisted state of its own — so `TokenizerConfig::from_toml_str`
//! is offered purely as a convenience for hosts that want one, built on the
//! same `toml` crate.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("maxLookBehind must be positive, got {0}")]
    NonPositiveLookBehind(i64),
    #[error("emoji shortcode {0:?} is reserved and cannot be overridden")]
    ReservedShortcode(String),
    #[error("failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Which safe inline HTML tags the inline parser recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeInlineTags {
    pub br: bool,
    pub kbd: bool,
    pub sup: bool,
    pub sub: bool,
}

impl Default for SafeInlineTags {
    fn default() -> Self {
        SafeInlineTags {
            br: true,
            kbd: true,
            sup: true,
            sub: true,
        }
    }
}

/// Configuration for the block state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Per-line look-behind budget in code units, before the buffer is
    /// trimmed from the front.
    pub max_look_behind: usize,
    pub safe_inline_tags: SafeInlineTags,
    pub replacement: ReplacementConfig,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            max_look_behind: 1024,
            safe_inline_tags: SafeInlineTags::default(),
            replacement: ReplacementConfig::default(),
        }
    }
}

impl TokenizerConfig {
    /// Half the look-behind budget, kept as slack before trimming.
    pub fn slack(&self) -> usize {
        self.max_look_behind / 2
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_look_behind == 0 {
            return Err(ConfigError::NonPositiveLookBehind(0));
        }
        self.replacement.validate()
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: TokenizerConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Configuration for the literal/emoji replacement engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacementConfig {
    /// Ordered pattern -> replacement table, matched longest-first.
    pub literal_replacements: IndexMap<String, String>,
    /// Shortcode name (without colons) -> emoji.
    pub emoji_shortcodes: IndexMap<String, String>,
    /// Maximum shortcode identifier length before the engine gives up and
    /// flushes the buffered text verbatim.
    pub max_shortcode_len: usize,
}

impl Default for ReplacementConfig {
    fn default() -> Self {
        let mut literal_replacements = IndexMap::new();
        literal_replacements.insert("...".to_string(), "…".to_string());
        literal_replacements.insert("(c)".to_string(), "©".to_string());
        literal_replacements.insert("(r)".to_string(), "®".to_string());
        literal_replacements.insert("(tm)".to_string(), "™".to_string());
        literal_replacements.insert(":-)".to_string(), "🙂".to_string());
        literal_replacements.insert(":-(".to_string(), "🙁".to_string());
        literal_replacements.insert("->".to_string(), "→".to_string());
        literal_replacements.insert("<-".to_string(), "←".to_string());

        let mut emoji_shortcodes = IndexMap::new();
        emoji_shortcodes.insert("smile".to_string(), "😄".to_string());
        emoji_shortcodes.insert("heart".to_string(), "❤️".to_string());
        emoji_shortcodes.insert("thumbsup".to_string(), "👍".to_string());
        emoji_shortcodes.insert("tada".to_string(), "🎉".to_string());
        emoji_shortcodes.insert("rocket".to_string(), "🚀".to_string());
        emoji_shortcodes.insert("fire".to_string(), "🔥".to_string());
        emoji_shortcodes.insert("eyes".to_string(), "👀".to_string());
        emoji_shortcodes.insert("joy".to_string(), "😂".to_string());

        ReplacementConfig {
            literal_replacements,
            emoji_shortcodes,
            max_shortcode_len: 32,
        }
    }
}

impl ReplacementConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // ":" and "" would make the shortcode scanner ambiguous with its own
        // delimiter; reject them defensively.
        for name in self.emoji_shortcodes.keys() {
            if name.is_empty() || name.contains(':') {
                return Err(ConfigError::ReservedShortcode(name.clone()));
            }
        }
        Ok(())
    }

    /// The set of every proper, non-empty prefix of a literal pattern —
    /// used by the replacement engine to decide whether a partially matched
    /// suffix might still extend into a longer pattern.
    pub fn prefix_set(&self) -> HashSet<String> {
        let mut set = HashSet::new();
        for pattern in self.literal_replacements.keys() {
            let chars: Vec<char> = pattern.chars().collect();
            for len in 1..chars.len() {
                set.insert(chars[..len].iter().collect());
            }
        }
        set
    }
}

/// Configuration for the assembler's retention window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    pub retention_blocks: Option<usize>,
    pub retention_bytes: Option<usize>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        AssemblerConfig {
            retention_blocks: None,
            retention_bytes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(TokenizerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_look_behind() {
        let mut cfg = TokenizerConfig::default();
        cfg.max_look_behind = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn prefix_set_covers_proper_prefixes() {
        let cfg = ReplacementConfig::default();
        let prefixes = cfg.prefix_set();
        assert!(prefixes.contains(".."));
        assert!(prefixes.contains("."));
        assert!(!prefixes.contains("..."));
    }

    #[test]
    fn from_toml_round_trips_defaults() {
        let cfg = TokenizerConfig::default();
        let s = toml::to_string(&cfg).unwrap();
        let parsed = TokenizerConfig::from_toml_str(&s).unwrap();
        assert_eq!(cfg, parsed);
    }
}
