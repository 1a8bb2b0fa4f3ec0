//! Configuration loader for template lexers.
//!
//! `defaults/lexer.default.toml` is embedded into the library so that the documented
//! defaults and the runtime behavior stay in sync. Applications layer their own files on
//! top of those defaults via [`Loader`] before deserializing into [`LexerConfig`].

use crate::template::error::LexerError;
use crate::template::switching::Delimiters;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../../defaults/lexer.default.toml");

static TAG_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.\-]*$").expect("tag prefix pattern"));

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LexerConfig {
    pub lexer: LexerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LexerSettings {
    pub variant: LanguageVariant,
    pub tag_prefixes: Vec<String>,
    pub chunk_size: usize,
}

/// Which languages a lexer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LanguageVariant {
    /// Markup with tags and script regions.
    Page,
    /// Markup only; delimiters are never recognized.
    Markup,
}

impl LexerConfig {
    /// Checks the settings the deserializer cannot express.
    pub fn validate(&self) -> Result<(), LexerError> {
        let prefixes = &self.lexer.tag_prefixes;
        if prefixes.len() > 32 {
            return Err(LexerError::TooManyTagPrefixes(prefixes.len()));
        }
        if let Some(bad) = prefixes.iter().find(|prefix| !TAG_PREFIX.is_match(prefix)) {
            return Err(LexerError::InvalidTagPrefix(bad.clone()));
        }
        if self.lexer.chunk_size == 0 {
            return Err(LexerError::ZeroChunkSize);
        }
        Ok(())
    }

    /// Delimiter tables for the configured prefixes.
    pub fn delimiters(&self) -> Result<Delimiters, LexerError> {
        self.validate()?;
        Ok(Delimiters::new(&self.lexer.tag_prefixes))
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder, deserialize and validate the resulting configuration.
    pub fn build(self) -> Result<LexerConfig, LexerError> {
        let config: LexerConfig = self.builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<LexerConfig, LexerError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.lexer.variant, LanguageVariant::Page);
        assert_eq!(config.lexer.tag_prefixes, vec!["tpl".to_string()]);
        assert_eq!(config.lexer.chunk_size, 4096);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("lexer.variant", "markup")
            .expect("override to apply")
            .set_override("lexer.chunk_size", 16i64)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.lexer.variant, LanguageVariant::Markup);
        assert_eq!(config.lexer.chunk_size, 16);
    }

    #[test]
    fn missing_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("/nonexistent/lexer.toml")
            .build()
            .expect("config to build");
        assert_eq!(config, load_defaults().expect("defaults"));
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = Loader::new().with_file("/nonexistent/lexer.toml").build();
        assert!(matches!(result, Err(LexerError::Config(_))));
    }

    #[test]
    fn rejects_malformed_prefixes() {
        let mut config = load_defaults().expect("defaults");
        config.lexer.tag_prefixes = vec!["ok".into(), "no:colon".into()];
        assert!(matches!(
            config.validate(),
            Err(LexerError::InvalidTagPrefix(prefix)) if prefix == "no:colon"
        ));

        config.lexer.tag_prefixes = (0..33).map(|n| format!("p{n}")).collect();
        assert!(matches!(
            config.delimiters(),
            Err(LexerError::TooManyTagPrefixes(33))
        ));
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let result = Loader::new()
            .set_override("lexer.chunk_size", 0i64)
            .expect("override to apply")
            .build();
        assert!(matches!(result, Err(LexerError::ZeroChunkSize)));
    }
}
