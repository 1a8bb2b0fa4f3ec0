//! Nesting of the active sub-languages.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Host,
    Tag,
    Script,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Host => "host",
            Language::Tag => "tag",
            Language::Script => "script",
        };
        f.write_str(name)
    }
}

/// Which sub-lexers are live, outermost first. The last one is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NestMode {
    #[default]
    Host,
    HostTag,
    HostTagScript,
    HostScript,
}

impl NestMode {
    pub fn active(self) -> Language {
        match self {
            NestMode::Host => Language::Host,
            NestMode::HostTag => Language::Tag,
            NestMode::HostTagScript | NestMode::HostScript => Language::Script,
        }
    }

    pub fn is_live(self, language: Language) -> bool {
        match language {
            Language::Host => true,
            Language::Tag => matches!(self, NestMode::HostTag | NestMode::HostTagScript),
            Language::Script => matches!(self, NestMode::HostTagScript | NestMode::HostScript),
        }
    }

    /// Mode after `language` opens inside the active one.
    ///
    /// Panics on combinations the delimiter tables never produce.
    pub fn enter(self, language: Language) -> NestMode {
        match (self, language) {
            (NestMode::Host, Language::Tag) => NestMode::HostTag,
            (NestMode::Host, Language::Script) => NestMode::HostScript,
            (NestMode::HostTag, Language::Script) => NestMode::HostTagScript,
            (mode, language) => unreachable!("no nest mode for {language} inside {mode:?}"),
        }
    }

    /// Mode after the active language closes.
    ///
    /// Panics in [NestMode::Host], which has nothing to close.
    pub fn leave(self) -> NestMode {
        match self {
            NestMode::HostTag | NestMode::HostScript => NestMode::Host,
            NestMode::HostTagScript => NestMode::HostTag,
            NestMode::Host => unreachable!("the host language cannot be left"),
        }
    }
}
