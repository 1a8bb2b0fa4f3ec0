//! Delimiter recognition over raw bytes.
//!
//!     Delimiter characters usually end up inside a single sub-lexer token (a host comment, a
//!     tag attribute value, a script operator), so they are recognized here on bytes rather
//!     than on tokens. A [Probe] starts at a candidate first byte and is fed the following
//!     bytes one at a time until it confirms a [Switch] or rejects.
//!
//! End Of Input
//!
//!     When input ends while a probe is still undecided, each source language applies its own
//!     tolerance: a host `<%` or `<%-` still opens a scriptlet, everything else is rejected.

use crate::template::switching::mode::Language;
use serde::{Deserialize, Serialize};

/// A language switch confirmed at the probe's start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Switch {
    /// The tag lexer takes over at the probe start and lexes the opener itself.
    EnterTag,
    /// A script-delimiter of `len` bytes, then the script lexer takes over.
    EnterScript { len: usize },
    /// A script-delimiter of `len` bytes closes the script region.
    LeaveScript { len: usize },
}

/// An undecided delimiter match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Probe {
    /// Host `<`.
    Lt,
    /// Host `<%`.
    LtPercent,
    /// Host `<%-`.
    LtPercentDash,
    /// Host `<` or `</` followed by `matched` bytes of the prefixes in `viable`.
    TagPrefix { closing: bool, matched: usize, viable: u32 },
    /// Tag `<`.
    TagLt,
    /// Tag `<%`.
    TagLtPercent,
    /// Script `%`.
    Percent,
}

impl Probe {
    /// Bytes the probe has read, its first byte included.
    pub fn consumed(self) -> usize {
        match self {
            Probe::Lt | Probe::TagLt | Probe::Percent => 1,
            Probe::LtPercent | Probe::TagLtPercent => 2,
            Probe::LtPercentDash => 3,
            Probe::TagPrefix {
                closing, matched, ..
            } => 1 + usize::from(closing) + matched,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Confirmed(Switch),
    Rejected,
    Undecided(Probe),
}

/// Delimiter tables of one template dialect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delimiters {
    tag_prefixes: Vec<Vec<u8>>,
}

impl Delimiters {
    /// Prefixes are assumed validated (see [LexerConfig](crate::template::config::LexerConfig)).
    pub fn new<I, S>(tag_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tag_prefixes: Vec<Vec<u8>> = tag_prefixes
            .into_iter()
            .map(|prefix| prefix.as_ref().as_bytes().to_vec())
            .collect();
        assert!(tag_prefixes.len() <= 32, "at most 32 tag prefixes are supported");
        Self { tag_prefixes }
    }

    fn all_prefixes(&self) -> u32 {
        match self.tag_prefixes.len() {
            32 => u32::MAX,
            n => (1u32 << n) - 1,
        }
    }

    /// Probe opened by `byte` in `language`, if it can start a delimiter there.
    pub fn start(&self, language: Language, byte: u8) -> Option<Probe> {
        match (language, byte) {
            (Language::Host, b'<') => Some(Probe::Lt),
            (Language::Tag, b'<') => Some(Probe::TagLt),
            (Language::Script, b'%') => Some(Probe::Percent),
            _ => None,
        }
    }

    /// Feeds the next byte after the bytes the probe already consumed.
    pub fn advance(&self, probe: Probe, byte: u8) -> Verdict {
        match probe {
            Probe::Lt => match byte {
                b'%' => Verdict::Undecided(Probe::LtPercent),
                b'/' => self.prefix_step(true, 0, self.all_prefixes(), None),
                _ => self.prefix_step(false, 0, self.all_prefixes(), Some(byte)),
            },
            Probe::LtPercent => match byte {
                b'@' => Verdict::Confirmed(Switch::EnterTag),
                b'-' => Verdict::Undecided(Probe::LtPercentDash),
                b'=' | b'!' => Verdict::Confirmed(Switch::EnterScript { len: 3 }),
                _ => Verdict::Confirmed(Switch::EnterScript { len: 2 }),
            },
            Probe::LtPercentDash => match byte {
                b'-' => Verdict::Confirmed(Switch::EnterTag),
                _ => Verdict::Confirmed(Switch::EnterScript { len: 2 }),
            },
            Probe::TagPrefix {
                closing,
                matched,
                viable,
            } => self.prefix_step(closing, matched, viable, Some(byte)),
            Probe::TagLt => match byte {
                b'%' => Verdict::Undecided(Probe::TagLtPercent),
                _ => Verdict::Rejected,
            },
            Probe::TagLtPercent => match byte {
                b'=' => Verdict::Confirmed(Switch::EnterScript { len: 3 }),
                _ => Verdict::Rejected,
            },
            Probe::Percent => match byte {
                b'>' => Verdict::Confirmed(Switch::LeaveScript { len: 2 }),
                _ => Verdict::Rejected,
            },
        }
    }

    /// Decision for a probe that ran into the end of input.
    pub fn at_end_of_input(&self, probe: Probe) -> Verdict {
        match probe {
            Probe::LtPercent | Probe::LtPercentDash => {
                Verdict::Confirmed(Switch::EnterScript { len: 2 })
            }
            _ => Verdict::Rejected,
        }
    }

    /// Matches `byte` against the viable prefixes; `:` right after a full prefix confirms.
    fn prefix_step(&self, closing: bool, matched: usize, viable: u32, byte: Option<u8>) -> Verdict {
        let Some(byte) = byte else {
            return if viable == 0 {
                Verdict::Rejected
            } else {
                Verdict::Undecided(Probe::TagPrefix {
                    closing,
                    matched,
                    viable,
                })
            };
        };

        let position = matched;
        let mut next = 0u32;
        for (index, prefix) in self.tag_prefixes.iter().enumerate() {
            if viable & (1 << index) == 0 {
                continue;
            }
            if prefix.len() == position {
                if byte == b':' {
                    return Verdict::Confirmed(Switch::EnterTag);
                }
            } else if prefix[position] == byte {
                next |= 1 << index;
            }
        }

        if next == 0 {
            Verdict::Rejected
        } else {
            Verdict::Undecided(Probe::TagPrefix {
                closing,
                matched: matched + 1,
                viable: next,
            })
        }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new(["tpl"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(delimiters: &Delimiters, language: Language, input: &[u8], last: bool) -> Verdict {
        let mut probe = delimiters.start(language, input[0]).expect("probe start");
        for &byte in &input[probe.consumed()..] {
            match delimiters.advance(probe, byte) {
                Verdict::Undecided(next) => probe = next,
                verdict => return verdict,
            }
        }
        if last {
            delimiters.at_end_of_input(probe)
        } else {
            Verdict::Undecided(probe)
        }
    }

    #[test]
    fn test_host_openers() {
        let d = Delimiters::default();
        let script = |len| Verdict::Confirmed(Switch::EnterScript { len });
        assert_eq!(run(&d, Language::Host, b"<%=x", false), script(3));
        assert_eq!(run(&d, Language::Host, b"<%!x", false), script(3));
        assert_eq!(run(&d, Language::Host, b"<% x", false), script(2));
        assert_eq!(run(&d, Language::Host, b"<%-x", false), script(2));
        assert_eq!(run(&d, Language::Host, b"<%--", false), Verdict::Confirmed(Switch::EnterTag));
        assert_eq!(run(&d, Language::Host, b"<%@", false), Verdict::Confirmed(Switch::EnterTag));
    }

    #[test]
    fn test_host_custom_tag_prefixes() {
        let d = Delimiters::new(["tpl", "tp", "x"]);
        let tag = Verdict::Confirmed(Switch::EnterTag);
        assert_eq!(run(&d, Language::Host, b"<tpl:a", false), tag);
        assert_eq!(run(&d, Language::Host, b"<tp:a", false), tag);
        assert_eq!(run(&d, Language::Host, b"</x:a", false), tag);
        assert_eq!(run(&d, Language::Host, b"<tplx", false), Verdict::Rejected);
        assert_eq!(run(&d, Language::Host, b"<a", false), Verdict::Rejected);
        assert!(matches!(
            run(&d, Language::Host, b"<tp", false),
            Verdict::Undecided(Probe::TagPrefix { matched: 2, .. })
        ));
    }

    #[test]
    fn test_long_prefix_is_matched_to_the_end() {
        let prefix = "p".repeat(300);
        let d = Delimiters::new([prefix.as_str()]);
        let opener = format!("<{prefix}:x");
        assert_eq!(
            run(&d, Language::Host, opener.as_bytes(), false),
            Verdict::Confirmed(Switch::EnterTag)
        );
        let longer = format!("<{prefix}p:x");
        assert_eq!(run(&d, Language::Host, longer.as_bytes(), false), Verdict::Rejected);
        assert!(matches!(
            run(&d, Language::Host, &opener.as_bytes()[..290], false),
            Verdict::Undecided(Probe::TagPrefix { matched: 289, .. })
        ));
    }

    #[test]
    fn test_end_of_input_is_asymmetric() {
        let d = Delimiters::default();
        assert_eq!(
            run(&d, Language::Host, b"<%", true),
            Verdict::Confirmed(Switch::EnterScript { len: 2 })
        );
        assert_eq!(run(&d, Language::Host, b"<tp", true), Verdict::Rejected);
        assert_eq!(run(&d, Language::Tag, b"<%", true), Verdict::Rejected);
        assert_eq!(run(&d, Language::Script, b"%", true), Verdict::Rejected);
    }

    #[test]
    fn test_tag_and_script_delimiters() {
        let d = Delimiters::default();
        assert_eq!(
            run(&d, Language::Tag, b"<%=", false),
            Verdict::Confirmed(Switch::EnterScript { len: 3 })
        );
        assert_eq!(run(&d, Language::Tag, b"<%@", false), Verdict::Rejected);
        assert_eq!(
            run(&d, Language::Script, b"%>", false),
            Verdict::Confirmed(Switch::LeaveScript { len: 2 })
        );
        assert_eq!(run(&d, Language::Script, b"%=", false), Verdict::Rejected);
        assert_eq!(d.start(Language::Script, b'<'), None);
    }

    #[test]
    fn test_consumed_counts_prefix_bytes() {
        let probe = Probe::TagPrefix {
            closing: true,
            matched: 2,
            viable: 1,
        };
        assert_eq!(probe.consumed(), 4);
    }
}
