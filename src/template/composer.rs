//! Composition of independently numbered sub-languages into one token id space.
//!
//!     Each registered syntax gets a shift: the sum of `max_id + 1` over everything registered
//!     before it. Local id `n` of syntax `k` becomes global id `n + shift(k)`. Structural ids
//!     are shared and never shifted, so the first few ids of every later syntax stay unused.
//!
//!     Display names can be overridden per global id without touching the numbering. Overrides
//!     live in a table sorted by id; lookups binary-search it before falling back to the
//!     owning syntax.

use crate::template::token::{structural_name, TokenId, TokenKind};
use std::marker::PhantomData;

/// Token vocabulary of one sub-language.
pub trait Syntax: Send + Sync {
    fn language(&self) -> &'static str;
    fn max_token_id(&self) -> TokenId;
    /// Local name lookup; must be total over `0..=max_token_id()`.
    fn token_name(&self, id: TokenId) -> Option<&'static str>;
}

/// [Syntax] view over a [TokenKind] enum.
pub struct KindSyntax<K>(PhantomData<K>);

impl<K: TokenKind> KindSyntax<K> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K: TokenKind> Default for KindSyntax<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TokenKind> Syntax for KindSyntax<K> {
    fn language(&self) -> &'static str {
        K::LANGUAGE
    }

    fn max_token_id(&self) -> TokenId {
        K::max_id()
    }

    fn token_name(&self, id: TokenId) -> Option<&'static str> {
        K::local_name(id)
    }
}

/// Handle returned by [SyntaxComposer::register].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SyntaxInfo {
    index: usize,
    shift: u16,
}

impl SyntaxInfo {
    pub fn shift(&self) -> u16 {
        self.shift
    }

    /// Local id to global id. Structural ids pass through.
    pub fn to_global(&self, local: TokenId) -> TokenId {
        if local.is_structural() {
            local
        } else {
            TokenId(local.0 + self.shift)
        }
    }

    /// Global id back to local id. Structural ids pass through.
    pub fn to_local(&self, global: TokenId) -> TokenId {
        if global.is_structural() {
            global
        } else {
            TokenId(global.0 - self.shift)
        }
    }
}

struct Registered {
    syntax: Box<dyn Syntax>,
    shift: u16,
}

#[derive(Default)]
pub struct SyntaxComposer {
    chain: Vec<Registered>,
    overrides: Vec<(TokenId, String)>,
}

impl SyntaxComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, syntax: Box<dyn Syntax>) -> SyntaxInfo {
        let shift = self
            .chain
            .last()
            .map(|prev| prev.shift + prev.syntax.max_token_id().0 + 1)
            .unwrap_or(0);
        tracing::trace!(language = syntax.language(), shift, "registered syntax");
        self.chain.push(Registered { syntax, shift });
        SyntaxInfo {
            index: self.chain.len() - 1,
            shift,
        }
    }

    /// Renames the global id of `local` in the syntax behind `info`.
    ///
    /// Panics if `info` was not issued by this composer or `local` is outside that syntax's
    /// range: both are wiring defects, not input errors.
    pub fn override_name(&mut self, info: SyntaxInfo, local: TokenId, name: impl Into<String>) {
        let registered = self
            .chain
            .get(info.index)
            .filter(|registered| registered.shift == info.shift)
            .unwrap_or_else(|| panic!("syntax handle {info:?} is not registered"));
        assert!(
            !local.is_structural() && local <= registered.syntax.max_token_id(),
            "token {local:?} is outside the range of syntax `{}`",
            registered.syntax.language()
        );

        let global = info.to_global(local);
        let name = name.into();
        match self.overrides.binary_search_by_key(&global, |(id, _)| *id) {
            Ok(found) => self.overrides[found].1 = name,
            Err(insert_at) => self.overrides.insert(insert_at, (global, name)),
        }
    }

    /// Overrides every name of `info`'s syntax that an earlier syntax already uses with
    /// `<language>-<name>`.
    pub fn override_colliding_names(&mut self, info: SyntaxInfo) {
        let Some(registered) = self.chain.get(info.index) else {
            panic!("syntax handle {info:?} is not registered");
        };
        let language = registered.syntax.language();
        let renames: Vec<(TokenId, String)> = (TokenId::FIRST_LOCAL
            ..=registered.syntax.max_token_id().0)
            .map(TokenId)
            .filter_map(|local| {
                let name = registered.syntax.token_name(local)?;
                let collides = self.chain[..info.index].iter().any(|earlier| {
                    (TokenId::FIRST_LOCAL..=earlier.syntax.max_token_id().0)
                        .any(|id| earlier.syntax.token_name(TokenId(id)) == Some(name))
                });
                collides.then(|| (local, format!("{language}-{name}")))
            })
            .collect();

        for (local, name) in renames {
            self.override_name(info, local, name);
        }
    }

    /// Name of a global id: overrides first, then the owning syntax.
    pub fn token_name(&self, id: TokenId) -> Option<&str> {
        if let Ok(found) = self.overrides.binary_search_by_key(&id, |(id, _)| *id) {
            return Some(&self.overrides[found].1);
        }
        if let Some(name) = structural_name(id) {
            return Some(name);
        }
        let (index, local) = self.resolve(id)?;
        self.chain[index].syntax.token_name(local)
    }

    /// Highest global id handed out so far.
    pub fn max_token_id(&self) -> Option<TokenId> {
        self.chain
            .last()
            .map(|last| TokenId(last.shift + last.syntax.max_token_id().0))
    }

    /// The `(syntax index, local id)` pair behind a global id.
    ///
    /// Ids that land on a later syntax's structural slots belong to nobody.
    pub fn resolve(&self, id: TokenId) -> Option<(usize, TokenId)> {
        if id.is_structural() {
            return None;
        }
        let (index, owner) = self
            .chain
            .iter()
            .enumerate()
            .rev()
            .find(|(_, r)| r.shift <= id.0)?;
        let local = TokenId(id.0 - owner.shift);
        (!local.is_structural() && local <= owner.syntax.max_token_id()).then_some((index, local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::token::token_kinds;

    token_kinds! {
        enum First in "first" {
            Word = 2 => "word",
            Mark = 3 => "mark",
        }
    }

    token_kinds! {
        enum Second in "second" {
            Mark = 2 => "mark",
            Digit = 3 => "digit",
            Blank = 4 => "blank",
        }
    }

    fn composed() -> (SyntaxComposer, SyntaxInfo, SyntaxInfo) {
        let mut composer = SyntaxComposer::new();
        let first = composer.register(Box::new(KindSyntax::<First>::new()));
        let second = composer.register(Box::new(KindSyntax::<Second>::new()));
        (composer, first, second)
    }

    #[test]
    fn test_shifts_accumulate_in_registration_order() {
        let (composer, first, second) = composed();
        assert_eq!(first.shift(), 0);
        assert_eq!(second.shift(), 4);
        assert_eq!(composer.max_token_id(), Some(TokenId(8)));
    }

    #[test]
    fn test_structural_ids_are_not_shifted() {
        let (_, _, second) = composed();
        assert_eq!(second.to_global(TokenId::END_OF_LINE), TokenId::END_OF_LINE);
        assert_eq!(second.to_global(Second::Digit.id()), TokenId(7));
        assert_eq!(second.to_local(TokenId(7)), Second::Digit.id());
    }

    #[test]
    fn test_names_delegate_to_owner() {
        let (composer, _, _) = composed();
        assert_eq!(composer.token_name(TokenId(2)), Some("word"));
        assert_eq!(composer.token_name(TokenId(6)), Some("mark"));
        assert_eq!(composer.token_name(TokenId(8)), Some("blank"));
        assert_eq!(composer.token_name(TokenId(9)), None);
    }

    #[test]
    fn test_override_keeps_numbering() {
        let (mut composer, _, second) = composed();
        composer.override_name(second, Second::Digit.id(), "numeral");
        assert_eq!(composer.token_name(TokenId(7)), Some("numeral"));
        assert_eq!(composer.resolve(TokenId(7)), Some((1, Second::Digit.id())));
    }

    #[test]
    fn test_colliding_names_get_language_prefix() {
        let (mut composer, _, second) = composed();
        composer.override_colliding_names(second);
        assert_eq!(composer.token_name(TokenId(3)), Some("mark"));
        assert_eq!(composer.token_name(TokenId(6)), Some("second-mark"));
        assert_eq!(composer.token_name(TokenId(7)), Some("digit"));
    }

    #[test]
    fn test_every_global_id_resolves_once() {
        let (composer, first, second) = composed();
        let mut seen = Vec::new();
        for local in First::ALL {
            seen.push(first.to_global(local.id()));
        }
        for local in Second::ALL {
            seen.push(second.to_global(local.id()));
        }
        let mut unique = seen.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), seen.len());
        for id in TokenId::FIRST_LOCAL..=composer.max_token_id().unwrap().0 {
            let id = TokenId(id);
            assert_eq!(
                composer.token_name(id).is_some(),
                seen.contains(&id),
                "name of {id:?} disagrees with ownership"
            );
            assert_eq!(composer.resolve(id).is_some(), seen.contains(&id));
        }
    }

    #[test]
    fn test_unused_structural_slots_have_no_owner() {
        let (composer, _, second) = composed();
        for slot in [TokenId(4), TokenId(5)] {
            assert_eq!(composer.resolve(slot), None);
            assert_eq!(composer.token_name(slot), None);
        }
        assert_eq!(composer.resolve(TokenId(6)), Some((1, TokenId(2))));
        assert_eq!(second.shift(), 4);
    }

    #[test]
    #[should_panic(expected = "outside the range")]
    fn test_override_out_of_range_panics() {
        let (mut composer, first, _) = composed();
        composer.override_name(first, TokenId(9), "nope");
    }
}
