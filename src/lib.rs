//! # lex-template
//!
//! An incremental, resumable lexer for template pages that embed a tag language and a
//! script language inside markup.
//!
//! ## Testing
//!
//! Token streams are asserted in their rendered form, see the
//! [testing module](template::testing).

pub mod template;
