//! # Translator
//!
//! This crate translates source text in the eight-operation tape language
//! into a portable bytecode module.
//!
//! ## Philosophy
//!
//! - **Deterministic**: identical source always yields an identical image.
//! - **Errors carry positions**: a rejected program names the offending
//!   byte offset, and the message is fit to show a user verbatim.
//! - **Optimize without changing meaning**: peephole passes only rewrite
//!   sequences whose observable behavior is provably identical.
//!
//! ## Pipeline
//!
//! source text → [`parse`] → [`ir::lower`] → [`ir::optimize`] →
//! [`codegen::emit`] → [`bytecode::ModuleImage`]

pub mod codegen;
pub mod ir;
pub mod parse;

use bytecode::ModuleImage;
use thiserror::Error;

pub use parse::{Ast, ParseError};

/// Initial tape length declared by translated modules, in cells
pub const DEFAULT_TAPE_HINT: u32 = 30_000;

/// Errors that can occur during translation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
    /// Source text rejected by the parser
    #[error("{0}")]
    Parse(#[from] ParseError),
}

/// Translates source text into a binary module image
pub fn translate(source: &str) -> Result<Vec<u8>, TranslateError> {
    Ok(translate_module(source)?.to_bytes())
}

/// Translates source text into an in-memory module
pub fn translate_module(source: &str) -> Result<ModuleImage, TranslateError> {
    let ast = parse::parse(source)?;
    let nodes = ir::lower(&ast);

    let raw_len = ir::op_count(&nodes);
    let nodes = ir::optimize(nodes);
    log::debug!(
        "translated {} source bytes: {} ops, {} after peephole",
        source.len(),
        raw_len,
        ir::op_count(&nodes)
    );

    let ops = codegen::emit(&nodes);
    Ok(ModuleImage::new(ops, DEFAULT_TAPE_HINT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytecode::Op;

    #[test]
    fn test_translate_is_deterministic() {
        let source = ",[.,]";
        assert_eq!(translate(source).unwrap(), translate(source).unwrap());
    }

    #[test]
    fn test_translate_produces_parseable_image() {
        let image = translate("+>+<[->+<]").unwrap();
        let module = ModuleImage::parse(&image).unwrap();
        assert_eq!(module.entry, 0);
        assert_eq!(module.tape_hint, DEFAULT_TAPE_HINT);
        assert!(!module.ops.is_empty());
    }

    #[test]
    fn test_translate_echo_program() {
        let module = translate_module(",.,.,.").unwrap();
        assert_eq!(
            module.ops,
            vec![Op::Read, Op::Write, Op::Read, Op::Write, Op::Read, Op::Write]
        );
    }

    #[test]
    fn test_translate_surfaces_parse_error() {
        let err = translate("++[").unwrap_err();
        assert_eq!(err, TranslateError::Parse(ParseError::UnmatchedOpen { position: 2 }));
    }
}
