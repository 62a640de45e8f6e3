//! Parser for the eight-operation tape language.
//!
//! Every byte outside the operation set is a comment and is skipped; the
//! only way a program can be rejected is an unmatched loop delimiter.

use thiserror::Error;

/// One syntactic element of a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    /// `>`: move the data pointer right
    PtrInc,
    /// `<`: move the data pointer left
    PtrDec,
    /// `+`: increment the current cell
    Inc,
    /// `-`: decrement the current cell
    Dec,
    /// `,`: read one input byte into the current cell
    Read,
    /// `.`: write the current cell as one output byte
    Write,
    /// `[` .. `]`: repeat while the current cell is non-zero
    Loop(Vec<Ast>),
}

/// Errors produced while parsing source text
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A `[` with no matching `]`
    #[error("unmatched '[' at byte {position}")]
    UnmatchedOpen { position: usize },

    /// A `]` with no matching `[`
    #[error("unmatched ']' at byte {position}")]
    UnmatchedClose { position: usize },
}

/// Parses source text into a program
pub fn parse(source: &str) -> Result<Vec<Ast>, ParseError> {
    let mut root = Vec::new();
    // stack of open loops: (byte position of '[', body collected so far)
    let mut open: Vec<(usize, Vec<Ast>)> = Vec::new();

    for (position, ch) in source.char_indices() {
        let node = match ch {
            '>' => Ast::PtrInc,
            '<' => Ast::PtrDec,
            '+' => Ast::Inc,
            '-' => Ast::Dec,
            ',' => Ast::Read,
            '.' => Ast::Write,
            '[' => {
                open.push((position, Vec::new()));
                continue;
            }
            ']' => {
                let (_, body) = open
                    .pop()
                    .ok_or(ParseError::UnmatchedClose { position })?;
                Ast::Loop(body)
            }
            _ => continue,
        };

        match open.last_mut() {
            Some((_, body)) => body.push(node),
            None => root.push(node),
        }
    }

    if let Some((position, _)) = open.pop() {
        return Err(ParseError::UnmatchedOpen { position });
    }

    Ok(root)
}
