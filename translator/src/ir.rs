//! Intermediate representation and peephole optimization.
//!
//! The IR keeps loops structured so passes can rewrite a whole loop body
//! at once; branch targets only appear during code generation.

use crate::parse::Ast;

/// One IR node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Add a constant to the current cell, wrapping
    Add(u8),
    /// Move the data pointer by a signed distance
    MovePtr(i32),
    /// Store a constant into the current cell
    Set(u8),
    /// Read one input byte into the current cell
    Read,
    /// Write the current cell as one output byte
    Write,
    /// Repeat the body while the current cell is non-zero
    Loop(Vec<Node>),
}

/// Lowers a parsed program into IR
pub fn lower(ast: &[Ast]) -> Vec<Node> {
    ast.iter()
        .map(|item| match item {
            Ast::PtrInc => Node::MovePtr(1),
            Ast::PtrDec => Node::MovePtr(-1),
            Ast::Inc => Node::Add(1),
            Ast::Dec => Node::Add(u8::MAX), // -1 mod 256
            Ast::Read => Node::Read,
            Ast::Write => Node::Write,
            Ast::Loop(body) => Node::Loop(lower(body)),
        })
        .collect()
}

/// Counts flat ops, descending into loops
pub fn op_count(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            Node::Loop(body) => 1 + op_count(body),
            _ => 1,
        })
        .sum()
}

/// Runs the peephole passes until the program stops changing
pub fn optimize(nodes: Vec<Node>) -> Vec<Node> {
    let mut nodes = nodes;
    loop {
        let merged = merge(&nodes);
        let cleared = clear(&merged);
        if cleared == nodes {
            return cleared;
        }
        nodes = cleared;
    }
}

/// Merges runs of adjacent adds and pointer moves, dropping no-ops
fn merge(nodes: &[Node]) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());

    for node in nodes {
        match node {
            Node::Add(b) => {
                let fused = match out.last_mut() {
                    Some(Node::Add(a)) | Some(Node::Set(a)) => {
                        *a = a.wrapping_add(*b);
                        true
                    }
                    _ => false,
                };
                if !fused {
                    out.push(Node::Add(*b));
                }
            }
            Node::MovePtr(b) => {
                let fused = match out.last_mut() {
                    Some(Node::MovePtr(a)) => {
                        *a = a.saturating_add(*b);
                        true
                    }
                    _ => false,
                };
                if !fused {
                    out.push(Node::MovePtr(*b));
                }
            }
            Node::Set(value) => {
                // a Set makes an immediately preceding Add or Set dead
                if matches!(out.last(), Some(Node::Add(_)) | Some(Node::Set(_))) {
                    out.pop();
                }
                out.push(Node::Set(*value));
            }
            Node::Loop(body) => out.push(Node::Loop(merge(body))),
            other => out.push(other.clone()),
        }
    }

    out.retain(|node| !matches!(node, Node::Add(0) | Node::MovePtr(0)));
    out
}

/// Rewrites clear loops into a constant store
///
/// `Loop([Add(n)])` zeroes the current cell whenever `n` is odd, because an
/// odd step generates all of Z/256; an even step can orbit forever, so it
/// is left alone.
fn clear(nodes: &[Node]) -> Vec<Node> {
    nodes
        .iter()
        .map(|node| match node {
            Node::Loop(body) => match body.as_slice() {
                [Node::Add(n)] if n % 2 == 1 => Node::Set(0),
                _ => Node::Loop(clear(body)),
            },
            other => other.clone(),
        })
        .collect()
}
