//! engine::input
//!
//! Parser for the whitespace-separated workload format.
//!
//! # Format
//!
//! ```text
//! N m Q
//! name_0 name_1 ... name_{N-1}
//! op name uid        (Q times)
//! ```
//!
//! Line breaks carry no meaning; tokens may be laid out freely. Every error
//! reports the 1-based line of the offending token.
//!
//! # Example
//!
//! ```
//! use treelock::engine::input::parse_workload;
//!
//! let workload = parse_workload("3 2 2\nroot a b\n1 a 7\n3 root 7\n").unwrap();
//! assert_eq!(workload.topology.node_count(), 3);
//! assert_eq!(workload.requests.len(), 2);
//! ```

use std::str::FromStr;

use thiserror::Error;

use crate::core::manager::{OpKind, Request};
use crate::core::naming::{NameTable, NamingError};
use crate::core::topology::{Topology, TopologyError};
use crate::core::types::{NodeName, OwnerId, TypeError};

/// Errors from workload parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("input is empty")]
    Empty,

    #[error("line {line}: unexpected end of input, expected {expected}")]
    UnexpectedEnd { line: usize, expected: String },

    #[error("line {line}: expected {field} to be an integer, got '{token}'")]
    InvalidInteger {
        line: usize,
        field: &'static str,
        token: String,
    },

    #[error("line {line}: unknown opcode {code} (expected 1, 2 or 3)")]
    UnknownOpcode { line: usize, code: i64 },

    #[error("line {line}: {source}")]
    InvalidName { line: usize, source: TypeError },

    #[error("line {line}: {source}")]
    Naming { line: usize, source: NamingError },

    #[error("line {line}: invalid tree shape: {source}")]
    Topology { line: usize, source: TopologyError },

    #[error("line {line}: unexpected trailing token '{token}'")]
    TrailingInput { line: usize, token: String },
}

/// A parsed workload: the tree, its names and the request sequence.
#[derive(Debug, Clone)]
pub struct Workload {
    /// Shape of the tree
    pub topology: Topology,
    /// Node names, in id order
    pub names: NameTable,
    /// Requests, stamped with `seq` `0..Q`
    pub requests: Vec<Request>,
}

impl Workload {
    /// Number of requests of `kind`.
    pub fn count(&self, kind: OpKind) -> usize {
        self.requests.iter().filter(|r| r.kind == kind).count()
    }
}

impl FromStr for Workload {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_workload(s)
    }
}

/// Whitespace tokenizer that remembers line numbers.
struct Tokens<'a> {
    inner: Box<dyn Iterator<Item = (usize, &'a str)> + 'a>,
    line: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        let inner = text
            .lines()
            .enumerate()
            .flat_map(|(i, line)| line.split_whitespace().map(move |t| (i + 1, t)));
        Self {
            inner: Box::new(inner),
            line: 1,
        }
    }

    fn next_token(&mut self, expected: &str) -> Result<(usize, &'a str), InputError> {
        match self.inner.next() {
            Some((line, token)) => {
                self.line = line;
                Ok((line, token))
            }
            None => Err(InputError::UnexpectedEnd {
                line: self.line,
                expected: expected.to_string(),
            }),
        }
    }

    fn next_int<T: FromStr>(&mut self, field: &'static str) -> Result<(usize, T), InputError> {
        let (line, token) = self.next_token(field)?;
        token
            .parse()
            .map(|value| (line, value))
            .map_err(|_| InputError::InvalidInteger {
                line,
                field,
                token: token.to_string(),
            })
    }
}

/// Parse a complete workload.
///
/// # Errors
///
/// Returns an [`InputError`] for empty input, missing or malformed tokens,
/// unknown opcodes or names, duplicate names, a degenerate tree shape and
/// any tokens after the last request.
pub fn parse_workload(text: &str) -> Result<Workload, InputError> {
    if text.trim().is_empty() {
        return Err(InputError::Empty);
    }

    let mut tokens = Tokens::new(text);

    let (header_line, node_count) = tokens.next_int::<usize>("node count")?;
    let (_, arity) = tokens.next_int::<usize>("arity")?;
    let (_, query_count) = tokens.next_int::<usize>("request count")?;

    let topology = Topology::new(node_count, arity).map_err(|source| InputError::Topology {
        line: header_line,
        source,
    })?;

    // Header counts are untrusted; size by what the text can actually hold.
    let max_tokens = text.len() / 2 + 1;
    let mut names = Vec::with_capacity(node_count.min(max_tokens));
    let mut name_lines = Vec::with_capacity(node_count.min(max_tokens));
    for _ in 0..node_count {
        let (line, token) = tokens.next_token("node name")?;
        let name = NodeName::new(token).map_err(|source| InputError::InvalidName { line, source })?;
        names.push(name);
        name_lines.push(line);
    }

    let names = NameTable::new(names).map_err(|source| {
        let line = match &source {
            NamingError::Duplicate { second, .. } => name_lines[second.index()],
            NamingError::Unknown(_) => header_line,
        };
        InputError::Naming { line, source }
    })?;

    let mut requests = Vec::with_capacity(query_count.min(max_tokens / 3));
    for seq in 0..query_count {
        let (line, code) = tokens.next_int::<i64>("opcode")?;
        let kind = u8::try_from(code)
            .ok()
            .and_then(OpKind::from_code)
            .ok_or(InputError::UnknownOpcode { line, code })?;

        let (line, token) = tokens.next_token("node name")?;
        let node = names
            .resolve(token)
            .map_err(|source| InputError::Naming { line, source })?;

        let (_, owner) = tokens.next_int::<i64>("owner id")?;

        requests.push(Request::new(seq, kind, node, OwnerId::new(owner)));
    }

    if let Some((line, token)) = tokens.inner.next() {
        return Err(InputError::TrailingInput {
            line,
            token: token.to_string(),
        });
    }

    Ok(Workload {
        topology,
        names,
        requests,
    })
}
