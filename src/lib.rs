//! oklang - an interpreter for a terse K-family array language
//!
//! Programs are built from scalars, nested lists, dictionaries and first-class
//! functions, manipulated through a small fixed set of polymorphic primitive
//! operators ("verbs") and higher-order combinators ("adverbs"):
//!
//! ```text
//! +/1 2 3            / sum: 6
//! {x*y}[2;3]         / function call: 6
//! 2 3#!6             / reshape: (0 1 2;3 4 5)
//! `a`b!1 2           / dictionary: [a:1;b:2]
//! d:.[d;`a;+;10]     / functional amend
//! v::a+b             / view: recomputed when a or b change
//! ```
//!
//! ## Evaluation model
//!
//! Source text is tokenized and parsed right-to-left into a tree of [`value::Value`]
//! nodes. The same type is used for runtime values, so partially applied verbs,
//! closures and "sticky" expression fragments are ordinary values that can be
//! stored, passed around and printed back as source.
//!
//! All state lives in an explicit [`evaluator::Interpreter`] instance: the verb
//! registry extensions (I/O hooks, native monads), the random source and the
//! root environment. Independent interpreters never share state.
//!
//! ```
//! use oklang::evaluator::Interpreter;
//!
//! let interp = Interpreter::new();
//! let result = interp.eval("+/1 2 3").unwrap();
//! assert_eq!(result.to_string(), "6");
//! ```
//!
//! ## Modules
//!
//! - `lexer`: source preprocessing and token recognition
//! - `parser`: recursive-descent parser producing expression trees
//! - `value`: the tagged value model shared by syntax and runtime
//! - `atomic`: scalar-extension combinators and list/dict helpers
//! - `verbs` / `adverbs`: the primitive registries
//! - `env`: lexical environments and reactive views
//! - `evaluator`: the tree-walking interpreter
//! - `printer`: canonical text rendering
//! - `convert`: JSON host-value conversion (feature `json`)
//! - `io`: default I/O verb hooks

use std::fmt;

/// Maximum bracket nesting accepted by the parser
/// Parentheses, brackets, braces and conditionals each count as one level
pub const MAX_PARSE_DEPTH: usize = 64;

/// Maximum nesting of sub-expressions: brackets plus every right operand of
/// a verb chain, so `1+1+...+1` with more terms than this fails to parse
pub const MAX_EXPR_DEPTH: usize = 2048;

/// Maximum nesting of user-function invocations during evaluation
/// Exceeding it raises [`Error::Limit`] instead of overflowing the native stack
pub const MAX_CALL_DEPTH: usize = 256;

/// Maximum nesting of node evaluations, across all active calls
pub const MAX_EVAL_DEPTH: usize = 10_000;

/// Longest list a primitive will build from a numeric count
pub const MAX_LIST_LEN: usize = 1 << 26;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// A token of a particular category was required but not found
    UnexpectedToken,
    /// A literal was recognized but is malformed (odd hex digits, bad escape)
    MalformedLiteral,
    /// Input remained after the last complete statement
    TrailingContent,
    /// Bracket nesting exceeded [`MAX_PARSE_DEPTH`] or expression nesting
    /// exceeded [`MAX_EXPR_DEPTH`]
    TooDeeplyNested,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Snippet of the remaining input where the error occurred (max 40 chars)
    pub context: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Attach the start of the unconsumed input as context
    pub fn at(mut self, remaining: &str) -> Self {
        const MAX_CONTEXT: usize = 40;

        let mut snippet: String = remaining.chars().take(MAX_CONTEXT).collect();
        if remaining.chars().nth(MAX_CONTEXT).is_some() {
            snippet.push_str("[...]");
        }
        self.context = Some(snippet);
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Errors raised while parsing or evaluating.
///
/// The `Display` text is the language-level message; it is also what the
/// trap form of `.` returns as its error string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("parse error. {0}")]
    Parse(ParseError),
    /// Wrong variant, e.g. "dictionary expected, found list."
    #[error("{0}")]
    Type(String),
    /// Invalid operand combination for a verb or adverb
    #[error("{0}")]
    Domain(String),
    /// Index out of bounds, mismatched lengths, malformed byte strings
    #[error("{0}")]
    Length(String),
    /// More positional arguments than a function declares
    #[error("valence error.")]
    Valence,
    #[error("the name '{0}' has not been defined.")]
    Undefined(String),
    /// Host-value boundary failures
    #[error("{0}")]
    Conversion(String),
    /// Implementation limits such as call depth or list length
    #[error("{0}")]
    Limit(String),
}

impl Error {
    pub(crate) fn parse(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Error::Parse(ParseError::new(kind, message))
    }

    /// "`expected` expected, found `<type of found>`."
    pub(crate) fn expected(expected: &str, found: &value::Value) -> Self {
        Error::Type(format!("{expected} expected, found {}.", found.type_name()))
    }

    pub(crate) fn invalid_arguments(symbol: &str) -> Self {
        Error::Domain(format!("invalid arguments to {symbol}"))
    }

    pub(crate) fn domain() -> Self {
        Error::Domain("domain error.".into())
    }

    pub(crate) fn out_of_bounds() -> Self {
        Error::Length("index out of bounds.".into())
    }

    pub(crate) fn length_mismatch() -> Self {
        Error::Length("lists are not the same length.".into())
    }

    pub(crate) fn too_long() -> Self {
        Error::Limit(format!("list too long (max length: {MAX_LIST_LEN})."))
    }
}

/// Runtime configuration for an [`evaluator::Interpreter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum nesting of user-function calls
    pub max_call_depth: usize,
    /// Maximum nesting of node evaluations
    pub max_eval_depth: usize,
    /// Seed for the `?` verb's random source; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Install the `prm` and `in` functions into the root environment
    pub prelude: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_call_depth: MAX_CALL_DEPTH,
            max_eval_depth: MAX_EVAL_DEPTH,
            seed: None,
            prelude: true,
        }
    }
}

impl Config {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_max_eval_depth(mut self, depth: usize) -> Self {
        self.max_eval_depth = depth;
        self
    }

    pub fn without_prelude(mut self) -> Self {
        self.prelude = false;
        self
    }
}

/// Parse and evaluate `source` in a fresh interpreter.
pub fn eval(source: &str) -> Result<value::Value, Error> {
    evaluator::Interpreter::new().eval(source)
}

pub mod adverbs;
pub mod atomic;
pub mod env;
pub mod evaluator;
pub mod io;
pub mod lexer;
pub mod parser;
pub mod printer;
mod stack;
pub mod value;
pub mod verbs;

#[cfg(feature = "json")]
pub mod convert;
