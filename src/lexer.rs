//! Source preprocessing and token recognition.
//!
//! The lexer is pull-based: the parser asks whether a given [`Token`] kind is
//! at the front of the remaining input ([`Lexer::at`]) and consumes it with
//! [`Lexer::matches`] or [`Lexer::expect`]. Recognizers are nom combinators,
//! tried only for the kind requested, so the same text can be read as
//! different tokens depending on grammar position (`1:` is an I/O verb, `+:`
//! an assignment, `:` a colon).

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{
        alpha1, alphanumeric0, alphanumeric1, char, digit0, digit1, one_of, satisfy,
    },
    combinator::{opt, peek, recognize},
    multi::many0_count,
};

use crate::{Error, ParseError, ParseErrorKind};

const VERB_CHARS: &str = "+-*%!&|<>=~,^#_$?@.:";
const ASSIGN_CHARS: &str = "+-*%!&|<>=~,^#_$?@.";

/// Lexeme categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Number,
    HexLit,
    Bool,
    Name,
    Symbol,
    Str,
    Verb,
    /// Compound assignment such as `+:`
    Assign,
    /// Digit-colon I/O verb such as `0:`
    IoVerb,
    Adverb,
    Semi,
    Colon,
    View,
    Cond,
    /// `[name:` opening a dict literal
    Dict,
    OpenBracket,
    OpenParen,
    OpenBrace,
    CloseBracket,
    CloseParen,
    CloseBrace,
}

impl Token {
    /// Name used in "X expected." messages
    pub fn describe(self) -> &'static str {
        match self {
            Token::Number => "number",
            Token::HexLit => "byte string",
            Token::Bool => "boolean",
            Token::Name => "name",
            Token::Symbol => "symbol",
            Token::Str => "string",
            Token::Verb => "verb",
            Token::Assign => "assignment",
            Token::IoVerb => "IO verb",
            Token::Adverb => "adverb",
            Token::Semi => "';'",
            Token::Colon => "':'",
            Token::View => "view",
            Token::Cond => "'$['",
            Token::Dict => "dictionary",
            Token::OpenBracket => "'['",
            Token::OpenParen => "'('",
            Token::OpenBrace => "'{'",
            Token::CloseBracket => "']'",
            Token::CloseParen => "')'",
            Token::CloseBrace => "'}'",
        }
    }

    fn recognize(self, input: &str) -> IResult<&str, &str> {
        match self {
            Token::Number => number(input),
            Token::HexLit => recognize((tag("0x"), alphanumeric1)).parse(input),
            Token::Bool => {
                recognize((take_while1(|c: char| c == '0' || c == '1'), char('b'))).parse(input)
            }
            Token::Name => {
                recognize((satisfy(|c| c.is_ascii_alphabetic()), alphanumeric0)).parse(input)
            }
            Token::Symbol => symbol(input),
            Token::Str => string_literal(input),
            Token::Verb => recognize(one_of(VERB_CHARS)).parse(input),
            Token::Assign => recognize((one_of(ASSIGN_CHARS), char(':'))).parse(input),
            Token::IoVerb => {
                recognize((satisfy(|c| c.is_ascii_digit()), char(':'))).parse(input)
            }
            Token::Adverb => recognize((one_of("'\\/"), opt(char(':')))).parse(input),
            Token::Semi => tag(";").parse(input),
            Token::Colon => tag(":").parse(input),
            Token::View => tag("::").parse(input),
            Token::Cond => tag("$[").parse(input),
            Token::Dict => recognize((char('['), alpha1, char(':'))).parse(input),
            Token::OpenBracket => tag("[").parse(input),
            Token::OpenParen => tag("(").parse(input),
            Token::OpenBrace => tag("{").parse(input),
            Token::CloseBracket => tag("]").parse(input),
            Token::CloseParen => tag(")").parse(input),
            Token::CloseBrace => tag("}").parse(input),
        }
    }
}

/// `0w`, `-0w`, `0N`, and decimal numbers with optional sign and fraction
fn number(input: &str) -> IResult<&str, &str> {
    alt((
        recognize((opt(char('-')), tag("0w"))),
        tag("0N"),
        recognize((opt(char('-')), digit1, char('.'), digit0)),
        recognize((opt(char('-')), char('.'), digit1)),
        recognize((opt(char('-')), digit1)),
    ))
    .parse(input)
}

fn symbol(input: &str) -> IResult<&str, &str> {
    recognize((
        char('`'),
        opt((
            satisfy(|c| c.is_ascii_alphabetic() || c == '.'),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '.'),
        )),
    ))
    .parse(input)
}

/// A double-quoted string with backslash escapes, on a single line
fn string_literal(input: &str) -> IResult<&str, &str> {
    recognize((
        char('"'),
        many0_count(alt((
            recognize((char('\\'), satisfy(|c| c != '\n' && c != '\r'))),
            take_while1(|c: char| c != '"' && c != '\\' && c != '\n' && c != '\r'),
        ))),
        char('"'),
    ))
    .parse(input)
}

/// Whitespace, then `/`, then the rest of the line
fn comment(input: &str) -> IResult<&str, &str> {
    recognize((
        satisfy(char::is_whitespace),
        char('/'),
        take_till(|c: char| c == '\n'),
    ))
    .parse(input)
}

/// A minus directly after an operand and directly before a number: `x-1`
fn binary_minus(input: &str) -> IResult<&str, &str> {
    let (rest, matched) = recognize((
        satisfy(|c| c.is_ascii_alphanumeric() || c == ']' || c == ')'),
        char('-'),
    ))
    .parse(input)?;
    peek((opt(char('.')), satisfy(|c| c.is_ascii_digit()))).parse(rest)?;
    Ok((rest, matched))
}

/// Strip comments, separate binary minus from a following number, and fold
/// newlines into statement separators. String literals pass through intact.
pub fn preprocess(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(c) = rest.chars().next() {
        if let Ok((tail, literal)) = string_literal(rest) {
            out.push_str(literal);
            rest = tail;
        } else if let Ok((tail, _)) = comment(rest) {
            rest = tail;
        } else if let Ok((tail, operand)) = binary_minus(rest) {
            out.push_str(operand);
            out.push(' ');
            rest = tail;
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    out.trim().replace('\n', ";")
}

/// Pull-based token stream over preprocessed source
#[derive(Debug)]
pub struct Lexer {
    text: String,
    pos: usize,
    /// Current nesting of `{` function literals
    pub func_depth: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            text: preprocess(&format!(" {source}")),
            pos: 0,
            func_depth: 0,
        }
    }

    pub fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    pub fn done(&self) -> bool {
        self.rest().is_empty()
    }

    pub fn at(&self, token: Token) -> bool {
        token.recognize(self.rest()).is_ok()
    }

    /// Consume `token` if it is next
    pub fn matches(&mut self, token: Token) -> Option<String> {
        self.expect(token).ok()
    }

    /// Consume `token` or fail with "X expected."
    pub fn expect(&mut self, token: Token) -> Result<String, Error> {
        let rest = self.rest();
        let Ok((tail, lexeme)) = token.recognize(rest) else {
            return Err(self.error(
                ParseErrorKind::UnexpectedToken,
                format!("{} expected.", token.describe()),
            ));
        };
        let lexeme = lexeme.to_owned();
        let trimmed = tail.trim_start();
        self.pos = self.text.len() - trimmed.len();
        match token {
            Token::OpenBrace => self.func_depth += 1,
            Token::CloseBrace => self.func_depth = self.func_depth.saturating_sub(1),
            _ => {}
        }
        Ok(lexeme)
    }

    /// A parse error carrying the unconsumed input as context
    pub fn error(&self, kind: ParseErrorKind, message: impl Into<String>) -> Error {
        Error::Parse(ParseError::new(kind, message).at(self.rest()))
    }
}
