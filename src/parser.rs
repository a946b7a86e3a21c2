//! Recursive-descent parser producing expression trees.
//!
//! Expressions parse right to left: the right operand of a verb or adverb is
//! a complete sub-expression, so `2*3+4` is `2*(3+4)`. The output is a list of
//! statements made of [`Value`] nodes; the evaluator runs them in order.
//!
//! A verb chain whose innermost right operand is missing (`(2*1+)`) is marked
//! "sticky": the depth of the unfilled node along the right-operand chain is
//! recorded on the root so the fragment can later be applied as a function.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::lexer::{Lexer, Token};
use crate::value::{Adverb, Dict, Function, NameRef, Value, Verb, View};
use crate::stack::ensure_sufficient_stack;
use crate::{Error, MAX_EXPR_DEPTH, MAX_PARSE_DEPTH, ParseErrorKind};

/// Names that may be used infix: `x in y` is `in[x;y]`
const BUILTIN_INFIX: [&str; 2] = ["o", "in"];

/// Names parsed as monadic verbs when no registry is supplied
pub const DEFAULT_NATIVE_MONADS: [&str; 4] = ["log", "exp", "sin", "cos"];

/// Parse `source` treating only the default native monads as verbs.
pub fn parse(source: &str) -> Result<Vec<Value>, Error> {
    let is_native = |name: &str| DEFAULT_NATIVE_MONADS.contains(&name);
    Parser::new(source, &is_native).parse()
}

pub struct Parser<'a> {
    lexer: Lexer,
    is_native: &'a dyn Fn(&str) -> bool,
    /// Open brackets, parentheses, braces and conditionals
    depth: usize,
    /// Open sub-expressions of any kind, brackets included
    expr_depth: usize,
    /// Enclosing constructs in which a dangling verb is a valid value
    nesting: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &str, is_native: &'a dyn Fn(&str) -> bool) -> Self {
        Parser {
            lexer: Lexer::new(source),
            is_native,
            depth: 0,
            expr_depth: 0,
            nesting: 0,
        }
    }

    /// Parse a whole program into its statement list
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn parse(mut self) -> Result<Vec<Value>, Error> {
        let statements = self.parse_list(None, false)?;
        if let Some(c) = self.lexer.rest().chars().next() {
            return Err(self.lexer.error(
                ParseErrorKind::TrailingContent,
                format!("unexpected character '{c}'."),
            ));
        }
        tracing::debug!(statements = statements.len(), "parsed program");
        Ok(statements)
    }

    fn noun_expected(&self, after: &str) -> Error {
        self.lexer.error(
            ParseErrorKind::UnexpectedToken,
            format!("noun expected following '{after}'."),
        )
    }

    fn too_deep(&self, limit: usize) -> Error {
        self.lexer.error(
            ParseErrorKind::TooDeeplyNested,
            format!("expression too deeply nested (max depth: {limit})."),
        )
    }

    fn enter_expr(&mut self) -> Result<(), Error> {
        self.expr_depth += 1;
        if self.expr_depth > MAX_EXPR_DEPTH {
            return Err(self.too_deep(MAX_EXPR_DEPTH));
        }
        Ok(())
    }

    fn at_noun(&self) -> bool {
        [
            Token::Number,
            Token::Name,
            Token::Symbol,
            Token::Str,
            Token::Cond,
            Token::OpenParen,
            Token::OpenBrace,
        ]
        .into_iter()
        .any(|t| self.lexer.at(t))
    }

    /// Items separated by `;` up to `terminal`. Without `cull`, empty items
    /// become `Nil` placeholders.
    fn parse_list(&mut self, terminal: Option<Token>, cull: bool) -> Result<Vec<Value>, Error> {
        if terminal.is_some() {
            self.depth += 1;
            if self.depth > MAX_PARSE_DEPTH {
                return Err(self.too_deep(MAX_PARSE_DEPTH));
            }
            self.enter_expr()?;
            self.nesting += 1;
        }
        let mut items = Vec::new();
        loop {
            if let Some(t) = terminal
                && self.lexer.at(t)
            {
                break;
            }
            while self.lexer.matches(Token::Semi).is_some() {
                if !cull {
                    items.push(Value::Nil);
                }
            }
            let noun = self.parse_noun()?;
            match self.parse_ex(noun)? {
                Some(mut e) => {
                    mark_sticky(&mut e);
                    items.push(e);
                }
                None if !cull => items.push(Value::Nil),
                None => {}
            }
            if self.lexer.matches(Token::Semi).is_none() {
                break;
            }
        }
        if let Some(t) = terminal {
            self.lexer.expect(t)?;
            self.depth -= 1;
            self.expr_depth -= 1;
            self.nesting -= 1;
        }
        Ok(items)
    }

    /// Parse a right-operand sub-expression with dangling verbs allowed
    fn parse_operand(&mut self) -> Result<Option<Value>, Error> {
        self.nesting += 1;
        let noun = self.parse_noun();
        let result = match noun {
            Ok(noun) => self.parse_ex(noun),
            Err(e) => Err(e),
        };
        self.nesting -= 1;
        result
    }

    fn parse_noun(&mut self) -> Result<Option<Value>, Error> {
        if let Some(symbol) = self.lexer.matches(Token::IoVerb) {
            return Ok(Some(Value::Verb(Box::new(Verb::new(symbol)))));
        }
        if let Some(bits) = self.lexer.matches(Token::Bool) {
            let items = bits
                .trim_end_matches('b')
                .chars()
                .map(|c| Value::from_bool(c == '1'))
                .collect();
            return self.index_right(Value::List(items)).map(Some);
        }
        if let Some(hex) = self.lexer.matches(Token::HexLit) {
            return self.byte_string(&hex).map(Some);
        }
        if self.lexer.at(Token::Number) {
            let mut items = Vec::new();
            while let Some(n) = self.lexer.matches(Token::Number) {
                items.push(Value::Number(self.number(&n)?));
            }
            return self.index_right(Value::wrap(items)).map(Some);
        }
        if self.lexer.at(Token::Symbol) {
            let mut items = Vec::new();
            while let Some(s) = self.lexer.matches(Token::Symbol) {
                items.push(Value::Symbol(s[1..].to_owned()));
            }
            return self.index_right(Value::wrap(items)).map(Some);
        }
        if let Some(s) = self.lexer.matches(Token::Str) {
            let text = unescape(&s[1..s.len() - 1]);
            return self
                .index_right(Value::wrap(text.chars().map(Value::from).collect()))
                .map(Some);
        }
        if self.lexer.matches(Token::OpenBracket).is_some() {
            let dict = self.dict_literal()?;
            return self.index_right(dict).map(Some);
        }
        if self.lexer.matches(Token::OpenBrace).is_some() {
            return self.function_literal().map(Some);
        }
        if self.lexer.matches(Token::OpenParen).is_some() {
            let items = self.parse_list(Some(Token::CloseParen), false)?;
            return self.index_right(Value::wrap(items)).map(Some);
        }
        if self.lexer.matches(Token::Cond).is_some() {
            let branches = self.parse_list(Some(Token::CloseBracket), true)?;
            return Ok(Some(Value::Cond(branches)));
        }
        if let Some(symbol) = self.lexer.matches(Token::Verb) {
            return self.verb_noun(symbol).map(Some);
        }
        if let Some(name) = self.lexer.matches(Token::Name) {
            return self.name(name).map(Some);
        }
        Ok(None)
    }

    fn number(&self, text: &str) -> Result<f64, Error> {
        Ok(match text {
            "0w" => f64::INFINITY,
            "-0w" => f64::NEG_INFINITY,
            "0N" => f64::NAN,
            _ => text.parse().map_err(|_| {
                self.lexer.error(
                    ParseErrorKind::MalformedLiteral,
                    format!("malformed number '{text}'."),
                )
            })?,
        })
    }

    /// `0x6869`: pairs of hex digits, one char per byte
    fn byte_string(&self, hex: &str) -> Result<Value, Error> {
        let digits = &hex[2..];
        if digits.len() % 2 != 0 {
            return Err(Error::Length(
                "stray hex digit at end of byte string.".into(),
            ));
        }
        let bytes = (0..digits.len())
            .step_by(2)
            .map(|i| {
                u32::from_str_radix(&digits[i..i + 2], 16)
                    .map(Value::Char)
                    .map_err(|_| {
                        self.lexer.error(
                            ParseErrorKind::MalformedLiteral,
                            format!("malformed byte string '{hex}'."),
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::wrap(bytes))
    }

    /// `[a:1;b:a+1;c::a]`; `k::name` copies an earlier entry
    fn dict_literal(&mut self) -> Result<Value, Error> {
        let mut dict = Dict::default();
        if self.lexer.matches(Token::CloseBracket).is_none() {
            loop {
                let key = Value::Symbol(self.lexer.expect(Token::Name)?);
                self.lexer.expect(Token::Colon)?;
                let value = if self.lexer.matches(Token::Colon).is_some() {
                    let source = Value::Symbol(self.lexer.expect(Token::Name)?);
                    dict.get(&source).cloned().unwrap_or(Value::Number(f64::NAN))
                } else {
                    self.parse_operand()?.unwrap_or(Value::Nil)
                };
                dict.set(key, value);
                if self.lexer.matches(Token::Semi).is_none() {
                    break;
                }
            }
            self.lexer.expect(Token::CloseBracket)?;
        }
        Ok(Value::Dict(Box::new(dict)))
    }

    fn function_literal(&mut self) -> Result<Value, Error> {
        let mut params = Vec::new();
        if self.lexer.matches(Token::OpenBracket).is_some() {
            loop {
                params.push(self.lexer.expect(Token::Name)?);
                if self.lexer.matches(Token::Semi).is_none() {
                    break;
                }
            }
            self.lexer.expect(Token::CloseBracket)?;
        }
        let body = self.parse_list(Some(Token::CloseBrace), true)?;
        if params.is_empty() {
            let names = find_names(&body);
            let arity = ["x", "y", "z"]
                .iter()
                .rposition(|p| names.contains(*p))
                .map_or(0, |i| i + 1);
            params = ["x", "y", "z"][..arity].iter().map(|p| (*p).to_owned()).collect();
        }
        let f = Value::Function(Box::new(Function::new(params, body)));
        self.call_right(f)
    }

    /// A verb in noun position: `+`, `#:`, `+[1;]`
    fn verb_noun(&mut self, symbol: String) -> Result<Value, Error> {
        let mut verb = Verb::new(symbol);
        if self.lexer.matches(Token::Colon).is_some() {
            verb.force_monad = true;
        }
        if self.lexer.at(Token::OpenBracket) && !self.lexer.at(Token::Dict) {
            self.lexer.expect(Token::OpenBracket)?;
            let mut curry = self.parse_list(Some(Token::CloseBracket), false)?;
            if curry.len() < 2 && !verb.force_monad {
                curry.push(Value::Nil);
            }
            verb.curry = Some(curry);
        }
        Ok(Value::Verb(Box::new(verb)))
    }

    fn name(&mut self, name: String) -> Result<Value, Error> {
        if (self.is_native)(&name) {
            return self.call_right(Value::Verb(Box::new(Verb::new(name))));
        }
        if self.lexer.func_depth == 0 && self.lexer.matches(Token::View).is_some() {
            let expr = self.parse_operand()?.ok_or_else(|| self.noun_expected("::"))?;
            let names = find_names(std::slice::from_ref(&expr));
            return Ok(Value::View(Rc::new(View::new(name, expr, names))));
        }
        if self.lexer.matches(Token::Colon).is_some() {
            let global = self.lexer.matches(Token::Colon).is_some();
            let mut expr = self.parse_operand()?.ok_or_else(|| self.noun_expected(":"))?;
            mark_sticky(&mut expr);
            if sticky_of(&expr) == Some(0) {
                set_sticky(&mut expr, None);
            }
            return Ok(name_ref(name, Some(expr), global));
        }
        let mut node = name_ref(name.clone(), None, false);
        if self.lexer.matches(Token::OpenBracket).is_some() {
            let mut index = self.parse_list(Some(Token::CloseBracket), false)?;
            if self.lexer.at(Token::Assign) {
                return self.compound_assign(name, Some(index));
            }
            if self.lexer.matches(Token::Colon).is_some() {
                return self.indexed_assign(name, index);
            }
            if index.is_empty() {
                index.push(Value::empty_symbol());
            }
            node = apply_index(node, index);
        } else if self.lexer.at(Token::Assign) {
            node = self.compound_assign(name, None)?;
        }
        self.call_right(node)
    }

    /// `t[i]:y` and `t[i]::y` as deep amends with `{y}`
    fn indexed_assign(&mut self, name: String, index: Vec<Value>) -> Result<Value, Error> {
        let body = vec![name_ref("y".into(), None, false)];
        let replace = Function::new(vec!["x".into(), "y".into()], body);
        let global = self.lexer.matches(Token::Colon).is_some();
        let expr = self.parse_operand()?.ok_or_else(|| self.noun_expected(":"))?;
        Ok(amend_assign(
            name,
            index,
            Value::Function(Box::new(replace)),
            expr,
            global,
        ))
    }

    /// `t+:y`, `t+::y`, `t[i]+:y`, `t[i]+::y`
    fn compound_assign(&mut self, name: String, index: Option<Vec<Value>>) -> Result<Value, Error> {
        let op = self.lexer.expect(Token::Assign)?;
        let op = op.trim_end_matches(':').to_owned();
        let global = self.lexer.matches(Token::Colon).is_some();
        let expr = self.parse_operand()?.ok_or_else(|| self.noun_expected(&op))?;
        let Some(index) = index else {
            // t+::z is t::(.`t)+z
            let current = if global {
                Value::Verb(Box::new(Verb::infix(".", None, Some(Value::Symbol(name.clone())))))
            } else {
                name_ref(name.clone(), None, false)
            };
            let update = Verb::infix(op, Some(current), Some(expr));
            return Ok(name_ref(name, Some(Value::Verb(Box::new(update))), global));
        };
        let op = Value::Verb(Box::new(Verb::new(op)));
        Ok(amend_assign(name, index, op, expr, global))
    }

    /// Trailing `[args]` calls
    fn call_right(&mut self, mut node: Value) -> Result<Value, Error> {
        while self.lexer.matches(Token::OpenBracket).is_some() {
            let mut args = self.parse_list(Some(Token::CloseBracket), false)?;
            if args.is_empty() {
                args.push(Value::empty_symbol());
            }
            node = apply_index(node, args);
        }
        Ok(node)
    }

    /// Trailing `[index]` after a literal, or a verb continuing a sticky fragment
    fn index_right(&mut self, mut node: Value) -> Result<Value, Error> {
        if sticky_of(&node).is_some() && self.lexer.at(Token::Verb) {
            let Some(mut next) = self.parse_noun()? else {
                return Ok(node);
            };
            let right = self.parse_operand()?;
            if let Value::Verb(v) = &mut next {
                v.left = Some(node);
                v.right = right;
            }
            return Ok(next);
        }
        while self.lexer.matches(Token::OpenBracket).is_some() {
            let index = self.parse_list(Some(Token::CloseBracket), false)?;
            node = apply_index(node, index);
        }
        Ok(node)
    }

    /// One or more adverbs applied to `verb`, with an optional left operand
    fn parse_adverb(&mut self, left: Option<Value>, verb: Value) -> Result<Value, Error> {
        let mut symbol = self.lexer.expect(Token::Adverb)?;
        let mut verb = verb;
        while let Some(next) = self.lexer.matches(Token::Adverb) {
            verb = Value::Adverb(Box::new(Adverb::new(symbol, verb)));
            symbol = next;
        }
        let mut adverb = Adverb::new(symbol, verb);
        adverb.left = left;
        if self.lexer.at(Token::OpenBracket) {
            return self.call_right(Value::Adverb(Box::new(adverb)));
        }
        let noun = self.parse_noun()?;
        adverb.right = self.parse_ex(noun)?;
        Ok(Value::Adverb(Box::new(adverb)))
    }

    /// Extend `node` with whatever follows it: a right operand for a bare
    /// verb, juxtaposed application, or an infix verb or adverb.
    fn parse_ex(&mut self, node: Option<Value>) -> Result<Option<Value>, Error> {
        let Some(node) = node else {
            return Ok(None);
        };
        self.enter_expr()?;
        let result = ensure_sufficient_stack(|| self.extend(node));
        self.expr_depth -= 1;
        result
    }

    fn extend(&mut self, mut node: Value) -> Result<Option<Value>, Error> {
        if self.lexer.at(Token::Adverb) {
            return self.parse_adverb(None, node).map(Some);
        }
        if let Value::Verb(v) = &node
            && v.right.is_none()
        {
            let monadic = v.force_monad
                || (self.is_native)(&v.symbol)
                || (v.sticky.is_some() && v.left.is_some());
            let paren = self.lexer.at(Token::OpenParen);
            let x = self.parse_noun()?;
            if let Some(x) = x {
                if self.lexer.at(Token::Adverb) && monadic {
                    return self.parse_adverb(Some(node), x).map(Some);
                }
                let x = match x {
                    Value::Verb(_) if paren => Value::Quote(Box::new(x)),
                    other => other,
                };
                let right = self.parse_ex(Some(x))?;
                if let Value::Verb(v) = &mut node {
                    v.right = right;
                    v.sticky = None;
                }
            }
        }
        if self.at_noun() && !self.lexer.at(Token::IoVerb) {
            let Some(x) = self.parse_noun()? else {
                return Ok(Some(node));
            };
            if let Value::NameRef(r) = &x
                && r.assign.is_none()
                && BUILTIN_INFIX.contains(&r.name.as_str())
            {
                let rhs = self.parse_operand()?.ok_or_else(|| self.noun_expected(&r.name))?;
                let args = Value::List(vec![node, rhs]);
                return Ok(Some(Value::Verb(Box::new(Verb::infix(".", Some(x), Some(args))))));
            }
            if self.lexer.at(Token::Adverb) {
                return self.parse_adverb(Some(node), x).map(Some);
            }
            let arg = self.parse_ex(Some(x))?;
            if let Value::Function(f) = &mut node
                && f.arg.is_none()
            {
                f.arg = arg;
                return Ok(Some(node));
            }
            return Ok(Some(Value::Verb(Box::new(Verb::infix("@", Some(node), arg)))));
        }
        if self.lexer.at(Token::Verb) || self.lexer.at(Token::IoVerb) {
            let Some(x) = self.parse_noun()? else {
                return Ok(Some(node));
            };
            if let Value::Verb(v) = &x
                && v.force_monad
            {
                let arg = self.parse_ex(Some(x))?;
                return Ok(Some(Value::Verb(Box::new(Verb::infix("@", Some(node), arg)))));
            }
            if self.lexer.at(Token::Adverb) {
                return self.parse_adverb(Some(node), x).map(Some);
            }
            let noun = self.parse_noun()?;
            let right = self.parse_ex(noun)?;
            let Value::Verb(mut v) = x else {
                return Ok(Some(x));
            };
            if right.is_none() && self.nesting == 0 {
                return Err(self.noun_expected(&v.symbol));
            }
            v.left = Some(node);
            v.right = right;
            node = Value::Verb(v);
        }
        Ok(Some(node))
    }
}

fn name_ref(name: String, assign: Option<Value>, global: bool) -> Value {
    Value::NameRef(Box::new(NameRef {
        name,
        assign,
        global,
    }))
}

/// `node[args]` as a dyadic `.` application
fn apply_index(node: Value, args: Vec<Value>) -> Value {
    Value::Verb(Box::new(Verb::infix(".", Some(node), Some(Value::List(args)))))
}

/// Desugar an indexed assignment into a four-argument `.` amend.
///
/// Local: `t:.[t;i;f;y]`. Global: `.(.[`t;i;f;y])`, amending the root
/// binding through its symbol and reading back the result.
fn amend_assign(name: String, index: Vec<Value>, op: Value, expr: Value, global: bool) -> Value {
    let target = if global {
        Value::Symbol(name.clone())
    } else {
        name_ref(name.clone(), None, false)
    };
    let amend = Value::Verb(Box::new(Verb::curried(
        ".",
        vec![target, Value::List(index), op, expr],
    )));
    if global {
        Value::Verb(Box::new(Verb::infix(".", None, Some(amend))))
    } else {
        name_ref(name, Some(amend), false)
    }
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Free names referenced by `nodes`, not descending into nested function bodies
pub fn find_names(nodes: &[Value]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for node in nodes {
        collect_names(node, &mut names);
    }
    names
}

fn collect_names(node: &Value, names: &mut BTreeSet<String>) {
    let mut visit = |n: &Option<Value>, names: &mut BTreeSet<String>| {
        if let Some(n) = n {
            collect_names(n, names);
        }
    };
    match node {
        Value::NameRef(r) => {
            names.insert(r.name.clone());
            visit(&r.assign, names);
        }
        Value::Function(f) => {
            for slot in f.curry.iter().flatten() {
                collect_names(slot, names);
            }
            visit(&f.arg, names);
        }
        Value::List(items) | Value::Cond(items) => {
            items.iter().for_each(|n| collect_names(n, names));
        }
        Value::Dict(d) => d.values().iter().for_each(|n| collect_names(n, names)),
        Value::Quote(inner) => collect_names(inner, names),
        Value::View(v) => collect_names(&v.expr, names),
        Value::Verb(v) => {
            visit(&v.left, names);
            visit(&v.right, names);
            for slot in v.curry.iter().flatten() {
                collect_names(slot, names);
            }
        }
        Value::Adverb(a) => {
            collect_names(&a.verb, names);
            visit(&a.left, names);
            visit(&a.right, names);
        }
        _ => {}
    }
}

/// Depth along the right-operand chain of the first missing operand
fn open_depth(root: &Value) -> Option<usize> {
    if let Value::Adverb(a) = root
        && a.right.is_none()
    {
        return None;
    }
    let mut node = root;
    let mut depth = 0;
    loop {
        let right = match node {
            Value::Verb(v) if v.curry.is_none() => &v.right,
            Value::Adverb(a) => &a.right,
            _ => return None,
        };
        match right {
            None => return Some(depth),
            Some(r) => {
                node = r;
                depth += 1;
            }
        }
    }
}

fn mark_sticky(root: &mut Value) {
    if let Some(depth) = open_depth(root) {
        set_sticky(root, Some(depth));
    }
}

pub(crate) fn sticky_of(node: &Value) -> Option<usize> {
    match node {
        Value::Verb(v) => v.sticky,
        Value::Adverb(a) => a.sticky,
        _ => None,
    }
}

pub(crate) fn set_sticky(node: &mut Value, sticky: Option<usize>) {
    match node {
        Value::Verb(v) => v.sticky = sticky,
        Value::Adverb(a) => a.sticky = sticky,
        _ => {}
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::value::{sym, val};
    use pretty_assertions::assert_eq;

    /// Test result variants for comprehensive parsing tests
    #[derive(Debug)]
    enum ParseTestResult {
        /// Printed form of the single parsed statement
        Prints(&'static str),
        Error,
        SpecificError(&'static str),
    }
    use ParseTestResult::*;

    fn run_parse_tests(cases: Vec<(&str, ParseTestResult)>) {
        for (i, (input, expected)) in cases.into_iter().enumerate() {
            let result = parse(input);
            match (result, expected) {
                (Ok(statements), Prints(text)) => {
                    let printed: Vec<String> = statements.iter().map(|s| s.to_string()).collect();
                    assert_eq!(printed.join(";"), text, "#{i} {input:?}");
                }
                (Err(_), Error) => {}
                (Err(e), SpecificError(text)) => {
                    assert!(e.to_string().contains(text), "#{i} {input:?}: {e}");
                }
                (result, expected) => panic!("#{i} {input:?}: got {result:?}, expected {expected:?}"),
            }
        }
    }

    #[test]
    fn test_literals() {
        run_parse_tests(vec![
            ("1 2 3", Prints("1 2 3")),
            ("1.5", Prints("1.5")),
            ("-0w 0w 0N", Prints("-0w 0w 0N")),
            ("`a`b", Prints("`a`b")),
            ("\"hello\"", Prints("\"hello\"")),
            ("\"a\"", Prints("\"a\"")),
            ("\"\"", Prints("()")),
            ("101b", Prints("1 0 1")),
            ("1b", Prints(",1")),
            ("0x6869", Prints("\"hi\"")),
            ("0x686", SpecificError("stray hex digit")),
            ("[a:1;b:2]", Prints("[a:1;b:2]")),
            ("[]", Prints("()!()")),
        ]);
    }

    #[test]
    fn test_expressions() {
        run_parse_tests(vec![
            ("1+2", Prints("1+2")),
            ("2*3+4", Prints("2*3+4")),
            ("-1", Prints("-1")),
            ("x-1", Prints("x-1")),
            ("+/1 2", Prints("+/1 2")),
            ("a:1", Prints("a:1")),
            ("a::1", Prints("a::1")),
            ("f[1;2]", Prints("f.1 2")),
            ("f[]", Prints("f.,`")),
            ("#:x", Prints("#:x")),
            ("+[1;]", Prints("+[1;]")),
            ("$[a;b;c]", Prints("$[a;b;c]")),
            ("a;b", Prints("a;b")),
        ]);
    }

    #[test]
    fn test_errors() {
        run_parse_tests(vec![
            ("1+", SpecificError("noun expected following '+'")),
            ("a:", SpecificError("noun expected following ':'")),
            ("(1;2", SpecificError("')' expected")),
            ("1)", SpecificError("unexpected character ')'")),
            ("{[x;1] x}", Error),
        ]);
    }

    #[test]
    fn test_dangling_verb_inside_brackets_is_sticky() {
        let parsed = parse("(1+)").unwrap();
        assert_eq!(sticky_of(&parsed[0]), Some(0));
        let parsed = parse("f:2*1+").unwrap();
        match &parsed[0] {
            Value::NameRef(r) => assert_eq!(sticky_of(r.assign.as_ref().unwrap()), Some(1)),
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_parameter_inference() {
        let cases = vec![("{1}", 0), ("{x}", 1), ("{y}", 2), ("{x+z}", 3), ("{{y}}", 0)];
        for (src, arity) in cases {
            match &parse(src).unwrap()[0] {
                Value::Function(f) => assert_eq!(f.params.len(), arity, "{src}"),
                other => panic!("expected function, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_view_dependencies() {
        match &parse("v::a+b*c").unwrap()[0] {
            Value::View(v) => assert_eq!(v.dependencies(), vec!["a", "b", "c"]),
            other => panic!("expected view, got {other:?}"),
        }
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(MAX_PARSE_DEPTH + 1), ")".repeat(MAX_PARSE_DEPTH + 1));
        match parse(&deep) {
            Err(crate::Error::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::TooDeeplyNested),
            other => panic!("expected nesting error, got {other:?}"),
        }
    }

    #[test]
    fn test_long_verb_chain_limit() {
        let fits = format!("{}1", "1+".repeat(MAX_EXPR_DEPTH - 1));
        assert_eq!(parse(&fits).unwrap().len(), 1);

        let chain = format!("{}1", "1+".repeat(100_000));
        match parse(&chain) {
            Err(crate::Error::Parse(e)) => {
                assert_eq!(e.kind, ParseErrorKind::TooDeeplyNested);
                assert_eq!(
                    e.message,
                    format!("expression too deeply nested (max depth: {MAX_EXPR_DEPTH}).")
                );
            }
            other => panic!("expected nesting error, got {other:?}"),
        }
    }

    #[test]
    fn test_symbol_and_value_helpers() {
        assert_eq!(parse("`a").unwrap(), vec![sym("a")]);
        assert_eq!(parse("1 2").unwrap(), vec![val([1, 2])]);
    }
}
