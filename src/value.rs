//! The tagged value model shared by parsed syntax and runtime values.
//!
//! [`Value`] is a single closed sum type. Literals and aggregates (numbers,
//! chars, symbols, lists, dicts) are plain data; the remaining variants are
//! expression nodes (`NameRef`, `Verb`, `Adverb`, `Cond`, `Quote`, `View`) that
//! double as first-class runtime values. A verb with a missing operand, a
//! function literal bound to its environment, or a half-parsed verb chain are
//! all returned and stored like any other value, and print back as source.
//!
//! Two sentinels represent "null": the NaN number (`0N`) and the empty symbol.
//! Structural [`Value::matches`] treats NaN as equal to itself.
//!
//! Helper constructors [`val`], [`sym`] and [`kstr`] keep tests and
//! host code terse.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::Error;
use crate::env::Environment;

/// Core value type of the interpreter
#[derive(Clone)]
pub enum Value {
    /// Numbers; NaN is the numeric null
    Number(f64),
    /// A single character code point
    Char(u32),
    /// Symbols; the empty symbol is the second null sentinel
    Symbol(String),
    /// Heterogeneous lists; all-`Char` lists are strings
    List(Vec<Value>),
    Dict(Box<Dict>),
    Function(Box<Function>),
    /// Memoized formula cell; the `Rc` is shared by every copy so the cache
    /// survives lookups
    View(Rc<View>),
    NameRef(Box<NameRef>),
    Verb(Box<Verb>),
    Adverb(Box<Adverb>),
    Nil,
    /// `$[c;t;...;else]` condition/branch expressions
    Cond(Vec<Value>),
    /// Parenthesized verb used as a value
    Quote(Box<Value>),
}

/// Keys and values of a dictionary, always of equal length
#[derive(Clone, Default)]
pub struct Dict {
    keys: Vec<Value>,
    values: Vec<Value>,
}

impl Dict {
    pub fn new(keys: Vec<Value>, values: Vec<Value>) -> Result<Self, Error> {
        if keys.len() != values.len() {
            return Err(Error::length_mismatch());
        }
        Ok(Dict { keys, values })
    }

    pub fn keys(&self) -> &[Value] {
        &self.keys
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [Value] {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn position(&self, key: &Value) -> Option<usize> {
        self.keys.iter().position(|k| k.matches(key))
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.position(key).map(|i| &self.values[i])
    }

    pub(crate) fn get_mut(&mut self, key: &Value) -> Option<&mut Value> {
        self.position(key).map(move |i| &mut self.values[i])
    }

    /// Replace the value under `key`, appending the key if it is new
    pub fn set(&mut self, key: Value, value: Value) {
        match self.position(&key) {
            Some(i) => self.values[i] = value,
            None => {
                self.keys.push(key);
                self.values.push(value);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.keys.iter().zip(self.values.iter())
    }

    pub fn into_parts(self) -> (Vec<Value>, Vec<Value>) {
        (self.keys, self.values)
    }
}

/// A function literal or closure
#[derive(Clone)]
pub struct Function {
    pub params: Rc<[String]>,
    pub body: Rc<[Value]>,
    /// Partial-application slots; `Nil` marks an unfilled parameter
    pub curry: Option<Vec<Value>>,
    /// Captured environment; `None` for an unevaluated literal
    pub env: Option<Environment>,
    /// Pending argument expression from `{..} expr` juxtaposition
    pub arg: Option<Value>,
}

impl Function {
    pub fn new(params: Vec<String>, body: Vec<Value>) -> Self {
        Function {
            params: params.into(),
            body: body.into(),
            curry: None,
            env: None,
            arg: None,
        }
    }

    /// Parameter count minus already-filled partial-application slots
    pub fn valence(&self) -> usize {
        let filled = self
            .curry
            .iter()
            .flatten()
            .filter(|slot| !slot.is_null())
            .count();
        self.params.len().saturating_sub(filled)
    }
}

/// A named, memoized formula cell declared with `name::expr`
pub struct View {
    pub name: String,
    pub expr: Value,
    pub(crate) cache: RefCell<Option<Value>>,
    /// Last observed value of every free name of `expr`
    pub(crate) depends: RefCell<BTreeMap<String, Option<Value>>>,
}

impl View {
    pub fn new(name: String, expr: Value, names: impl IntoIterator<Item = String>) -> Self {
        View {
            name,
            expr,
            cache: RefCell::new(None),
            depends: RefCell::new(names.into_iter().map(|n| (n, None)).collect()),
        }
    }

    pub fn dependencies(&self) -> Vec<String> {
        self.depends.borrow().keys().cloned().collect()
    }
}

/// A reference to a name, optionally assigning to it
#[derive(Clone)]
pub struct NameRef {
    pub name: String,
    pub assign: Option<Value>,
    pub global: bool,
}

/// A verb node: primitive symbol plus whatever operands are already known
#[derive(Clone)]
pub struct Verb {
    pub symbol: String,
    /// Written with a trailing colon (`#:`), always applied monadically
    pub force_monad: bool,
    pub left: Option<Value>,
    pub right: Option<Value>,
    pub curry: Option<Vec<Value>>,
    /// Depth along the right-operand chain of the operand left unfilled
    pub sticky: Option<usize>,
}

impl Verb {
    pub fn new(symbol: impl Into<String>) -> Self {
        Verb {
            symbol: symbol.into(),
            force_monad: false,
            left: None,
            right: None,
            curry: None,
            sticky: None,
        }
    }

    pub fn infix(symbol: impl Into<String>, left: Option<Value>, right: Option<Value>) -> Self {
        Verb {
            left,
            right,
            ..Verb::new(symbol)
        }
    }

    pub fn curried(symbol: impl Into<String>, curry: Vec<Value>) -> Self {
        Verb {
            curry: Some(curry),
            ..Verb::new(symbol)
        }
    }
}

/// An adverb node: `verb` modified by `symbol`, with optional operands
#[derive(Clone)]
pub struct Adverb {
    pub symbol: String,
    pub verb: Value,
    pub left: Option<Value>,
    pub right: Option<Value>,
    pub sticky: Option<usize>,
}

impl Adverb {
    pub fn new(symbol: impl Into<String>, verb: Value) -> Self {
        Adverb {
            symbol: symbol.into(),
            verb,
            left: None,
            right: None,
            sticky: None,
        }
    }
}

impl Value {
    pub fn dict(keys: Vec<Value>, values: Vec<Value>) -> Result<Value, Error> {
        Ok(Value::Dict(Box::new(Dict::new(keys, values)?)))
    }

    pub fn empty_dict() -> Value {
        Value::Dict(Box::default())
    }

    pub fn empty_symbol() -> Value {
        Value::Symbol(String::new())
    }

    pub fn from_bool(b: bool) -> Value {
        Value::Number(if b { 1.0 } else { 0.0 })
    }

    /// A one-element list holding `x`
    pub fn enlist(x: Value) -> Value {
        Value::List(vec![x])
    }

    /// A single element stays itself; anything else becomes a list
    pub fn wrap(mut items: Vec<Value>) -> Value {
        if items.len() == 1 {
            items.swap_remove(0)
        } else {
            Value::List(items)
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Char(_) => "char",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Dict(_) => "dictionary",
            Value::Function(_) => "function",
            Value::View(_) => "view",
            Value::NameRef(_) => "reference",
            Value::Verb(_) => "verb",
            Value::Adverb(_) => "adverb",
            Value::Nil => "nil",
            Value::Cond(_) => "cond",
            Value::Quote(_) => "quote",
        }
    }

    /// Numeric type code reported by monadic `@`
    pub fn type_code(&self) -> f64 {
        match self {
            Value::Number(_) => -9.0,
            Value::Char(_) => -10.0,
            Value::Symbol(_) => -11.0,
            Value::List(_) => 0.0,
            Value::Dict(_) => 99.0,
            Value::Function(_) => 102.0,
            Value::Adverb(_) => 105.0,
            Value::Verb(_) => 107.0,
            _ => f64::NAN,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Value::Number(_) | Value::Char(_) | Value::Symbol(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Verb(_) | Value::Adverb(_))
    }

    /// `Some(items)` for lists
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn list(&self) -> Result<&[Value], Error> {
        self.as_list().ok_or_else(|| Error::expected("list", self))
    }

    pub fn as_dict(&self) -> Result<&Dict, Error> {
        match self {
            Value::Dict(d) => Ok(d),
            _ => Err(Error::expected("dictionary", self)),
        }
    }

    /// Numbers and chars coerce to a number; anything else is a type error
    pub fn number(&self) -> Result<f64, Error> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Char(c) => Ok(f64::from(*c)),
            _ => Err(Error::expected("number", self)),
        }
    }

    /// A non-negative integral number, as an index or count
    pub fn index(&self) -> Result<usize, Error> {
        let n = self.number()?;
        if n < 0.0 || n.fract() != 0.0 {
            return Err(Error::Domain(format!(
                "positive int expected, got {}.",
                crate::printer::format_number(n)
            )));
        }
        Ok(n as usize)
    }

    /// Element count: dict size, list length, or 1 for anything else
    pub fn count(&self) -> usize {
        match self {
            Value::Dict(d) => d.len(),
            Value::List(items) => items.len(),
            _ => 1,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_nan())
    }

    /// The empty symbol or `Nil`: an unfilled slot
    pub fn is_null(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::Symbol(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Any null sentinel, including `0N`
    pub fn is_nullish(&self) -> bool {
        self.is_null() || self.is_nan()
    }

    /// All-`Char` list (vacuously true for the empty list)
    pub fn is_string(&self) -> bool {
        match self {
            Value::List(items) => items.iter().all(|v| matches!(v, Value::Char(_))),
            _ => false,
        }
    }

    /// A condition is false only if it is `()` or the number 0
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::List(items) => items.is_empty(),
            Value::Number(n) => *n == 0.0,
            _ => false,
        }
    }

    /// The text of a char or char list
    pub fn text(&self) -> Result<String, Error> {
        let chars = match self {
            Value::Char(c) => vec![*c],
            Value::List(items) => items
                .iter()
                .map(|v| match v {
                    Value::Char(c) => Ok(*c),
                    other => Err(Error::expected("char", other)),
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(Error::expected("string", other)),
        };
        Ok(chars
            .into_iter()
            .map(|c| char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect())
    }

    /// First element: dict values, list head, `()` for empty, or the atom itself
    pub fn first(&self) -> Value {
        match self {
            Value::Dict(d) => Value::List(d.values().to_vec()).first(),
            Value::List(items) => items.first().cloned().unwrap_or(Value::List(Vec::new())),
            other => other.clone(),
        }
    }

    /// Structural equality: same variant, same shape, NaN equals NaN
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => all_match(a, b),
            (Value::Dict(a), Value::Dict(b)) => {
                all_match(a.keys(), b.keys()) && all_match(a.values(), b.values())
            }
            (Value::Function(a), Value::Function(b)) => {
                a.params == b.params
                    && (Rc::ptr_eq(&a.body, &b.body) || all_match(&a.body, &b.body))
                    && option_list_match(&a.curry, &b.curry)
            }
            (Value::View(a), Value::View(b)) => {
                Rc::ptr_eq(a, b) || (a.name == b.name && a.expr.matches(&b.expr))
            }
            (Value::NameRef(a), Value::NameRef(b)) => {
                a.name == b.name && a.global == b.global && option_match(&a.assign, &b.assign)
            }
            (Value::Verb(a), Value::Verb(b)) => {
                a.symbol == b.symbol
                    && a.force_monad == b.force_monad
                    && option_match(&a.left, &b.left)
                    && option_match(&a.right, &b.right)
                    && option_list_match(&a.curry, &b.curry)
            }
            (Value::Adverb(a), Value::Adverb(b)) => {
                a.symbol == b.symbol
                    && a.verb.matches(&b.verb)
                    && option_match(&a.left, &b.left)
                    && option_match(&a.right, &b.right)
            }
            (Value::Nil, Value::Nil) => true,
            (Value::Cond(a), Value::Cond(b)) => all_match(a, b),
            (Value::Quote(a), Value::Quote(b)) => a.matches(b),
            _ => false,
        }
    }
}

fn all_match(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.matches(y))
}

fn option_match(a: &Option<Value>, b: &Option<Value>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x.matches(y),
        (None, None) => true,
        _ => false,
    }
}

fn option_list_match(a: &Option<Vec<Value>>, b: &Option<Vec<Value>>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => all_match(x, y),
        (None, None) => true,
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Char(c) => write!(f, "Char({c})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Dict(d) => f
                .debug_map()
                .entries(d.keys().iter().zip(d.values()))
                .finish(),
            other => write!(f, "{}({other})", other.type_name()),
        }
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::from_bool(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(u32::from(c))
    }
}

/// Strings convert to char lists, even when they are one character long
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::List(s.chars().map(Value::from).collect())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::from(s.as_str())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Helper for building values in code and tests: `val(1)`, `val([1, 2, 3])`
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// A symbol value
pub fn sym(name: &str) -> Value {
    Value::Symbol(name.to_owned())
}

/// A string as the parser reads it: one character is a char atom
pub fn kstr(s: &str) -> Value {
    Value::wrap(s.chars().map(Value::from).collect())
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;

    #[test]
    fn test_match_semantics() {
        let cases: Vec<(Value, Value, bool)> = vec![
            (val(1), val(1), true),
            (val(f64::NAN), val(f64::NAN), true),
            (val(1), val('a'), false),
            (val([1, 2]), val([1, 2]), true),
            (val([1, 2]), val([1, 2, 3]), false),
            (sym(""), sym(""), true),
            (sym("a"), sym("b"), false),
            (Value::Nil, Value::Nil, true),
            (Value::Nil, sym(""), false),
            (val("ab"), val(vec!['a', 'b']), true),
            (kstr("a"), val('a'), true),
            (val(Vec::<Value>::new()), val(""), true),
        ];
        for (a, b, expected) in cases {
            assert_eq!(a.matches(&b), expected, "match({a:?}, {b:?})");
        }
    }

    #[test]
    fn test_null_predicates() {
        assert!(Value::Nil.is_null());
        assert!(sym("").is_null());
        assert!(!val(f64::NAN).is_null());
        assert!(val(f64::NAN).is_nullish());
        assert!(!val(0).is_nullish());
    }

    #[test]
    fn test_dict_set_and_get() {
        let mut d = Dict::new(vec![sym("a")], vec![val(1)]).unwrap();
        d.set(sym("b"), val(2));
        d.set(sym("a"), val(3));
        assert_eq!(d.keys(), &[sym("a"), sym("b")]);
        assert_eq!(d.get(&sym("a")), Some(&val(3)));
        assert_eq!(d.get(&sym("c")), None);
        assert!(Dict::new(vec![sym("a")], vec![]).is_err());
    }

    #[test]
    fn test_function_valence_counts_unfilled_slots() {
        let mut f = Function::new(vec!["x".into(), "y".into()], vec![]);
        assert_eq!(f.valence(), 2);
        f.curry = Some(vec![val(1), Value::Nil]);
        assert_eq!(f.valence(), 1);
    }

    #[test]
    fn test_index_rejects_negative_and_fractional() {
        assert_eq!(val(3).index().unwrap(), 3);
        assert!(val(-1).index().is_err());
        assert!(val(1.5).index().is_err());
        assert!(sym("a").index().is_err());
    }
}
