//! The primitive verb registry.
//!
//! Every primitive symbol maps to eight shape slots. The evaluator picks the
//! slot from the operands it has: atom or list right operand for monads, the
//! four atom/list combinations for dyads, and three or four bracket
//! arguments for the n-ary forms. An empty slot is a domain error.
//!
//! Several verbs are written in the language itself ([`Helper`]); the
//! interpreter parses those once and calls them like user functions.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::debug;

use crate::Error;
use crate::adverbs::each_monadic;
use crate::atomic::{self, atomic_dyad, atomic_monad, right_atomic};
use crate::env::Environment;
use crate::evaluator::Interpreter;
use crate::printer;
use crate::value::Value;

pub type Monad = fn(&Interpreter, &Value, &Environment) -> Result<Value, Error>;
pub type Dyad = fn(&Interpreter, &Value, &Value, &Environment) -> Result<Value, Error>;
pub type Nary = fn(&Interpreter, &[Value], &Environment) -> Result<Value, Error>;

/// Operand shape selecting one implementation of a verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    AtomMonad,
    ListMonad,
    AtomAtom,
    ListAtom,
    AtomList,
    ListList,
    Triad,
    Tetrad,
}

#[derive(Clone, Copy)]
pub enum Primitive {
    Monad(Monad),
    Dyad(Dyad),
    Nary(Nary),
}

/// One verb symbol and its slot table
pub struct VerbDef {
    pub symbol: &'static str,
    slots: [Option<Primitive>; 8],
}

impl VerbDef {
    fn new(symbol: &'static str, slots: [Option<Primitive>; 8]) -> Self {
        VerbDef { symbol, slots }
    }

    pub fn get(&self, slot: Slot) -> Option<Primitive> {
        self.slots[slot as usize]
    }
}

impl std::fmt::Debug for VerbDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filled: Vec<bool> = self.slots.iter().map(Option::is_some).collect();
        f.debug_struct("VerbDef")
            .field("symbol", &self.symbol)
            .field("slots", &filled)
            .finish()
    }
}

/// Verbs defined as source in the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Helper {
    Pack,
    Unpack,
    Splice,
    Window,
    Odometer,
    Split,
}

impl Helper {
    pub(crate) const ALL: [Helper; 6] = [
        Helper::Pack,
        Helper::Unpack,
        Helper::Splice,
        Helper::Window,
        Helper::Odometer,
        Helper::Split,
    ];

    pub(crate) fn source(self) -> &'static str {
        match self {
            Helper::Pack => "{+/y*|*\\1,|1_(#y)#x}",
            Helper::Unpack => "{(1_r,,y)-x*r:|y(_%)\\|x}",
            Helper::Splice => "{,/(*x;$[99<@z;z x 1;z];*|x:(0,y)_x)}",
            Helper::Window => "{$[0>x;3':0,y,0;y(!0|1+(#y)-x)+\\:!x]}",
            Helper::Odometer => "{+x\\'!*/x}",
            Helper::Split => "{1_'(&x=y)_y:x,y}",
        }
    }
}

// =================================================================
// SCALAR PRIMITIVES
// =================================================================

macro_rules! atomic_monad {
    ($name:ident, |$x:ident| $body:expr) => {
        fn $name(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
            atomic_monad(x, &|$x: &Value| -> Result<Value, Error> { $body })
        }
    };
}

macro_rules! atomic_dyad {
    ($name:ident, |$x:ident, $y:ident| $body:expr) => {
        fn $name(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
            atomic_dyad(x, y, &|$x: &Value, $y: &Value| -> Result<Value, Error> { $body })
        }
    };
}

/// An atomic dyad over the numeric values of both operands
macro_rules! arithmetic {
    ($name:ident, |$a:ident, $b:ident| $body:expr) => {
        atomic_dyad!($name, |x, y| {
            let ($a, $b) = (x.number()?, y.number()?);
            Ok(Value::Number($body))
        });
    };
}

atomic_monad!(negate, |x| Ok(Value::Number(-x.number()?)));
atomic_monad!(sqrt, |x| Ok(Value::Number(x.number()?.sqrt())));
atomic_monad!(not, |x| Ok(Value::from_bool(x.number()? == 0.0)));
atomic_monad!(nullish_each, |x| Ok(Value::from_bool(x.is_nullish())));
atomic_monad!(floor, |x| match x {
    Value::Char(c) => Ok(Value::Char(lowercase(*c))),
    other => Ok(Value::Number(other.number()?.floor())),
});

arithmetic!(plus, |a, b| a + b);
arithmetic!(minus, |a, b| a - b);
arithmetic!(times, |a, b| a * b);
arithmetic!(divide, |a, b| a / b);
arithmetic!(min, |a, b| if a.is_nan() || b.is_nan() { f64::NAN } else { a.min(b) });

atomic_dyad!(max, |x, y| {
    if x.is_nan() {
        return Ok(y.clone());
    }
    if y.is_nan() {
        return Ok(x.clone());
    }
    Ok(Value::Number(x.number()?.max(y.number()?)))
});
atomic_dyad!(less, |x, y| Ok(Value::from_bool(atomic::less(x, y)?)));
atomic_dyad!(more, |x, y| Ok(Value::from_bool(atomic::more(x, y)?)));
atomic_dyad!(equal, |x, y| Ok(Value::from_bool(atomic::equal(x, y))));
atomic_dyad!(fill, |x, y| Ok(if y.is_nullish() { x.clone() } else { y.clone() }));

fn lowercase(c: u32) -> u32 {
    char::from_u32(c)
        .and_then(|ch| ch.to_lowercase().next())
        .map_or(c, u32::from)
}

/// `x!y` on atoms: modulus for a positive `x`, integer division otherwise
fn modulo(x: &Value, y: &Value) -> Result<Value, Error> {
    let (m, n) = (x.number()?, y.number()?);
    Ok(Value::Number(if m > 0.0 {
        atomic::floor_mod(n, m)
    } else {
        (n / -m).floor()
    }))
}

fn mod_atom(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    modulo(x, y)
}

fn mod_each(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    right_atomic(x, y, &modulo)
}

// =================================================================
// STRUCTURAL MONADS
// =================================================================

fn ident(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    Ok(x.clone())
}

fn rident(_: &Interpreter, _: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    Ok(y.clone())
}

/// Transpose, padding short rows by cycling
pub(crate) fn flip(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    let Value::List(items) = x else {
        return Ok(Value::enlist(Value::enlist(x.clone())));
    };
    let width = items.iter().map(Value::count).max().unwrap_or(0);
    let rows = items
        .iter()
        .map(|item| atomic::take(width as f64, item).map(items_of))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::List(
        (0..width)
            .map(|z| Value::List(rows.iter().map(|row| row[z].clone()).collect()))
            .collect(),
    ))
}

fn first(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    Ok(x.first())
}

/// `!n`: `0..n`, or `n..0` counting up from a negative `n`; keys of a dict
fn iota(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    if let Value::Dict(d) = x {
        return Ok(Value::List(d.keys().to_vec()));
    }
    let n = x.number()?;
    if !n.is_finite() {
        return Err(Error::domain());
    }
    let base = if n < 0.0 { n } else { 0.0 };
    let count = atomic::length(n)?;
    Ok(Value::List(
        (0..count).map(|z| Value::Number(base + z as f64)).collect(),
    ))
}

fn odometer(interp: &Interpreter, x: &Value, env: &Environment) -> Result<Value, Error> {
    interp.call_helper(Helper::Odometer, vec![x.clone()], env)
}

fn where_(interp: &Interpreter, x: &Value, env: &Environment) -> Result<Value, Error> {
    match x {
        Value::Dict(d) => {
            let indices = Value::List(atomic::where_counts(d.values())?);
            interp.subscr(&Value::List(d.keys().to_vec()), &indices, env)
        }
        Value::List(items) => Ok(Value::List(atomic::where_counts(items)?)),
        other => Ok(Value::List(atomic::where_counts(std::slice::from_ref(other))?)),
    }
}

fn reverse(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    atomic::reverse(x)
}

fn asc(interp: &Interpreter, x: &Value, env: &Environment) -> Result<Value, Error> {
    grade(interp, x, false, env)
}

fn desc(interp: &Interpreter, x: &Value, env: &Environment) -> Result<Value, Error> {
    grade(interp, x, true, env)
}

/// Stable sort permutation. Strings order as symbols; a dict grades its
/// values and returns keys.
fn grade(
    interp: &Interpreter,
    x: &Value,
    descending: bool,
    env: &Environment,
) -> Result<Value, Error> {
    if let Value::Dict(d) = x {
        let order = grade(interp, &Value::List(d.values().to_vec()), descending, env)?;
        return interp.subscr(&Value::List(d.keys().to_vec()), &order, env);
    }
    let items = x.as_list().unwrap_or(std::slice::from_ref(x));
    let keys = items
        .iter()
        .map(|v| match v {
            Value::List(_) if v.is_string() => v.text().map(Value::Symbol),
            other => {
                check_sortable(other)?;
                Ok(other.clone())
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| {
        let ordering = sort_order(&keys[a], &keys[b]);
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
    Ok(Value::List(
        order.into_iter().map(|i| Value::Number(i as f64)).collect(),
    ))
}

fn check_sortable(x: &Value) -> Result<(), Error> {
    match x {
        Value::List(items) => items.iter().try_for_each(check_sortable),
        _ if x.is_atom() => Ok(()),
        _ => Err(Error::domain()),
    }
}

/// Total order for grading: nulls first, numbers and chars by value, then
/// symbols by text; lists shorter first, then element by element.
fn sort_order(x: &Value, y: &Value) -> Ordering {
    match (x, y) {
        (Value::List(a), Value::List(b)) => a.len().cmp(&b.len()).then_with(|| {
            a.iter()
                .zip(b)
                .map(|(p, q)| sort_order(p, q))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        }),
        (Value::List(_), _) => Ordering::Greater,
        (_, Value::List(_)) => Ordering::Less,
        (Value::Symbol(a), Value::Symbol(b)) => a.cmp(b),
        (Value::Symbol(_), _) => Ordering::Greater,
        (_, Value::Symbol(_)) => Ordering::Less,
        _ => {
            let (a, b) = (x.number().unwrap_or(f64::NAN), y.number().unwrap_or(f64::NAN));
            match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            }
        }
    }
}

fn identity_matrix(interp: &Interpreter, x: &Value, env: &Environment) -> Result<Value, Error> {
    let range = iota(interp, x, env)?;
    let items = range.list()?;
    atomic::check_length(items.len().saturating_mul(items.len()))?;
    Ok(Value::List(
        items
            .iter()
            .map(|z| {
                Value::List(
                    items
                        .iter()
                        .map(|w| Value::from_bool(atomic::equal(z, w)))
                        .collect(),
                )
            })
            .collect(),
    ))
}

/// `=x`: each distinct item mapped to the indices where it occurs
fn group(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    let items = x.list()?;
    let keys = atomic::unique(items);
    let mut buckets: Vec<Vec<Value>> = vec![Vec::new(); keys.len()];
    for (i, item) in items.iter().enumerate() {
        if let Some(k) = keys.iter().position(|key| key.matches(item)) {
            buckets[k].push(Value::Number(i as f64));
        }
    }
    Value::dict(keys, buckets.into_iter().map(Value::List).collect())
}

fn enlist(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    Ok(Value::enlist(x.clone()))
}

fn nullish(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    Ok(Value::from_bool(x.is_nullish()))
}

fn count(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    Ok(Value::Number(x.count() as f64))
}

/// The printed form of an atom as a string; lists are returned unchanged
fn format_value(x: &Value) -> Value {
    match x {
        Value::List(_) => x.clone(),
        other => Value::from(printer::format(other, true)),
    }
}

fn format_atom(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    Ok(format_value(x))
}

fn format_each(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    atomic::string_atomic_monad(x, &|v: &Value| Ok(format_value(v)))
}

fn random_floats(interp: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    let n = x.number()?;
    if !n.is_finite() {
        return Err(Error::domain());
    }
    let count = atomic::length(n.max(0.0))?;
    Ok(Value::List(
        (0..count).map(|_| Value::Number(interp.random())).collect(),
    ))
}

fn unique(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    Ok(Value::List(atomic::unique(x.list()?)))
}

fn type_of(_: &Interpreter, x: &Value, _: &Environment) -> Result<Value, Error> {
    Ok(Value::Number(x.type_code()))
}

/// `.x`: a function's local bindings, a dict's values, a global by symbol,
/// or the result of evaluating a string
fn k_eval(interp: &Interpreter, x: &Value, env: &Environment) -> Result<Value, Error> {
    match x {
        Value::Function(f) => Ok(f
            .env
            .as_ref()
            .map_or_else(Value::empty_dict, Environment::to_dict)),
        Value::Dict(d) => Ok(Value::List(d.values().to_vec())),
        Value::Symbol(name) => interp.lookup(env, name, true),
        _ => {
            let source = x.text()?;
            let mut result = Value::Nil;
            for statement in interp.parse(&source)? {
                result = interp.run(&statement, env)?;
            }
            Ok(result)
        }
    }
}

// =================================================================
// STRUCTURAL DYADS
// =================================================================

/// List items, or a lone value as a one-item vector
fn items_of(x: Value) -> Vec<Value> {
    match x {
        Value::List(items) => items,
        other => vec![other],
    }
}

fn match_(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    Ok(Value::from_bool(x.matches(y)))
}

fn concat(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    Ok(atomic::concat(x, y))
}

fn make_dict(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    Value::dict(x.list()?.to_vec(), y.list()?.to_vec())
}

fn except_items(x: &[Value], y: &Value) -> Vec<Value> {
    let remove = y.as_list().unwrap_or(std::slice::from_ref(y));
    x.iter()
        .filter(|v| atomic::find_equal(remove, v).is_nan())
        .cloned()
        .collect()
}

fn except(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    Ok(Value::List(except_items(x.list()?, y)))
}

/// Select from `y` by `keep`; dicts stay dicts
fn filter(interp: &Interpreter, y: &Value, keep: Value, env: &Environment) -> Result<Value, Error> {
    let selected = interp.subscr(y, &keep, env)?;
    match y {
        Value::Dict(_) => Value::dict(items_of(keep), items_of(selected)),
        _ => Ok(selected),
    }
}

fn take(interp: &Interpreter, x: &Value, y: &Value, env: &Environment) -> Result<Value, Error> {
    if x.is_callable() {
        let mask = each_monadic(interp, x, y, env)?;
        let keep = where_(interp, &mask, env)?;
        return filter(interp, y, keep, env);
    }
    if let Value::Dict(d) = y {
        let keys = take(interp, x, &Value::List(d.keys().to_vec()), env)?;
        let values = take(interp, x, &Value::List(d.values().to_vec()), env)?;
        return Value::dict(items_of(keys), items_of(values));
    }
    atomic::take(x.number()?, y)
}

fn drop(interp: &Interpreter, x: &Value, y: &Value, env: &Environment) -> Result<Value, Error> {
    if x.is_callable() {
        let mask = each_monadic(interp, x, y, env)?;
        let inverted = not(interp, &mask, env)?;
        let keep = where_(interp, &inverted, env)?;
        return filter(interp, y, keep, env);
    }
    if let Value::Dict(d) = y {
        let keys = drop(interp, x, &Value::List(d.keys().to_vec()), env)?;
        let values = drop(interp, x, &Value::List(d.values().to_vec()), env)?;
        return Value::dict(items_of(keys), items_of(values));
    }
    if !y.is_list() || y.count() == 0 {
        return Ok(y.clone());
    }
    Ok(atomic::drop(x.number()?, y))
}

/// `keys _ dict`: the dict without those keys
fn dict_drop(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    let d = y.as_dict()?;
    let keys = except_items(d.keys(), x);
    let values = keys
        .iter()
        .map(|k| d.get(k).cloned().unwrap_or(Value::Number(f64::NAN)))
        .collect();
    Value::dict(keys, values)
}

fn cut(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    atomic::cut(x.list()?, y.list()?).map(Value::List)
}

/// `shape#y`. A leading `0N` splits into rows of the trailing length; a
/// trailing `0N` splits into that many rows; otherwise `y` is cycled into
/// the nested shape.
fn reshape(interp: &Interpreter, x: &Value, y: &Value, env: &Environment) -> Result<Value, Error> {
    if let Value::Dict(_) = y {
        let values = interp.subscr(y, x, env)?;
        return Value::dict(x.list()?.to_vec(), items_of(values));
    }
    let shape = x.list()?;
    let (Some(a), Some(b)) = (shape.first(), shape.last()) else {
        return Err(Error::domain());
    };
    let items = items_of(y.clone());
    let len = items.len() as f64;
    if a.is_nan() {
        if items.is_empty() {
            return Ok(Value::List(items));
        }
        let step = b.number()?;
        if !(step > 0.0) || !step.is_finite() {
            return Err(Error::domain());
        }
        let rows = atomic::length(len / step)?;
        let cuts: Vec<Value> = (0..rows).map(|z| Value::Number(z as f64 * step)).collect();
        return atomic::cut(&cuts, &items).map(Value::List);
    }
    if b.is_nan() {
        let rows = atomic::check_length(a.index()?)?;
        let cuts: Vec<Value> = (0..rows)
            .map(|z| Value::Number((z as f64 * len / rows as f64).floor()))
            .collect();
        return atomic::cut(&cuts, &items).map(Value::List);
    }
    let dims = shape.iter().map(Value::index).collect::<Result<Vec<_>, _>>()?;
    let mut cells = 1usize;
    for &d in &dims {
        cells = atomic::check_length(cells.saturating_mul(d))?;
    }
    let pool = if items.is_empty() { vec![y.clone()] } else { items };
    let mut cursor = 0;
    Ok(reshape_fill(&dims, &pool, &mut cursor))
}

fn reshape_fill(dims: &[usize], pool: &[Value], cursor: &mut usize) -> Value {
    let Some((&n, rest)) = dims.split_first() else {
        return Value::List(Vec::new());
    };
    Value::List(
        (0..n)
            .map(|_| {
                if rest.is_empty() {
                    let item = pool[*cursor % pool.len()].clone();
                    *cursor += 1;
                    item
                } else {
                    reshape_fill(rest, pool, cursor)
                }
            })
            .collect(),
    )
}

/// `x$y`: symbol casts, string padding and string-to-symbol conversion
fn dollar(x: &Value, y: &Value) -> Result<Value, Error> {
    match (x, y) {
        (Value::Symbol(s), Value::List(items)) if s.is_empty() => {
            if y.is_string() {
                Ok(Value::Symbol(y.text()?))
            } else {
                atomic::map_items(items, |v| dollar(x, v)).map(Value::List)
            }
        }
        (Value::List(a), Value::List(b)) => atomic::zip_items(a, b, dollar).map(Value::List),
        (Value::List(a), _) => atomic::map_items(a, |v| dollar(v, y)).map(Value::List),
        (_, Value::List(items)) if matches!(x, Value::Symbol(_)) || !y.is_string() => {
            atomic::map_items(items, |v| dollar(x, v)).map(Value::List)
        }
        (Value::Symbol(cast), _) => cast_atom(cast, y),
        (_, Value::Char(_)) => Ok(y.clone()),
        _ => pad(x.number()?, y),
    }
}

fn cast_atom(cast: &str, y: &Value) -> Result<Value, Error> {
    match cast {
        "b" => Ok(Value::Number(((y.number()? as i64) & 1) as f64)),
        "i" => {
            let n = y.number()?;
            let truncated = if n.is_finite() { n.trunc() as i64 as i32 } else { 0 };
            Ok(Value::Number(f64::from(truncated)))
        }
        "f" => Ok(Value::Number(y.number()?)),
        "c" => Ok(Value::Char(y.number()? as u32)),
        "" => match y {
            Value::Char(_) => Ok(Value::Symbol(y.text()?)),
            Value::Symbol(_) => Ok(y.clone()),
            other => Err(Error::expected("string", other)),
        },
        _ => Err(Error::Domain(format!("unknown cast '{cast}'."))),
    }
}

/// Pad with spaces or truncate to `|width|`; positive widths keep the front.
fn pad(width: f64, y: &Value) -> Result<Value, Error> {
    if !width.is_finite() {
        return Err(Error::domain());
    }
    let mut items = y.list()?.to_vec();
    let target = atomic::length(width.trunc())?;
    let space = Value::Char(u32::from(' '));
    if width > 0.0 {
        items.resize(target, space);
    } else if items.len() > target {
        items.drain(..items.len() - target);
    } else {
        let mut padded = vec![space; target - items.len()];
        padded.append(&mut items);
        items = padded;
    }
    Ok(Value::List(items))
}

fn dollar_verb(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    dollar(x, y)
}

/// `x?y`: random draws, deals, random letters, or a reverse dict lookup
fn rnd(interp: &Interpreter, x: &Value, y: &Value, env: &Environment) -> Result<Value, Error> {
    match (x, y) {
        (Value::Dict(d), _) => {
            let values = Value::List(d.values().to_vec());
            let found = right_atomic(&values, y, &|v: &Value, k: &Value| {
                Ok(atomic::find_equal(v.list()?, k))
            })?;
            interp.subscr(&Value::List(d.keys().to_vec()), &found, env)
        }
        (_, Value::Char(c)) => {
            let letters = Value::List((0..26).map(|i| Value::Number(f64::from(c + i))).collect());
            let picked = rnd(interp, x, &letters, env)?;
            dollar(&Value::Symbol("c".into()), &picked)
        }
        (_, Value::List(items)) => {
            let picks = rnd(interp, x, &Value::Number(items.len() as f64), env)?;
            interp.subscr(y, &picks, env)
        }
        _ => {
            let range = y.index()?;
            let n = x.number()?;
            if !n.is_finite() {
                return Err(Error::domain());
            }
            if n < 0.0 {
                atomic::check_length(range)?;
                if -n > range as f64 {
                    return Err(Error::Length("length error.".into()));
                }
                let mut keyed: Vec<(f64, usize)> =
                    (0..range).map(|i| (interp.random(), i)).collect();
                keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
                let deck = Value::List(
                    keyed
                        .into_iter()
                        .map(|(_, i)| Value::Number(i as f64))
                        .collect(),
                );
                return atomic::take(n, &deck);
            }
            let draws = atomic::length(n.max(0.0))?;
            Ok(Value::List(
                (0..draws)
                    .map(|_| Value::Number((interp.random() * range as f64).floor()))
                    .collect(),
            ))
        }
    }
}

fn find_first(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    Ok(atomic::find_equal(x.list()?, y))
}

fn find_each(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    right_atomic(x, y, &|items: &Value, v: &Value| {
        Ok(atomic::find_equal(items.list()?, v))
    })
}

fn subscr(interp: &Interpreter, x: &Value, y: &Value, env: &Environment) -> Result<Value, Error> {
    interp.subscr(x, y, env)
}

fn call(interp: &Interpreter, x: &Value, y: &Value, env: &Environment) -> Result<Value, Error> {
    interp.call(x, y, env)
}

/// Index of the last item of sorted `x` not greater than `y`, or -1
fn binsearch(x: &Value, y: &Value) -> Result<Value, Error> {
    let items = x.list()?;
    if items.is_empty() || atomic::less(y, &items[0])? {
        return Ok(Value::Number(-1.0));
    }
    let (mut lo, mut hi) = (0, items.len());
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if atomic::more(&items[mid], y)? {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Ok(Value::Number(lo as f64))
}

fn bin(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    binsearch(x, y)
}

fn bin_each(_: &Interpreter, x: &Value, y: &Value, _: &Environment) -> Result<Value, Error> {
    right_atomic(x, y, &binsearch)
}

/// `sep/strings`: concatenate with a separator between items
fn join(x: &Value, y: &Value) -> Result<Value, Error> {
    let Some((head, rest)) = y.list()?.split_first() else {
        return Ok(Value::List(Vec::new()));
    };
    Ok(rest.iter().fold(head.clone(), |acc, item| {
        atomic::concat(&acc, &atomic::concat(x, item))
    }))
}

fn pack(interp: &Interpreter, x: &Value, y: &Value, env: &Environment) -> Result<Value, Error> {
    match x {
        Value::Char(_) => join(x, y),
        _ => interp.call_helper(Helper::Pack, vec![x.clone(), y.clone()], env),
    }
}

fn unpack(interp: &Interpreter, x: &Value, y: &Value, env: &Environment) -> Result<Value, Error> {
    interp.call_helper(Helper::Unpack, vec![x.clone(), y.clone()], env)
}

fn split(interp: &Interpreter, x: &Value, y: &Value, env: &Environment) -> Result<Value, Error> {
    match x {
        Value::Char(_) => interp.call_helper(Helper::Split, vec![x.clone(), y.clone()], env),
        _ => unpack(interp, x, y, env),
    }
}

fn window(interp: &Interpreter, x: &Value, y: &Value, env: &Environment) -> Result<Value, Error> {
    interp.call_helper(Helper::Window, vec![x.clone(), y.clone()], env)
}

// =================================================================
// N-ARY FORMS
// =================================================================

fn splice(interp: &Interpreter, args: &[Value], env: &Environment) -> Result<Value, Error> {
    interp.call_helper(Helper::Splice, args.to_vec(), env)
}

/// `@[d;i;f]`, `@[d;i;f;y]`: amend top-level items
fn amend(interp: &Interpreter, args: &[Value], env: &Environment) -> Result<Value, Error> {
    mend(interp, args, false, env)
}

/// `.[f;args;handler]` traps errors; `.[d;path;f]` is a deep amend
fn dot_triad(interp: &Interpreter, args: &[Value], env: &Environment) -> Result<Value, Error> {
    match args.first() {
        Some(f) if f.is_callable() => trap(interp, args, env),
        _ => mend(interp, args, true, env),
    }
}

fn deep_amend(interp: &Interpreter, args: &[Value], env: &Environment) -> Result<Value, Error> {
    mend(interp, args, true, env)
}

/// Call `args[0]` on the list `args[1]`: `(0;result)` on success,
/// `(1;"message")` on any error.
fn trap(interp: &Interpreter, args: &[Value], env: &Environment) -> Result<Value, Error> {
    let [f, arguments, ..] = args else {
        return Err(Error::Valence);
    };
    let outcome = arguments
        .list()
        .and_then(|_| interp.call(f, arguments, env));
    Ok(match outcome {
        Ok(value) => Value::List(vec![Value::Number(0.0), value]),
        Err(e) => {
            debug!(error = %e, "trapped error");
            Value::List(vec![Value::Number(1.0), Value::from(e.to_string())])
        }
    })
}

/// Amend a copy of `args[0]` (or of the global named by a symbol, writing
/// the result back and returning the symbol).
fn mend(interp: &Interpreter, args: &[Value], deep: bool, env: &Environment) -> Result<Value, Error> {
    let [target, index, f, rest @ ..] = args else {
        return Err(Error::Valence);
    };
    let y = rest.first();
    let global = match target {
        Value::Symbol(name) => Some(name),
        _ => None,
    };
    let mut data = match global {
        Some(name) => interp.lookup(env, name, true)?,
        None => target.clone(),
    };
    let editor = Amend { interp, f, env };
    if deep {
        editor.at_path(&mut data, index, y)?;
    } else {
        editor.at(&mut data, index, y)?;
    }
    match global {
        Some(name) => {
            env.put(name, true, data);
            Ok(target.clone())
        }
        None => Ok(data),
    }
}

/// One amend operation: the function applied at every selected slot
struct Amend<'a> {
    interp: &'a Interpreter,
    f: &'a Value,
    env: &'a Environment,
}

impl Amend<'_> {
    /// Replace `d[i]` with `f d[i]` or `f[d[i];y]`; a list `i` amends each
    /// item, pairing with items of a list `y`.
    fn at(&self, d: &mut Value, i: &Value, y: Option<&Value>) -> Result<(), Error> {
        if let Value::List(indices) = i {
            for (k, index) in indices.iter().enumerate() {
                let yk = match y {
                    Some(Value::List(ys)) => Some(ys.get(k).ok_or_else(Error::length_mismatch)?),
                    other => other,
                };
                self.at(d, index, yk)?;
            }
            return Ok(());
        }
        let current = self.interp.subscr(d, i, self.env)?;
        let updated = match (y, self.f) {
            (Some(y), f) => self.interp.apply_dyad(f, &current, y, self.env)?,
            (None, Value::Number(_) | Value::Char(_)) => self.f.clone(),
            (None, f) => self.interp.apply_monad(f, &current, self.env)?,
        };
        store(d, i, updated)
    }

    /// Amend along a path of indices, one per nesting level. A `Nil` or
    /// empty-symbol level selects every item; a list level selects several.
    fn at_path(&self, d: &mut Value, path: &Value, y: Option<&Value>) -> Result<(), Error> {
        let Value::List(levels) = path else {
            return self.at(d, path, y);
        };
        let (head, tail) = match levels.as_slice() {
            [] => return Ok(()),
            [only] => return self.at_path(d, only, y),
            [head, tail @ ..] => (head, Value::List(tail.to_vec())),
        };
        if let Value::List(heads) = head {
            for (k, h) in heads.iter().enumerate() {
                let child = slot_mut(d, h)?;
                self.at_path(child, &tail, spread(y, k, heads.len()))?;
            }
            return Ok(());
        }
        if head.is_null() {
            let children: Vec<&mut Value> = match d {
                Value::List(items) => items.iter_mut().collect(),
                Value::Dict(dict) => dict.values_mut().iter_mut().collect(),
                other => return Err(Error::expected("list", other)),
            };
            let n = children.len();
            for (k, child) in children.into_iter().enumerate() {
                self.at_path(child, &tail, spread(y, k, n))?;
            }
            return Ok(());
        }
        let flat = matches!(&*d, Value::List(items) if !items.first().is_some_and(Value::is_list));
        if flat || !self.interp.subscr(d, head, self.env)?.is_list() {
            return self.at(d, path, y);
        }
        self.at_path(slot_mut(d, head)?, &tail, y)
    }
}

/// The `k`th of `n` items of a conforming list `y`, else `y` itself
fn spread(y: Option<&Value>, k: usize, n: usize) -> Option<&Value> {
    match y {
        Some(Value::List(ys)) if ys.len() == n => ys.get(k),
        other => other,
    }
}

fn slot_mut<'a>(d: &'a mut Value, i: &Value) -> Result<&'a mut Value, Error> {
    match d {
        Value::List(items) => {
            let n = i.index()?;
            items.get_mut(n).ok_or_else(Error::out_of_bounds)
        }
        Value::Dict(dict) => dict.get_mut(i).ok_or_else(Error::out_of_bounds),
        other => Err(Error::expected("list", other)),
    }
}

fn store(d: &mut Value, i: &Value, value: Value) -> Result<(), Error> {
    if let Value::Dict(dict) = d {
        dict.set(i.clone(), value);
    } else {
        *slot_mut(d, i)? = value;
    }
    Ok(())
}

// =================================================================
// REGISTRY
// =================================================================

const NONE: Option<Primitive> = None;

fn m(f: Monad) -> Option<Primitive> {
    Some(Primitive::Monad(f))
}

fn d(f: Dyad) -> Option<Primitive> {
    Some(Primitive::Dyad(f))
}

fn n(f: Nary) -> Option<Primitive> {
    Some(Primitive::Nary(f))
}

/// Slot order: atom, list, atom-atom, list-atom, atom-list, list-list,
/// triad, tetrad
static VERBS: LazyLock<Vec<VerbDef>> = LazyLock::new(|| {
    vec![
        VerbDef::new(":", [m(ident), m(ident), d(rident), d(rident), d(rident), d(rident), NONE, NONE]),
        VerbDef::new("+", [m(flip), m(flip), d(plus), d(plus), d(plus), d(plus), NONE, NONE]),
        VerbDef::new("-", [m(negate), m(negate), d(minus), d(minus), d(minus), d(minus), NONE, NONE]),
        VerbDef::new("*", [m(first), m(first), d(times), d(times), d(times), d(times), NONE, NONE]),
        VerbDef::new("%", [m(sqrt), m(sqrt), d(divide), d(divide), d(divide), d(divide), NONE, NONE]),
        VerbDef::new("!", [m(iota), m(odometer), d(mod_atom), NONE, d(mod_each), d(make_dict), NONE, NONE]),
        VerbDef::new("&", [m(where_), m(where_), d(min), d(min), d(min), d(min), NONE, NONE]),
        VerbDef::new("|", [m(reverse), m(reverse), d(max), d(max), d(max), d(max), NONE, NONE]),
        VerbDef::new("<", [m(asc), m(asc), d(less), d(less), d(less), d(less), NONE, NONE]),
        VerbDef::new(">", [m(desc), m(desc), d(more), d(more), d(more), d(more), NONE, NONE]),
        VerbDef::new("=", [m(identity_matrix), m(group), d(equal), d(equal), d(equal), d(equal), NONE, NONE]),
        VerbDef::new("~", [m(not), m(not), d(match_), d(match_), d(match_), d(match_), NONE, NONE]),
        VerbDef::new(",", [m(enlist), m(enlist), d(concat), d(concat), d(concat), d(concat), NONE, NONE]),
        VerbDef::new("^", [m(nullish), m(nullish_each), d(fill), d(except), d(fill), d(except), NONE, NONE]),
        VerbDef::new("#", [m(count), m(count), d(take), d(reshape), d(take), d(reshape), NONE, NONE]),
        VerbDef::new("_", [m(floor), m(floor), d(drop), d(dict_drop), d(drop), d(cut), NONE, NONE]),
        VerbDef::new("$", [m(format_atom), m(format_each), d(dollar_verb), d(dollar_verb), d(dollar_verb), d(dollar_verb), NONE, NONE]),
        VerbDef::new("?", [m(random_floats), m(unique), d(rnd), d(find_first), d(rnd), d(find_each), n(splice), NONE]),
        VerbDef::new("@", [m(type_of), m(type_of), d(subscr), d(subscr), d(subscr), d(subscr), n(amend), n(amend)]),
        VerbDef::new(".", [m(k_eval), m(k_eval), d(call), d(call), d(call), d(call), n(dot_triad), n(deep_amend)]),
        VerbDef::new("'", [NONE, NONE, NONE, d(bin), NONE, d(bin_each), NONE, NONE]),
        VerbDef::new("/", [NONE, NONE, NONE, NONE, d(pack), d(pack), NONE, NONE]),
        VerbDef::new("\\", [NONE, NONE, NONE, d(unpack), d(split), NONE, NONE, NONE]),
        VerbDef::new("':", [NONE, NONE, NONE, NONE, d(window), NONE, NONE, NONE]),
    ]
});

/// Lazy static map from symbol to VerbDef (private - use find_verb)
static VERB_INDEX: LazyLock<HashMap<&'static str, &'static VerbDef>> = LazyLock::new(|| {
    let verbs: &'static [VerbDef] = VERBS.as_slice();
    verbs.iter().map(|v| (v.symbol, v)).collect()
});

/// Find a primitive verb by its symbol
pub fn find_verb(symbol: &str) -> Option<&'static VerbDef> {
    VERB_INDEX.get(symbol).copied()
}

/// All primitive verbs, in table order
pub fn verbs() -> &'static [VerbDef] {
    VERBS.as_slice()
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::Config;
    use crate::value::{sym, val};
    use pretty_assertions::assert_eq;

    /// Expected outcome of evaluating one source line
    #[derive(Debug)]
    enum Expect {
        Prints(&'static str),
        Fails(&'static str),
    }
    use Expect::*;

    fn run_verb_tests(cases: Vec<(&str, Expect)>) {
        let interp = Interpreter::with_config(Config::default().with_seed(42));
        for (i, (source, expected)) in cases.into_iter().enumerate() {
            match (interp.eval(source), expected) {
                (Ok(value), Prints(text)) => {
                    assert_eq!(value.to_string(), text, "#{i} {source:?}");
                }
                (Err(e), Fails(text)) => {
                    assert!(e.to_string().contains(text), "#{i} {source:?}: {e}");
                }
                (result, expected) => {
                    panic!("#{i} {source:?}: got {result:?}, expected {expected:?}")
                }
            }
        }
    }

    #[test]
    fn test_registry_lookup() {
        let plus = find_verb("+").unwrap();
        assert_eq!(plus.symbol, "+");
        assert!(matches!(plus.get(Slot::AtomAtom), Some(Primitive::Dyad(_))));
        assert!(plus.get(Slot::Triad).is_none());
        assert!(matches!(
            find_verb("?").unwrap().get(Slot::Triad),
            Some(Primitive::Nary(_))
        ));
        assert!(find_verb("0:").is_none());
        assert_eq!(verbs().len(), 24);
    }

    #[test]
    fn test_arithmetic_verbs() {
        run_verb_tests(vec![
            ("1+2", Prints("3")),
            ("1 2+10", Prints("11 12")),
            ("1 2+3 4", Prints("4 6")),
            ("1 2+1 2 3", Fails("lists are not the same length.")),
            ("-3", Prints("-3")),
            ("- 1 2", Prints("-1 -2")),
            ("2*3 4", Prints("6 8")),
            ("1%4", Prints("0.25")),
            ("%16", Prints("4")),
            ("7!3", Prints("3")),
            ("3!7", Prints("1")),
            ("3!-7", Prints("2")),
            ("-3!7", Prints("2")),
            ("3!0 1 2 3 4", Prints("0 1 2 0 1")),
            ("3&5", Prints("3")),
            ("0N&5", Prints("0N")),
            ("0N|5", Prints("5")),
            ("2|1 5", Prints("2 5")),
            ("`a+1", Fails("number expected, found symbol.")),
            ("\"a\"+1", Prints("98")),
        ]);
    }

    #[test]
    fn test_comparison_verbs() {
        run_verb_tests(vec![
            ("1<2", Prints("1")),
            ("1 2 3>2", Prints("0 0 1")),
            ("1 2=1 3", Prints("1 0")),
            ("\"a\"=97", Prints("1")),
            ("`a<`b", Prints("1")),
            ("1 2~1 2", Prints("1")),
            ("1 2~1 2 3", Prints("0")),
            ("~0 1 2", Prints("1 0 0")),
            ("(1;`a)~(1;`a)", Prints("1")),
        ]);
    }

    #[test]
    fn test_structural_monads() {
        run_verb_tests(vec![
            ("!5", Prints("0 1 2 3 4")),
            ("!-3", Prints("-3 -2 -1")),
            ("![a:1;b:2]", Prints("`a`b")),
            ("!2 3", Prints("(0 0 0 1 1 1\n 0 1 2 0 1 2)")),
            ("+(1 2;3 4)", Prints("(1 3\n 2 4)")),
            ("+(1;2 3)", Prints("(1 2\n 1 3)")),
            ("+5", Prints(",,5")),
            ("*1 2 3", Prints("1")),
            ("*()", Prints("()")),
            ("&0 2 1", Prints("1 1 2")),
            ("&[a:1;b:0;c:2]", Prints("`a`c`c")),
            ("|1 2 3", Prints("3 2 1")),
            ("<3 1 2", Prints("1 2 0")),
            (">3 1 2", Prints("0 2 1")),
            ("<\"cab\"", Prints("1 2 0")),
            ("<(\"bb\";\"a\";\"ba\")", Prints("1 2 0")),
            ("<[a:3;b:1]", Prints("`b`a")),
            ("<2 1 2 1", Prints("1 3 0 2")),
            ("=3", Prints("(1 0 0\n 0 1 0\n 0 0 1)")),
            ("=`a`b`a", Prints("[a:0 2;b:,1]")),
            (",5", Prints(",5")),
            ("^0N", Prints("1")),
            ("^(1;0N;`)", Prints("0 1 1")),
            ("#1 2 3", Prints("3")),
            ("#5", Prints("1")),
            ("#[a:1;b:2]", Prints("2")),
            ("_2.7 -1.5", Prints("2 -2")),
            ("_\"AbC\"", Prints("\"abc\"")),
            ("?1 2 1 3 2", Prints("1 2 3")),
            ("@1", Prints("-9")),
            ("@\"a\"", Prints("-10")),
            ("@`a", Prints("-11")),
            ("@1 2", Prints("0")),
            ("@[a:1]", Prints("99")),
            ("@{x}", Prints("102")),
            ("@+", Prints("107")),
        ]);
    }

    #[test]
    fn test_format_and_dollar() {
        run_verb_tests(vec![
            ("$12", Prints("\"12\"")),
            ("$1", Prints(",\"1\"")),
            ("$`abc", Prints("\"abc\"")),
            ("$(1;`b)", Prints("(,\"1\"\n ,\"b\")")),
            ("$\"hi\"", Prints("\"hi\"")),
            ("`$\"abc\"", Prints("`abc")),
            ("`$(\"ab\";\"cd\")", Prints("`ab`cd")),
            ("`i$3.7", Prints("3")),
            ("`i$-3.7", Prints("-3")),
            ("`c$65 66", Prints("\"AB\"")),
            ("`f$\"a\"", Prints("97")),
            ("`b$3", Prints("1")),
            ("5$\"ab\"", Prints("\"ab   \"")),
            ("-5$\"ab\"", Prints("\"   ab\"")),
            ("2$\"abcd\"", Prints("\"ab\"")),
            ("-2$\"abcd\"", Prints("\"cd\"")),
            ("`q$1", Fails("unknown cast 'q'.")),
        ]);
    }

    #[test]
    fn test_oversized_counts() {
        const TOO_LONG: &str = "list too long (max length: 67108864).";
        run_verb_tests(vec![
            ("1000000000000000#1", Fails(TOO_LONG)),
            ("-1000000000000000#1 2", Fails(TOO_LONG)),
            ("#1000000000000000#1", Fails(TOO_LONG)),
            ("!1000000000000000", Fails(TOO_LONG)),
            ("!-1000000000000000", Fails(TOO_LONG)),
            ("&1000000000000000", Fails(TOO_LONG)),
            ("=100000", Fails(TOO_LONG)),
            ("1000000000 1000000000#1", Fails(TOO_LONG)),
            ("1000000000000000 0#1", Fails(TOO_LONG)),
            ("100000000000$\"ab\"", Fails(TOO_LONG)),
            ("1000000000000000?10", Fails(TOO_LONG)),
            ("-3?1000000000000000", Fails(TOO_LONG)),
            (
                ".[{x#1};,1000000000000000;:]",
                Prints("(1\n \"list too long (max length: 67108864).\")"),
            ),
            ("3#1", Prints("1 1 1")),
        ]);
        assert_eq!(crate::MAX_LIST_LEN, 67_108_864);
    }

    #[test]
    fn test_take_drop_reshape() {
        run_verb_tests(vec![
            ("2#1 2 3", Prints("1 2")),
            ("-2#1 2 3", Prints("2 3")),
            ("5#1 2", Prints("1 2 1 2 1")),
            ("3#7", Prints("7 7 7")),
            ("2 3#!6", Prints("(0 1 2\n 3 4 5)")),
            ("2 2#1 2 3", Prints("(1 2\n 3 1)")),
            ("0N 2#!5", Prints("(0 1\n 2 3\n ,4)")),
            ("2 0N#!6", Prints("(0 1 2\n 3 4 5)")),
            ("`a`c#[a:1;b:2;c:3]", Prints("[a:1;c:3]")),
            ("1#[a:1;b:2]", Prints("[a:1]")),
            ("{x>1}#1 2 3", Prints("2 3")),
            ("{x>1}_1 2 3", Prints(",1")),
            ("2_1 2 3", Prints(",3")),
            ("-1_1 2 3", Prints("1 2")),
            ("5_1 2 3", Prints("()")),
            ("2_5", Prints("5")),
            ("0 2_1 2 3 4", Prints("(1 2\n 3 4)")),
            ("(,`a)_[a:1;b:2]", Prints("[b:2]")),
            ("1 2 3^2", Prints("1 3")),
            ("1 2 3 4^2 4", Prints("1 3")),
            ("5^0N", Prints("5")),
            ("5^1 0N 3", Prints("1 5 3")),
        ]);
    }

    #[test]
    fn test_search_and_dict_verbs() {
        run_verb_tests(vec![
            ("`a`b!1 2", Prints("[a:1;b:2]")),
            ("1 2!3 4", Prints("1 2!3 4")),
            ("`a!1", Fails("number expected")),
            ("1 2 3?2", Prints("1")),
            ("1 2 3?5", Prints("0N")),
            ("1 2 3?3 1", Prints("2 0")),
            ("[a:1;b:2]?2", Prints("`b")),
            ("1 2 3@1", Prints("2")),
            ("1 2 3@5", Prints("0N")),
            ("[a:1;b:2]@`b", Prints("2")),
            ("{x+y}.1 2", Prints("3")),
            ("1 3 5'4", Prints("1")),
            ("1 3 5'0 1 5 9", Prints("-1 0 2 2")),
            ("1,2", Prints("1 2")),
            ("[a:1],[b:2;a:3]", Prints("[a:3;b:2]")),
        ]);
    }

    #[test]
    fn test_helper_verbs() {
        run_verb_tests(vec![
            ("2 2 2/1 0 1", Prints("5")),
            ("24 60 60/1 2 3", Prints("3723")),
            ("24 60 60\\3723", Prints("1 2 3")),
            ("\",\"\\\"a,b,c\"", Prints("(,\"a\"\n ,\"b\"\n ,\"c\")")),
            ("\"-\"/(\"ab\";\"cd\")", Prints("\"ab-cd\"")),
            ("2':1 2 3", Prints("(1 2\n 2 3)")),
            ("?[1 2 3 4;1 3;`a`b]", Prints("(1;`a;`b;4)")),
        ]);
    }

    #[test]
    fn test_random_verbs_use_seeded_source() {
        let a = Interpreter::with_config(Config::default().with_seed(1));
        let b = Interpreter::with_config(Config::default().with_seed(1));
        let draws = "10?100";
        assert_eq!(a.eval(draws).unwrap(), b.eval(draws).unwrap());

        let deal = a.eval("-5?5").unwrap();
        let mut seen: Vec<f64> = deal
            .list()
            .unwrap()
            .iter()
            .map(|v| v.number().unwrap())
            .collect();
        seen.sort_by(f64::total_cmp);
        assert_eq!(seen, vec![0.0, 1.0, 2.0, 3.0, 4.0]);

        assert_eq!(a.eval("#?5").unwrap(), val(5));
        assert!(matches!(a.eval("-6?5"), Err(Error::Length(_))));
        let letters = a.eval("3?\"a\"").unwrap();
        assert!(letters.is_string());
        assert_eq!(a.eval("#3?`x`y").unwrap(), val(3));
    }

    #[test]
    fn test_amend_forms() {
        run_verb_tests(vec![
            ("@[1 2 3;1;-:]", Prints("1 -2 3")),
            ("@[1 2 3;0 2;+;10]", Prints("11 2 13")),
            ("@[1 2 3;0 2;+;10 20]", Prints("11 2 23")),
            ("@[[a:1;b:2];`b;*;5]", Prints("[a:1;b:10]")),
            ("@[1 2 3;5;-:]", Fails("index out of bounds.")),
            ("@[1 2 3;1;9]", Prints("1 9 3")),
            (".[(1 2;3 4);1 0;+;10]", Prints("(1 2\n 13 4)")),
            (".[(1 2;3 4);(;0);-:]", Prints("(-1 2\n -3 4)")),
            (".[(1 2;3 4);(0 1;1);:;9]", Prints("(1 9\n 3 9)")),
            (".[[a:1 2;b:3];(`a;1);+;5]", Prints("[a:1 7;b:3]")),
            ("x:1 2 3", Prints("1 2 3")),
            ("@[x;0;:;7]", Prints("7 2 3")),
            ("x", Prints("1 2 3")),
            ("@[`x;0;:;7]", Prints("`x")),
            ("x", Prints("7 2 3")),
        ]);
    }

    #[test]
    fn test_trap_and_eval() {
        run_verb_tests(vec![
            (".[{x+y};1 2;:]", Prints("0 3")),
            (".[{x+`a};,1;:]", Prints("(1\n \"number expected, found symbol.\")")),
            (".[{x};1;:]", Prints("(1\n \"list expected, found number.\")")),
            (".\"1+2\"", Prints("3")),
            ("g:5", Prints("5")),
            (".`g", Prints("5")),
            ("d:[a:1;b:2]", Prints("[a:1;b:2]")),
            (".d", Prints("1 2")),
            (".5", Fails("string expected, found number.")),
        ]);
    }

    #[test]
    fn test_slot_selection_errors() {
        run_verb_tests(vec![
            ("1 2!3", Fails("invalid arguments to !")),
        ]);
        let err = dollar(&sym("x"), &Value::Dict(Box::default())).unwrap_err();
        assert!(matches!(err, Error::Domain(_)));
    }
}
