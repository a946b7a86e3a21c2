//! The adverb registry.
//!
//! An adverb modifies a verb or function. Which implementation runs depends
//! on the operand's valence and on whether a left argument was supplied:
//!
//! | slot | operand | left argument |
//! |---|---|---|
//! | `monad` | monadic | no |
//! | `dyad` | dyadic | no |
//! | `left_monad` | monadic | yes |
//! | `left_dyad` | dyadic | yes |
//! | `many` | three or more parameters | bracket arguments |
//!
//! Operands with valence 0 never reach this table: the evaluator applies the
//! adverb symbol as a plain dyadic verb instead.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::Error;
use crate::atomic::{map_items, zip_items};
use crate::env::Environment;
use crate::evaluator::Interpreter;
use crate::value::Value;
use crate::verbs::{self, Helper};

pub type AdverbFn = fn(&Interpreter, &Value, &Value, &Environment) -> Result<Value, Error>;
pub type LeftAdverbFn =
    fn(&Interpreter, &Value, &Value, &Value, &Environment) -> Result<Value, Error>;
pub type ManyAdverbFn = fn(&Interpreter, &Value, &[Value], &Environment) -> Result<Value, Error>;

/// One adverb symbol and its implementations
#[derive(Debug)]
pub struct AdverbDef {
    pub symbol: &'static str,
    /// `f' y`
    pub monad: Option<AdverbFn>,
    /// `g' y` for a dyadic `g`
    pub dyad: Option<AdverbFn>,
    /// `x f' y`
    pub left_monad: Option<LeftAdverbFn>,
    /// `x g' y`
    pub left_dyad: Option<LeftAdverbFn>,
    /// `h'[a;b;c]`
    pub many: Option<ManyAdverbFn>,
}

/// The primitive symbol of a bare verb operand, used to pick identities
fn verb_symbol(f: &Value) -> Option<&str> {
    match f {
        Value::Verb(v) if v.curry.is_none() && v.left.is_none() => Some(&v.symbol),
        _ => None,
    }
}

// =================================================================
// EACH
// =================================================================

/// `f'x`: apply `f` to every item of a list or value of a dict
pub(crate) fn each_monadic(
    interp: &Interpreter,
    f: &Value,
    x: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    if let Value::Dict(d) = x {
        let values = map_items(d.values(), |v| interp.apply_monad(f, v, env))?;
        return Value::dict(d.keys().to_vec(), values);
    }
    map_items(x.list()?, |v| interp.apply_monad(f, v, env)).map(Value::List)
}

/// `g'x` with no left argument: one projection of `g` per item
fn each_projection(
    interp: &Interpreter,
    f: &Value,
    x: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    map_items(x.list()?, |v| match f {
        Value::Function(_) => interp.call(f, &Value::List(vec![v.clone(), Value::Nil]), env),
        Value::Verb(_) => interp.apply_verb(f, vec![Some(v.clone()), None], env),
        _ => interp.apply_dyad(f, v, &Value::Nil, env),
    })
    .map(Value::List)
}

/// `x g' y`: pairwise, broadcasting an atom on either side
fn each_dyadic(
    interp: &Interpreter,
    f: &Value,
    x: &Value,
    y: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    match (x, y) {
        (Value::Dict(a), Value::Dict(_)) => {
            let keys = Value::List(a.keys().to_vec());
            let paired = interp.subscr(y, &keys, env)?;
            let values = each_dyadic(interp, f, &Value::List(a.values().to_vec()), &paired, env)?;
            Value::dict(a.keys().to_vec(), values.list()?.to_vec())
        }
        (Value::List(_), Value::List(_)) => {
            zip_items(x.list()?, y.list()?, |l, r| interp.apply_dyad(f, l, r, env))
                .map(Value::List)
        }
        (Value::List(_), _) => each_left(interp, f, x, y, env),
        _ => each_right(interp, f, x, y, env),
    }
}

/// `x g/: y`: `x` against every item of `y`
fn each_right(
    interp: &Interpreter,
    f: &Value,
    x: &Value,
    y: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    map_items(y.list()?, |v| interp.apply_dyad(f, x, v, env)).map(Value::List)
}

/// `x g\: y`: every item of `x` against `y`
fn each_left(
    interp: &Interpreter,
    f: &Value,
    x: &Value,
    y: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    map_items(x.list()?, |v| interp.apply_dyad(f, v, y, env)).map(Value::List)
}

/// Bracket arguments after the first, transposed into one row per call
fn rows(interp: &Interpreter, args: &[Value], env: &Environment) -> Result<Vec<Value>, Error> {
    let columns = Value::List(args.get(1..).unwrap_or_default().to_vec());
    match verbs::flip(interp, &columns, env)? {
        Value::List(rows) => Ok(rows),
        other => Ok(vec![other]),
    }
}

fn prepend(head: &Value, row: &Value) -> Value {
    let mut items = vec![head.clone()];
    match row {
        Value::List(rest) => items.extend(rest.iter().cloned()),
        other => items.push(other.clone()),
    }
    Value::List(items)
}

/// `h'[a;b;c]`: call `h` once per row, pairing items of a list `a`
fn each_many(
    interp: &Interpreter,
    f: &Value,
    args: &[Value],
    env: &Environment,
) -> Result<Value, Error> {
    let Some(x) = args.first() else {
        return Err(Error::Valence);
    };
    let rows = rows(interp, args, env)?;
    match x {
        Value::List(heads) => zip_items(heads, &rows, |h, row| {
            interp.call(f, &prepend(h, row), env)
        })
        .map(Value::List),
        _ => map_items(&rows, |row| interp.call(f, &prepend(x, row), env)).map(Value::List),
    }
}

// =================================================================
// EACH PRIOR AND STENCIL
// =================================================================

/// `g':x`: each item against its predecessor, the first against the
/// identity of `g` (or `0N`)
fn each_prior(
    interp: &Interpreter,
    f: &Value,
    x: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    let seed = match verb_symbol(f) {
        Some("+" | "-") => Value::Number(0.0),
        Some("*" | "%") => Value::Number(1.0),
        Some("&") => x.first(),
        Some(",") => Value::List(Vec::new()),
        _ => Value::Number(f64::NAN),
    };
    each_prior_seeded(interp, f, &seed, x, env)
}

/// `s g':x`: as [`each_prior`] with `s` before the first item
fn each_prior_seeded(
    interp: &Interpreter,
    f: &Value,
    seed: &Value,
    x: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    let mut prior = seed.clone();
    map_items(x.list()?, |v| {
        let result = interp.apply_dyad(f, v, &prior, env)?;
        prior = v.clone();
        Ok(result)
    })
    .map(Value::List)
}

/// `n f':x`: `f` over each sliding window of width `n`
fn stencil(
    interp: &Interpreter,
    f: &Value,
    n: &Value,
    x: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    let windows = interp.call_helper(Helper::Window, vec![n.clone(), x.clone()], env)?;
    each_monadic(interp, f, &windows, env)
}

// =================================================================
// OVER AND SCAN
// =================================================================

/// `g/x`: left fold. An empty list folds to the identity of `+ * | &`.
fn over(interp: &Interpreter, f: &Value, x: &Value, env: &Environment) -> Result<Value, Error> {
    let Value::List(items) = x else {
        return Ok(x.clone());
    };
    match (items.as_slice(), verb_symbol(f)) {
        ([], Some("+")) => Ok(Value::Number(0.0)),
        ([], Some("*")) => Ok(Value::Number(1.0)),
        ([], Some("|")) => Ok(Value::Number(f64::NEG_INFINITY)),
        ([], Some("&")) => Ok(Value::Number(f64::INFINITY)),
        ([only], Some(",")) if only.is_list() => Ok(only.clone()),
        ([], _) | ([_], Some(",")) => Ok(x.clone()),
        ([head, rest @ ..], _) => fold(interp, f, head, rest, env),
    }
}

fn fold(
    interp: &Interpreter,
    f: &Value,
    seed: &Value,
    items: &[Value],
    env: &Environment,
) -> Result<Value, Error> {
    items
        .iter()
        .try_fold(seed.clone(), |acc, v| interp.apply_dyad(f, &acc, v, env))
}

/// `s g/x`: fold starting from `s`
fn over_seeded(
    interp: &Interpreter,
    f: &Value,
    seed: &Value,
    x: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    fold(interp, f, seed, x.as_list().unwrap_or(std::slice::from_ref(x)), env)
}

/// `g\x`: running fold
fn scan(interp: &Interpreter, f: &Value, x: &Value, env: &Environment) -> Result<Value, Error> {
    let Value::List(items) = x else {
        return Ok(x.clone());
    };
    let [head, rest @ ..] = items.as_slice() else {
        return Ok(x.clone());
    };
    if rest.is_empty() {
        return Ok(x.clone());
    }
    let mut acc = head.clone();
    let mut out = vec![acc.clone()];
    for v in rest {
        acc = interp.apply_dyad(f, &acc, v, env)?;
        out.push(acc.clone());
    }
    Ok(Value::List(out))
}

/// `s g\x`: running fold from `s`, without `s` itself
fn scan_seeded(
    interp: &Interpreter,
    f: &Value,
    seed: &Value,
    x: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    let mut acc = seed.clone();
    map_items(x.as_list().unwrap_or(std::slice::from_ref(x)), |v| {
        acc = interp.apply_dyad(f, &acc, v, env)?;
        Ok(acc.clone())
    })
    .map(Value::List)
}

/// `h/[a;b;c]`: fold over rows with `a` as the initial accumulator
fn over_many(
    interp: &Interpreter,
    f: &Value,
    args: &[Value],
    env: &Environment,
) -> Result<Value, Error> {
    let Some(x) = args.first() else {
        return Err(Error::Valence);
    };
    rows(interp, args, env)?
        .iter()
        .try_fold(x.clone(), |acc, row| interp.call(f, &prepend(&acc, row), env))
}

fn scan_many(
    interp: &Interpreter,
    f: &Value,
    args: &[Value],
    env: &Environment,
) -> Result<Value, Error> {
    let Some(x) = args.first() else {
        return Err(Error::Valence);
    };
    let mut acc = x.clone();
    let mut out = vec![acc.clone()];
    for row in rows(interp, args, env)? {
        acc = interp.call(f, &prepend(&acc, &row), env)?;
        out.push(acc.clone());
    }
    Ok(Value::List(out))
}

// =================================================================
// CONVERGE AND WHILE
// =================================================================

/// `f/x`: apply `f` until the result stops changing or returns to `x`
fn converge(
    interp: &Interpreter,
    f: &Value,
    x: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    let mut prev = x.clone();
    loop {
        let next = interp.apply_monad(f, &prev, env)?;
        if next.matches(&prev) || next.matches(x) {
            return Ok(prev);
        }
        prev = next;
    }
}

/// `f\x`: every intermediate value of [`converge`], starting with `x`
fn converge_scan(
    interp: &Interpreter,
    f: &Value,
    x: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    let mut out = vec![x.clone()];
    loop {
        let last = out.last().unwrap_or(x);
        let next = interp.apply_monad(f, last, env)?;
        if next.matches(last) || next.matches(x) {
            return Ok(Value::List(out));
        }
        out.push(next);
    }
}

/// Apply `f` to `y` `n` times for a number `n`, otherwise while the
/// predicate `n` holds for the latest value. Every value is passed to
/// `visit`, starting with `y`.
fn iterate(
    interp: &Interpreter,
    f: &Value,
    n: &Value,
    y: &Value,
    env: &Environment,
    mut visit: impl FnMut(&Value),
) -> Result<Value, Error> {
    let mut current = y.clone();
    visit(&current);
    if let Value::Number(_) = n {
        for _ in 0..n.index()? {
            current = interp.apply_monad(f, &current, env)?;
            visit(&current);
        }
    } else {
        while !interp.apply_monad(n, &current, env)?.is_falsy() {
            current = interp.apply_monad(f, &current, env)?;
            visit(&current);
        }
    }
    Ok(current)
}

/// `n f/y`: repeat or loop while
fn repeat(
    interp: &Interpreter,
    f: &Value,
    n: &Value,
    y: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    iterate(interp, f, n, y, env, |_| {})
}

/// `n f\y`: as [`repeat`], collecting every value
fn repeat_scan(
    interp: &Interpreter,
    f: &Value,
    n: &Value,
    y: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    let mut out = Vec::new();
    iterate(interp, f, n, y, env, |v| out.push(v.clone()))?;
    Ok(Value::List(out))
}

// =================================================================
// REGISTRY
// =================================================================

static ADVERBS: LazyLock<Vec<AdverbDef>> = LazyLock::new(|| {
    vec![
        AdverbDef {
            symbol: "':",
            monad: None,
            dyad: Some(each_prior),
            left_monad: Some(stencil),
            left_dyad: Some(each_prior_seeded),
            many: None,
        },
        AdverbDef {
            symbol: "'",
            monad: Some(each_monadic),
            dyad: Some(each_projection),
            left_monad: Some(each_dyadic),
            left_dyad: Some(each_dyadic),
            many: Some(each_many),
        },
        AdverbDef {
            symbol: "/:",
            monad: None,
            dyad: None,
            left_monad: Some(each_right),
            left_dyad: Some(each_right),
            many: None,
        },
        AdverbDef {
            symbol: "\\:",
            monad: None,
            dyad: None,
            left_monad: Some(each_left),
            left_dyad: Some(each_left),
            many: None,
        },
        AdverbDef {
            symbol: "/",
            monad: Some(converge),
            dyad: Some(over),
            left_monad: Some(repeat),
            left_dyad: Some(over_seeded),
            many: Some(over_many),
        },
        AdverbDef {
            symbol: "\\",
            monad: Some(converge_scan),
            dyad: Some(scan),
            left_monad: Some(repeat_scan),
            left_dyad: Some(scan_seeded),
            many: Some(scan_many),
        },
    ]
});

static ADVERB_INDEX: LazyLock<HashMap<&'static str, &'static AdverbDef>> = LazyLock::new(|| {
    let adverbs: &'static [AdverbDef] = ADVERBS.as_slice();
    adverbs.iter().map(|a| (a.symbol, a)).collect()
});

/// Find an adverb by its symbol
pub fn find_adverb(symbol: &str) -> Option<&'static AdverbDef> {
    ADVERB_INDEX.get(symbol).copied()
}
