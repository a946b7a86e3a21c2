//! Scalar-extension combinators and shared aggregate helpers.
//!
//! The four combinators lift a scalar operation over nested aggregates:
//!
//! - [`atomic_monad`] recurses through list elements and dict values
//! - [`string_atomic_monad`] recurses through lists, treating strings as leaves
//! - [`right_atomic`] broadcasts only over a list right operand
//! - [`atomic_dyad`] broadcasts both sides, zipping equal-length lists and
//!   merging dicts by key union
//!
//! The remaining helpers (take, drop, concat, comparisons) are the building
//! blocks several verbs and adverbs share.

use crate::{Error, MAX_LIST_LEN};
use crate::value::{Dict, Value};

/// Apply `f` to every non-aggregate leaf, preserving list and dict shape.
pub fn atomic_monad<F>(x: &Value, f: &F) -> Result<Value, Error>
where
    F: Fn(&Value) -> Result<Value, Error>,
{
    match x {
        Value::Dict(d) => {
            let values = map_items(d.values(), |v| atomic_monad(v, f))?;
            Value::dict(d.keys().to_vec(), values)
        }
        Value::List(items) => map_items(items, |v| atomic_monad(v, f)).map(Value::List),
        _ => f(x),
    }
}

/// Like [`atomic_monad`] but a string is a leaf and dicts are not entered.
pub fn string_atomic_monad<F>(x: &Value, f: &F) -> Result<Value, Error>
where
    F: Fn(&Value) -> Result<Value, Error>,
{
    match x {
        Value::List(items) if !x.is_string() => {
            map_items(items, |v| string_atomic_monad(v, f)).map(Value::List)
        }
        _ => f(x),
    }
}

/// Broadcast over a list right operand; the left operand is passed unchanged.
pub fn right_atomic<F>(x: &Value, y: &Value, f: &F) -> Result<Value, Error>
where
    F: Fn(&Value, &Value) -> Result<Value, Error>,
{
    match y {
        Value::List(items) => map_items(items, |v| right_atomic(x, v, f)).map(Value::List),
        _ => f(x, y),
    }
}

/// Full two-sided broadcasting.
///
/// Two dicts combine over the union of their keys; a key present on one side
/// only keeps that side's value.
pub fn atomic_dyad<F>(x: &Value, y: &Value, f: &F) -> Result<Value, Error>
where
    F: Fn(&Value, &Value) -> Result<Value, Error>,
{
    match (x, y) {
        (Value::Dict(a), Value::Dict(b)) => {
            let mut merged = Dict::default();
            for key in unique(&[a.keys(), b.keys()].concat()) {
                let value = match (a.get(&key), b.get(&key)) {
                    (Some(l), Some(r)) => atomic_dyad(l, r, f)?,
                    (Some(v), None) | (None, Some(v)) => v.clone(),
                    (None, None) => continue,
                };
                merged.set(key, value);
            }
            Ok(Value::Dict(Box::new(merged)))
        }
        (Value::List(a), Value::List(b)) => {
            zip_items(a, b, |l, r| atomic_dyad(l, r, f)).map(Value::List)
        }
        (Value::Dict(d), _) => {
            let values = atomic_dyad(&Value::List(d.values().to_vec()), y, f)?;
            Value::dict(d.keys().to_vec(), values.list()?.to_vec())
        }
        (_, Value::Dict(d)) => {
            let values = atomic_dyad(x, &Value::List(d.values().to_vec()), f)?;
            Value::dict(d.keys().to_vec(), values.list()?.to_vec())
        }
        (Value::List(items), _) => map_items(items, |v| atomic_dyad(v, y, f)).map(Value::List),
        (_, Value::List(items)) => map_items(items, |v| atomic_dyad(x, v, f)).map(Value::List),
        _ => f(x, y),
    }
}

pub(crate) fn map_items<F>(items: &[Value], mut f: F) -> Result<Vec<Value>, Error>
where
    F: FnMut(&Value) -> Result<Value, Error>,
{
    items.iter().map(&mut f).collect()
}

/// Pairwise map over two sequences that must have the same length.
pub(crate) fn zip_items<F>(a: &[Value], b: &[Value], mut f: F) -> Result<Vec<Value>, Error>
where
    F: FnMut(&Value, &Value) -> Result<Value, Error>,
{
    if a.len() != b.len() {
        return Err(Error::length_mismatch());
    }
    a.iter().zip(b).map(|(l, r)| f(l, r)).collect()
}

/// Floored modulus: the result takes the sign of `y`
pub fn floor_mod(x: f64, y: f64) -> f64 {
    x - y * (x / y).floor()
}

/// Atom equality; numbers and chars compare by code, NaN equals NaN.
pub fn equal(x: &Value, y: &Value) -> bool {
    match (x, y) {
        (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
        (Value::Number(a), Value::Char(c)) | (Value::Char(c), Value::Number(a)) => {
            *a == f64::from(*c)
        }
        _ => x.matches(y),
    }
}

/// Ordering of atoms; lists compare lexicographically, shorter first.
pub fn less(x: &Value, y: &Value) -> Result<bool, Error> {
    match (x, y) {
        (Value::List(_), Value::List(_)) => compare_lists(x, y, true),
        _ => compare_atoms(x, y).map(|o| o == Some(std::cmp::Ordering::Less)),
    }
}

pub fn more(x: &Value, y: &Value) -> Result<bool, Error> {
    match (x, y) {
        (Value::List(_), Value::List(_)) => compare_lists(x, y, false),
        _ => compare_atoms(x, y).map(|o| o == Some(std::cmp::Ordering::Greater)),
    }
}

fn compare_atoms(x: &Value, y: &Value) -> Result<Option<std::cmp::Ordering>, Error> {
    if !x.is_atom() || !y.is_atom() {
        return Err(Error::domain());
    }
    Ok(match (x, y) {
        (Value::Symbol(a), Value::Symbol(b)) => Some(a.cmp(b)),
        (Value::Symbol(_), _) | (_, Value::Symbol(_)) => None,
        _ => x.number()?.partial_cmp(&y.number()?),
    })
}

/// `ascending` selects whether the answer is for "less" (true) or "more"
fn compare_lists(x: &Value, y: &Value, ascending: bool) -> Result<bool, Error> {
    let (a, b) = (x.list()?, y.list()?);
    let mut i = 0;
    loop {
        let (ra, rb) = (&a[i..], &b[i..]);
        if Value::List(ra.to_vec()).matches(&Value::List(rb.to_vec())) {
            return Ok(false);
        }
        if ra.len() != rb.len() {
            return Ok(if ra.len() < rb.len() { ascending } else { !ascending });
        }
        let (fa, fb) = (&ra[0], &rb[0]);
        if less(fa, fb)? {
            return Ok(ascending);
        }
        if more(fa, fb)? {
            return Ok(!ascending);
        }
        i += 1;
    }
}

/// Concatenation; two dicts merge with the right side winning.
pub fn concat(x: &Value, y: &Value) -> Value {
    if let (Value::Dict(a), Value::Dict(b)) = (x, y) {
        let mut merged = (**a).clone();
        for (k, v) in b.iter() {
            merged.set(k.clone(), v.clone());
        }
        return Value::Dict(Box::new(merged));
    }
    let mut items = match x {
        Value::List(items) => items.clone(),
        other => vec![other.clone()],
    };
    match y {
        Value::List(tail) => items.extend(tail.iter().cloned()),
        other => items.push(other.clone()),
    }
    Value::List(items)
}

/// Distinct elements in first-occurrence order, compared with match
pub fn unique(items: &[Value]) -> Vec<Value> {
    let mut seen: Vec<Value> = Vec::new();
    for item in items {
        if !seen.iter().any(|s| s.matches(item)) {
            seen.push(item.clone());
        }
    }
    seen
}

/// Position of the first element equal to `y`, or `0N`
pub fn find_equal(items: &[Value], y: &Value) -> Value {
    items
        .iter()
        .position(|v| equal(v, y))
        .map_or(Value::Number(f64::NAN), |i| Value::Number(i as f64))
}

pub fn reverse(x: &Value) -> Result<Value, Error> {
    Ok(match x {
        Value::Dict(d) => {
            let keys = d.keys().iter().rev().cloned().collect();
            let values = d.values().iter().rev().cloned().collect();
            Value::dict(keys, values)?
        }
        Value::List(items) => Value::List(items.iter().rev().cloned().collect()),
        other => other.clone(),
    })
}

/// A list length from a numeric count, rounded up from its magnitude.
/// Counts beyond [`MAX_LIST_LEN`] fail instead of exhausting memory.
pub fn length(n: f64) -> Result<usize, Error> {
    let n = n.abs().ceil();
    if n > MAX_LIST_LEN as f64 {
        return Err(Error::too_long());
    }
    Ok(n as usize)
}

pub(crate) fn check_length(n: usize) -> Result<usize, Error> {
    if n > MAX_LIST_LEN {
        return Err(Error::too_long());
    }
    Ok(n)
}

/// `n#y` for a numeric count: cycle through `y`, from the end when negative
pub fn take(n: f64, y: &Value) -> Result<Value, Error> {
    if !n.is_finite() && !n.is_nan() {
        return Err(Error::Domain("take count must be finite.".into()));
    }
    let items = match y {
        Value::List(items) if !items.is_empty() => items.as_slice(),
        other => std::slice::from_ref(other),
    };
    let len = items.len() as f64;
    let start = if n < 0.0 { floor_mod(n, len) } else { 0.0 };
    let count = if n.is_nan() { 0 } else { length(n)? };
    Ok(Value::List(
        (0..count)
            .map(|i| items[floor_mod(i as f64 + start, len) as usize].clone())
            .collect(),
    ))
}

/// `n_y` for a numeric count: remove from the front, or the end when negative
pub fn drop(n: f64, y: &Value) -> Value {
    let items = match y {
        Value::List(items) if !items.is_empty() => items,
        other => return other.clone(),
    };
    let len = items.len();
    let n = n.trunc();
    let kept = if n < 0.0 {
        let end = len.saturating_sub((-n).min(len as f64) as usize);
        &items[..end]
    } else {
        &items[(n.min(len as f64) as usize)..]
    };
    Value::List(kept.to_vec())
}

/// Index a list by a number; out-of-range and non-integral indices give `0N`
pub fn list_index(items: &[Value], i: &Value) -> Value {
    let Ok(n) = i.number() else {
        return Value::Number(f64::NAN);
    };
    if n < 0.0 || n.fract() != 0.0 || n >= items.len() as f64 {
        return Value::Number(f64::NAN);
    }
    items[n as usize].clone()
}

/// Indices repeated by count: `&0 2 1` is `1 1 2`
pub fn where_counts(items: &[Value]) -> Result<Vec<Value>, Error> {
    let mut out = Vec::new();
    for (i, v) in items.iter().enumerate() {
        let n = v.index()?;
        check_length(out.len().saturating_add(n))?;
        out.extend(std::iter::repeat_n(Value::Number(i as f64), n));
    }
    Ok(out)
}

/// Split `y` at the ascending positions in `cuts`
pub fn cut(cuts: &[Value], y: &[Value]) -> Result<Vec<Value>, Error> {
    let mut bounds = cuts.to_vec();
    bounds.push(Value::Number(y.len() as f64));
    bounds
        .windows(2)
        .map(|w| {
            let (from, to) = (w[0].index()?, w[1].index()?);
            if from < to && to > y.len() {
                return Err(Error::out_of_bounds());
            }
            Ok(Value::List(y.get(from..to).unwrap_or_default().to_vec()))
        })
        .collect()
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::value::{sym, val};
    use pretty_assertions::assert_eq;

    fn plus(x: &Value, y: &Value) -> Result<Value, Error> {
        Ok(Value::Number(x.number()? + y.number()?))
    }

    fn negate(x: &Value) -> Result<Value, Error> {
        Ok(Value::Number(-x.number()?))
    }

    #[test]
    fn test_atomic_monad_preserves_shape() {
        let nested = val(vec![val(1), val([2, 3])]);
        assert_eq!(
            atomic_monad(&nested, &negate).unwrap(),
            val(vec![val(-1), val([-2, -3])])
        );
        let d = Value::dict(vec![sym("a")], vec![val(4)]).unwrap();
        assert_eq!(
            atomic_monad(&d, &negate).unwrap(),
            Value::dict(vec![sym("a")], vec![val(-4)]).unwrap()
        );
    }

    #[test]
    fn test_string_atomic_monad_stops_at_strings() {
        let count = |x: &Value| Ok(Value::Number(x.count() as f64));
        let mixed = val(vec![val("abc"), val(vec![val("de")])]);
        assert_eq!(
            string_atomic_monad(&mixed, &count).unwrap(),
            val(vec![val(3), val([2])])
        );
    }

    #[test]
    fn test_atomic_dyad_broadcasting() {
        let cases = vec![
            (val(1), val([1, 2]), val([2, 3])),
            (val([1, 2]), val(10), val([11, 12])),
            (val([1, 2]), val([10, 20]), val([11, 22])),
        ];
        for (x, y, expected) in cases {
            assert_eq!(atomic_dyad(&x, &y, &plus).unwrap(), expected);
        }
        assert!(matches!(
            atomic_dyad(&val([1, 2]), &val([1, 2, 3]), &plus),
            Err(Error::Length(_))
        ));
    }

    #[test]
    fn test_atomic_dyad_dict_key_union() {
        let a = Value::dict(vec![sym("a"), sym("b")], vec![val(1), val(2)]).unwrap();
        let b = Value::dict(vec![sym("b"), sym("c")], vec![val(10), val(20)]).unwrap();
        let expected =
            Value::dict(vec![sym("a"), sym("b"), sym("c")], vec![val(1), val(12), val(20)])
                .unwrap();
        assert_eq!(atomic_dyad(&a, &b, &plus).unwrap(), expected);
    }

    #[test]
    fn test_right_atomic_keeps_left_whole() {
        let find = |x: &Value, y: &Value| Ok(find_equal(x.list()?, y));
        let result = right_atomic(&val([5, 6, 7]), &val([7, 5, 9]), &find).unwrap();
        assert_eq!(result, val(vec![val(2), val(0), val(f64::NAN)]));
    }

    #[test]
    fn test_take_and_drop() {
        let xs = val([1, 2, 3]);
        assert_eq!(take(2.0, &xs).unwrap(), val([1, 2]));
        assert_eq!(take(-2.0, &xs).unwrap(), val([2, 3]));
        assert_eq!(take(5.0, &xs).unwrap(), val([1, 2, 3, 1, 2]));
        assert_eq!(take(3.0, &val(7)).unwrap(), val([7, 7, 7]));
        assert_eq!(drop(1.0, &xs), val([2, 3]));
        assert_eq!(drop(-1.0, &xs), val([1, 2]));
        assert_eq!(drop(9.0, &xs), val(Vec::<Value>::new()));
    }

    #[test]
    fn test_list_comparison() {
        assert!(less(&val([1, 2]), &val([1, 3])).unwrap());
        assert!(less(&val([1]), &val([1, 0])).unwrap());
        assert!(!less(&val([1, 2]), &val([1, 2])).unwrap());
        assert!(more(&sym("b"), &sym("a")).unwrap());
        assert!(less(&val(1), &Value::empty_dict()).is_err());
    }

    #[test]
    fn test_cut_and_where() {
        let ys: Vec<Value> = (0..5).map(val).collect();
        let parts = cut(&[val(0), val(2)], &ys).unwrap();
        assert_eq!(parts, vec![val([0, 1]), val([2, 3, 4])]);
        assert_eq!(where_counts(&[val(0), val(2), val(1)]).unwrap(), vec![val(1), val(1), val(2)]);
        assert!(where_counts(&[val(-1)]).is_err());
    }
}
