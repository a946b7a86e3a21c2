//! Canonical text rendering of values.
//!
//! Every literal category the parser accepts prints back as source that
//! parses to a matching value. Expression nodes (verbs, adverbs, references)
//! print in infix form, parenthesizing a left operand only when it has a left
//! operand of its own.

use std::fmt;

use crate::value::Value;

/// Render a number: `0w`, `-0w`, `0N`, integers without a fraction,
/// everything else rounded to four decimal places.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "0N".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "0w" } else { "-0w" }.into();
    }
    let rounded = if n.fract() == 0.0 {
        n
    } else {
        (n * 10000.0 + 0.5).floor() / 10000.0
    };
    if rounded == 0.0 {
        // -0 prints as 0
        return "0".into();
    }
    rounded.to_string()
}

/// Render `value` as source text. With `bare_symbol`, a top-level symbol
/// prints without its backtick.
pub fn format(value: &Value, bare_symbol: bool) -> String {
    let mut out = String::new();
    write_value(&mut out, value, "", bare_symbol);
    out
}

fn write_value(out: &mut String, value: &Value, indent: &str, bare_symbol: bool) {
    if let Some(node) = unsticky(value) {
        out.push('(');
        write_value(out, &node, indent, false);
        out.push(')');
        return;
    }
    match value {
        Value::Number(n) => out.push_str(&format_number(*n)),
        Value::Char(c) => write_chars(out, &[*c]),
        Value::Symbol(s) => {
            if !bare_symbol {
                out.push('`');
            }
            out.push_str(s);
        }
        Value::List(items) => write_list(out, items, indent),
        Value::Dict(d) => {
            if !d.is_empty() && d.keys().iter().all(|k| matches!(k, Value::Symbol(_))) {
                out.push('[');
                for (i, (k, v)) in d.iter().enumerate() {
                    if i > 0 {
                        out.push(';');
                    }
                    write_value(out, k, indent, true);
                    out.push(':');
                    write_value(out, v, indent, false);
                }
                out.push(']');
            } else {
                let keys = Value::List(d.keys().to_vec());
                if d.len() == 1 {
                    out.push('(');
                    write_value(out, &keys, indent, false);
                    out.push(')');
                } else {
                    write_value(out, &keys, indent, false);
                }
                out.push('!');
                write_value(out, &Value::List(d.values().to_vec()), indent, false);
            }
        }
        Value::Function(f) => {
            out.push('{');
            if !f.params.is_empty() {
                out.push('[');
                out.push_str(&f.params.join(";"));
                out.push(']');
            }
            write_seq(out, &f.body, indent);
            out.push('}');
            if let Some(curry) = &f.curry {
                out.push('[');
                let slots: Vec<Value> = (0..f.params.len())
                    .map(|i| curry.get(i).cloned().unwrap_or(Value::Nil))
                    .collect();
                write_seq(out, &slots, indent);
                out.push(']');
            }
            if let Some(arg) = &f.arg {
                out.push(' ');
                write_value(out, arg, indent, false);
            }
        }
        Value::View(v) => {
            out.push_str(&v.name);
            out.push_str("::");
            write_value(out, &v.expr, indent, false);
        }
        Value::NameRef(r) => {
            out.push_str(&r.name);
            if let Some(assign) = &r.assign {
                out.push_str(if r.global { "::" } else { ":" });
                write_value(out, assign, indent, false);
            }
        }
        Value::Verb(v) => {
            if let Some(curry) = &v.curry {
                out.push_str(&v.symbol);
                if v.force_monad {
                    out.push(':');
                }
                out.push('[');
                write_seq(out, curry, indent);
                out.push(']');
            } else if let Some(left) = &v.left {
                let nested = matches!(left, Value::Verb(l) if l.left.is_some())
                    || matches!(left, Value::Adverb(l) if l.left.is_some());
                if nested {
                    out.push('(');
                }
                write_value(out, left, indent, false);
                if nested {
                    out.push(')');
                }
                out.push_str(&v.symbol);
            } else {
                out.push_str(&v.symbol);
                if v.force_monad {
                    out.push(':');
                }
            }
            if let Some(right) = &v.right {
                write_value(out, right, indent, false);
            }
        }
        Value::Adverb(a) => {
            if let Some(left) = &a.left {
                write_value(out, left, indent, false);
                out.push(' ');
            }
            write_value(out, &a.verb, indent, false);
            out.push_str(&a.symbol);
            if let Some(right) = &a.right {
                write_value(out, right, indent, false);
            }
        }
        Value::Nil => {}
        Value::Cond(branches) => {
            out.push_str("$[");
            write_seq(out, branches, indent);
            out.push(']');
        }
        Value::Quote(inner) => {
            out.push('(');
            write_value(out, inner, indent, false);
            out.push(')');
        }
    }
}

/// A sticky node prints parenthesized, as the plain node it wraps
fn unsticky(value: &Value) -> Option<Value> {
    match value {
        Value::Verb(v) if v.sticky.is_some() => {
            let mut plain = v.clone();
            plain.sticky = None;
            Some(Value::Verb(plain))
        }
        Value::Adverb(a) if a.sticky.is_some() => {
            let mut plain = a.clone();
            plain.sticky = None;
            Some(Value::Adverb(plain))
        }
        _ => None,
    }
}

fn write_seq(out: &mut String, items: &[Value], indent: &str) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        write_value(out, item, indent, false);
    }
}

fn write_list(out: &mut String, items: &[Value], indent: &str) {
    let Some(head) = items.first() else {
        out.push_str("()");
        return;
    };
    if items.len() == 1 {
        out.push(',');
        write_value(out, head, indent, false);
        return;
    }
    if items.iter().any(Value::is_list) {
        let inner = format!("{indent} ");
        out.push('(');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push('\n');
                out.push_str(&inner);
            }
            write_value(out, item, &inner, false);
        }
        out.push(')');
        return;
    }
    let same = items
        .iter()
        .all(|v| std::mem::discriminant(v) == std::mem::discriminant(head));
    match head {
        Value::Char(_) if same => {
            let codes: Vec<u32> = items
                .iter()
                .filter_map(|v| match v {
                    Value::Char(c) => Some(*c),
                    _ => None,
                })
                .collect();
            write_chars(out, &codes);
        }
        Value::Number(_) | Value::Symbol(_) if same => {
            let sep = if matches!(head, Value::Symbol(_)) { "" } else { " " };
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(sep);
                }
                write_value(out, item, indent, false);
            }
        }
        _ => {
            out.push('(');
            write_seq(out, items, indent);
            out.push(')');
        }
    }
}

/// A quoted, escaped string, or `0x..` hex bytes when it holds control or
/// high-half bytes
fn write_chars(out: &mut String, codes: &[u32]) {
    let binary = codes.iter().all(|&c| c <= 0xff)
        && codes
            .iter()
            .any(|&c| (c < 32 && c != 9 && c != 10) || (127..=255).contains(&c));
    if binary {
        out.push_str("0x");
        for c in codes {
            out.push_str(&format!("{c:02x}"));
        }
        return;
    }
    out.push('"');
    for &c in codes {
        match char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER) {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch => out.push(ch),
        }
    }
    out.push('"');
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self, false))
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::value::{Function, Verb, kstr, sym, val};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_number_formatting() {
        let cases = vec![
            (1.0, "1"),
            (-3.0, "-3"),
            (0.5, "0.5"),
            (2.0 / 3.0, "0.6667"),
            (-0.0, "0"),
            (f64::INFINITY, "0w"),
            (f64::NEG_INFINITY, "-0w"),
            (f64::NAN, "0N"),
        ];
        for (n, expected) in cases {
            assert_eq!(format_number(n), expected, "format_number({n})");
        }
    }

    #[test]
    fn test_list_formatting() {
        let cases: Vec<(Value, &str)> = vec![
            (val([1, 2, 3]), "1 2 3"),
            (val(Vec::<Value>::new()), "()"),
            (val([7]), ",7"),
            (val(vec![sym("a"), sym("b")]), "`a`b"),
            (val(vec![val(1), sym("a")]), "(1;`a)"),
            (val("hi"), "\"hi\""),
            (val(vec!['a']), ",\"a\""),
            (kstr("a"), "\"a\""),
            (val("a\"b\n"), "\"a\\\"b\\n\""),
            (val(vec![Value::Char(1), Value::Char(255)]), "0x01ff"),
            (val(vec![val([1, 2]), val([3, 4])]), "(1 2\n 3 4)"),
        ];
        for (value, expected) in cases {
            assert_eq!(value.to_string(), expected);
        }
    }

    #[test]
    fn test_mixed_control_and_wide_chars_read_back() {
        let text = val(vec![Value::Char(13), Value::Char(0x100), Value::Char(1), Value::Char(10)]);
        let printed = text.to_string();
        assert_eq!(printed, "\"\\r\u{100}\u{1}\\n\"");
        let reread = crate::parser::parse(&printed).unwrap();
        assert_eq!(reread, vec![text]);
    }

    #[test]
    fn test_dict_formatting() {
        let d = Value::dict(vec![sym("a"), sym("b")], vec![val(1), val(2)]).unwrap();
        assert_eq!(d.to_string(), "[a:1;b:2]");
        let numeric = Value::dict(vec![val(1), val(2)], vec![val(3), val(4)]).unwrap();
        assert_eq!(numeric.to_string(), "1 2!3 4");
        let single = Value::dict(vec![val(1)], vec![val(3)]).unwrap();
        assert_eq!(single.to_string(), "(,1)!,3");
    }

    #[test]
    fn test_symbol_mode() {
        assert_eq!(format(&sym("abc"), true), "abc");
        assert_eq!(format(&sym("abc"), false), "`abc");
    }

    #[test]
    fn test_node_formatting() {
        let f = Function::new(vec!["x".into(), "y".into()], vec![]);
        assert_eq!(Value::Function(Box::new(f)).to_string(), "{[x;y]}");

        let plus = Verb::infix("+", Some(val(1)), Some(val(2)));
        assert_eq!(Value::Verb(Box::new(plus.clone())).to_string(), "1+2");

        let nested = Verb::infix("*", Some(Value::Verb(Box::new(plus))), Some(val(3)));
        assert_eq!(Value::Verb(Box::new(nested)).to_string(), "(1+2)*3");

        let projection = Verb::curried("+", vec![val(1), Value::Nil]);
        assert_eq!(Value::Verb(Box::new(projection)).to_string(), "+[1;]");
    }
}
