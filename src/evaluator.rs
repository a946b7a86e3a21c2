//! The tree-walking interpreter.
//!
//! [`Interpreter`] owns everything a program can observe besides its own
//! values: the root environment, the extension registries (I/O hooks and
//! native numeric monads), the random source and the depth counters.
//! Two interpreters never share state.
//!
//! Evaluation is direct recursion over [`Value`] nodes. Verb application
//! selects one of eight shape slots from the operands (see [`Slot`]) and
//! dispatches through the primitive table in [`crate::verbs`]; adverbs
//! dispatch on the valence of their verb through [`crate::adverbs`].

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::adverbs;
use crate::env::Environment;
use crate::parser::{Parser, set_sticky, sticky_of};
use crate::stack::ensure_sufficient_stack;
use crate::value::{Adverb, Function, Value, Verb};
use crate::verbs::{self, Helper, Primitive, Slot};
use crate::{Config, Error};

/// Host callback installed for an I/O verb slot. Receives the operands in
/// order: `[y]` for monads, `[x, y]` for dyads, all arguments otherwise.
pub type NativeFn = Rc<dyn Fn(&Interpreter, &[Value], &Environment) -> Result<Value, Error>>;

const PRELUDE: &str = "prm:{{$[x;,/x,''o'x^/:x;,x]}@$[-8>@x;!x;x]};in:{~^y?x}";

/// Interpreter state; see the module docs.
pub struct Interpreter {
    io: HashMap<(String, Slot), NativeFn>,
    natives: HashMap<String, fn(f64) -> f64>,
    helpers: HashMap<Helper, Value>,
    rng: RefCell<StdRng>,
    depth: Cell<usize>,
    eval_depth: Cell<usize>,
    config: Config,
    root: Environment,
}

/// Decrements a depth counter when the guarded call returns
struct DepthGuard<'a>(&'a Cell<usize>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut natives: HashMap<String, fn(f64) -> f64> = HashMap::new();
        natives.insert("log".into(), f64::ln);
        natives.insert("exp".into(), f64::exp);
        natives.insert("sin".into(), f64::sin);
        natives.insert("cos".into(), f64::cos);

        let helpers = Helper::ALL
            .into_iter()
            .map(|h| {
                let mut program = crate::parser::parse(h.source())
                    .expect("built-in helper source must parse");
                (h, program.swap_remove(0))
            })
            .collect();

        let prelude = config.prelude;
        let interp = Interpreter {
            io: HashMap::new(),
            natives,
            helpers,
            rng: RefCell::new(rng),
            depth: Cell::new(0),
            eval_depth: Cell::new(0),
            config,
            root: Environment::new(),
        };
        if prelude {
            interp
                .eval(PRELUDE)
                .expect("prelude definitions must evaluate");
        }
        interp
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The global scope
    pub fn root(&self) -> &Environment {
        &self.root
    }

    /// Parse with this interpreter's native monads recognized as verbs
    pub fn parse(&self, source: &str) -> Result<Vec<Value>, Error> {
        let natives = &self.natives;
        let is_native = |name: &str| natives.contains_key(name);
        Parser::new(source, &is_native).parse()
    }

    /// Parse and run every statement of `source` in the root environment,
    /// returning the value of the last one.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn eval(&self, source: &str) -> Result<Value, Error> {
        let program = self.parse(source)?;
        let mut result = Value::Nil;
        for statement in &program {
            result = self.run(statement, &self.root)?;
        }
        debug!(statements = program.len(), result = %result, "evaluated");
        Ok(result)
    }

    /// Install a host callback for one shape slot of an I/O verb (`0:` to `9:`).
    pub fn set_io<F>(&mut self, symbol: &str, slot: Slot, f: F) -> Result<(), Error>
    where
        F: Fn(&Interpreter, &[Value], &Environment) -> Result<Value, Error> + 'static,
    {
        let mut chars = symbol.chars();
        let valid = matches!(
            (chars.next(), chars.next(), chars.next()),
            (Some(d), Some(':'), None) if d.is_ascii_digit()
        );
        if !valid {
            return Err(Error::Domain(format!("'{symbol}' is not an I/O verb.")));
        }
        debug!(symbol, ?slot, "registered I/O verb");
        self.io.insert((symbol.to_owned(), slot), Rc::new(f));
        Ok(())
    }

    /// Register a name that parses as an atomic numeric monad, like `log`.
    pub fn register_monad(&mut self, name: &str, f: fn(f64) -> f64) -> Result<(), Error> {
        let valid = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && name.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid {
            return Err(Error::Domain(format!("'{name}' is not a valid name.")));
        }
        debug!(name, "registered native monad");
        self.natives.insert(name.to_owned(), f);
        Ok(())
    }

    /// A uniform random number in `[0, 1)`
    pub(crate) fn random(&self) -> f64 {
        self.rng.borrow_mut().gen_range(0.0..1.0)
    }

    pub(crate) fn call_helper(
        &self,
        helper: Helper,
        args: Vec<Value>,
        env: &Environment,
    ) -> Result<Value, Error> {
        let f = self
            .helpers
            .get(&helper)
            .expect("every helper is parsed at construction");
        self.call(f, &Value::List(args), env)
    }

    pub fn lookup(&self, env: &Environment, name: &str, global: bool) -> Result<Value, Error> {
        env.lookup(name, global, &|node, scope| self.run(node, scope))
    }

    fn enter(&self) -> Result<DepthGuard<'_>, Error> {
        let depth = self.depth.get() + 1;
        if depth > self.config.max_call_depth {
            return Err(Error::Limit("stack overflow.".into()));
        }
        self.depth.set(depth);
        Ok(DepthGuard(&self.depth))
    }

    fn enter_eval(&self) -> Result<DepthGuard<'_>, Error> {
        let depth = self.eval_depth.get() + 1;
        if depth > self.config.max_eval_depth {
            return Err(Error::Limit(format!(
                "evaluation too deeply nested (max depth: {}).",
                self.config.max_eval_depth
            )));
        }
        self.eval_depth.set(depth);
        Ok(DepthGuard(&self.eval_depth))
    }

    /// Evaluate one node.
    pub fn run(&self, node: &Value, env: &Environment) -> Result<Value, Error> {
        let _guard = self.enter_eval()?;
        ensure_sufficient_stack(|| self.run_node(node, env))
    }

    fn run_node(&self, node: &Value, env: &Environment) -> Result<Value, Error> {
        if sticky_of(node).is_some() {
            return Ok(node.clone());
        }
        match node {
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items.iter().rev() {
                    out.push(self.run(item, env)?);
                }
                out.reverse();
                Ok(Value::List(out))
            }
            Value::Dict(d) => {
                let mut values = Vec::with_capacity(d.len());
                for v in d.values() {
                    values.push(self.run(v, env)?);
                }
                Value::dict(d.keys().to_vec(), values)
            }
            Value::Function(f) => {
                let bound = if f.env.is_none() {
                    let mut bound = f.clone();
                    bound.env = Some(env.clone());
                    bound.arg = None;
                    Value::Function(bound)
                } else {
                    node.clone()
                };
                match &f.arg {
                    Some(arg) => {
                        let arg = self.run(arg, env)?;
                        self.subscr(&bound, &arg, env)
                    }
                    None => Ok(bound),
                }
            }
            Value::View(view) => {
                env.define(&view.name, node.clone());
                Ok(node.clone())
            }
            Value::NameRef(r) => {
                if let Some(expr) = &r.assign {
                    let value = self.run(expr, env)?;
                    env.put(&r.name, r.global, value);
                }
                self.lookup(env, &r.name, false)
            }
            Value::Verb(v) if v.curry.is_some() && v.right.is_none() => {
                self.apply_verb(node, Vec::new(), env)
            }
            Value::Verb(v) => match &v.right {
                Some(right) => {
                    let right = self.run(right, env)?;
                    let left = v.left.as_ref().map(|l| self.run(l, env)).transpose()?;
                    self.apply_verb(node, vec![left, Some(right)], env)
                }
                None => Ok(node.clone()),
            },
            Value::Adverb(a) => match &a.right {
                Some(right) => {
                    let right = self.run(right, env)?;
                    let verb = self.run(&a.verb, env)?;
                    let left = a.left.as_ref().map(|l| self.run(l, env)).transpose()?;
                    self.apply_adverb(a, verb, vec![left, Some(right)], env)
                }
                None => Ok(node.clone()),
            },
            Value::Cond(branches) => {
                for pair in branches.chunks_exact(2) {
                    if !self.run(&pair[0], env)?.is_falsy() {
                        return self.run(&pair[1], env);
                    }
                }
                match branches.last() {
                    Some(last) => self.run(last, env),
                    None => Ok(Value::Nil),
                }
            }
            Value::Quote(inner) => self.run(inner, env),
            _ => Ok(node.clone()),
        }
    }

    /// Apply `x` to the argument list `y`: call a function, index a list or
    /// dict at depth, or apply a verb.
    pub fn call(&self, x: &Value, y: &Value, env: &Environment) -> Result<Value, Error> {
        if let Some(depth) = sticky_of(x) {
            let args = y.as_list().unwrap_or(std::slice::from_ref(y));
            let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Nil);
            let target = sticky_target(x, depth).unwrap_or(x);
            return if self.valence(target, env)? == 1 {
                self.apply_monad(x, &arg(0), env)
            } else {
                self.apply_dyad(x, &arg(0), &arg(1), env)
            };
        }
        match x {
            Value::Symbol(name) => self.call(&self.lookup(env, name, false)?, y, env),
            Value::List(_) | Value::Dict(_) => match y {
                Value::List(path) => self.at_depth(x, path, env),
                _ => self.subscr(x, y, env),
            },
            Value::Verb(_) => self.apply_verb(x, arguments(y), env),
            Value::Adverb(a) => {
                let verb = self.run(&a.verb, env)?;
                self.apply_adverb(a, verb, arguments(y), env)
            }
            Value::Function(f) => self.call_function(f, y),
            other => Err(Error::expected("function or list", other)),
        }
    }

    fn call_function(&self, f: &Function, y: &Value) -> Result<Value, Error> {
        if let Value::Dict(d) = y {
            let mut bound = f.clone();
            bound.env = Some(Environment::from_dict(d)?);
            return Ok(Value::Function(Box::new(bound)));
        }
        let args = y.as_list().unwrap_or(std::slice::from_ref(y));
        let scope = match &f.env {
            Some(env) => Environment::child(env),
            None => Environment::new(),
        };
        let niladic_call = args.len() == 1 && args[0].is_null();
        if !f.params.is_empty() || !niladic_call {
            let mut curry = f.curry.clone().unwrap_or_default();
            curry.resize(f.params.len(), Value::Nil);
            let mut complete = true;
            let mut used = 0;
            for slot in curry.iter_mut() {
                if !slot.is_null() {
                    continue;
                }
                let Some(arg) = args.get(used) else {
                    complete = false;
                    break;
                };
                if arg.is_null() {
                    complete = false;
                }
                *slot = arg.clone();
                used += 1;
            }
            if !complete {
                let projection = Function {
                    curry: Some(curry),
                    arg: None,
                    ..f.clone()
                };
                return Ok(Value::Function(Box::new(projection)));
            }
            if used < args.len() && !f.params.is_empty() {
                return Err(Error::Valence);
            }
            for (name, value) in f.params.iter().zip(curry) {
                scope.define(name, value);
            }
        }
        scope.define("o", Value::Function(Box::new(f.clone())));

        let _guard = self.enter()?;
        let mut result = Value::Nil;
        for statement in f.body.iter() {
            result = self.run(statement, &scope)?;
        }
        Ok(result)
    }

    /// Index `x` by `y`. Verbs are applied, lists and dicts looked up, a
    /// list index maps over the index's shape.
    pub fn subscr(&self, x: &Value, y: &Value, env: &Environment) -> Result<Value, Error> {
        match (x, y) {
            (Value::Symbol(name), _) => self.subscr(&self.lookup(env, name, false)?, y, env),
            (_, Value::Nil) => Ok(x.clone()),
            (Value::List(_), Value::Dict(d)) => {
                let values = self.subscr_each(x, d.values(), env)?;
                Value::dict(d.keys().to_vec(), values)
            }
            (Value::Verb(_) | Value::Adverb(_), _) => self.apply_monad(x, y, env),
            (Value::List(_) | Value::Dict(_), Value::List(indices)) => {
                self.subscr_each(x, indices, env).map(Value::List)
            }
            (Value::List(items), _) => Ok(crate::atomic::list_index(items, y)),
            (Value::Dict(d), _) => Ok(d.get(y).cloned().unwrap_or(Value::Number(f64::NAN))),
            _ => self.call(x, &Value::enlist(y.clone()), env),
        }
    }

    fn subscr_each(
        &self,
        x: &Value,
        indices: &[Value],
        env: &Environment,
    ) -> Result<Vec<Value>, Error> {
        indices.iter().map(|i| self.subscr(x, i, env)).collect()
    }

    /// Index through nested structure, one path element per level. A `Nil`
    /// or list element selects several items at that level.
    pub(crate) fn at_depth(
        &self,
        x: &Value,
        path: &[Value],
        env: &Environment,
    ) -> Result<Value, Error> {
        let Some((index, rest)) = path.split_first() else {
            return Ok(x.clone());
        };
        let selected = self.subscr(x, index, env)?;
        if !matches!(index, Value::Nil | Value::List(_)) {
            return self.at_depth(&selected, rest, env);
        }
        match &selected {
            Value::Dict(d) => {
                let values = d
                    .values()
                    .iter()
                    .map(|v| self.at_depth(v, rest, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Value::dict(d.keys().to_vec(), values)
            }
            other => other
                .list()?
                .iter()
                .map(|v| self.at_depth(v, rest, env))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
        }
    }

    pub fn apply_monad(&self, f: &Value, x: &Value, env: &Environment) -> Result<Value, Error> {
        match f {
            Value::Function(_) => self.call(f, &Value::enlist(x.clone()), env),
            Value::List(_) | Value::Dict(_) => self.subscr(f, x, env),
            Value::Adverb(a) if a.right.is_none() => {
                let mut node = a.clone();
                node.right = Some(x.clone());
                self.run(&Value::Adverb(node), env)
            }
            _ if sticky_of(f).is_some() => self.run(&fill_sticky(f, None, x.clone())?, env),
            _ => self.apply_verb(f, vec![Some(x.clone())], env),
        }
    }

    pub fn apply_dyad(
        &self,
        f: &Value,
        x: &Value,
        y: &Value,
        env: &Environment,
    ) -> Result<Value, Error> {
        match f {
            Value::Function(_) | Value::List(_) | Value::Dict(_) => {
                self.call(f, &Value::List(vec![x.clone(), y.clone()]), env)
            }
            _ if sticky_of(f).is_some_and(|depth| depth != 0) => {
                self.run(&fill_sticky(f, Some(x.clone()), y.clone())?, env)
            }
            _ => self.apply_verb(f, vec![Some(x.clone()), Some(y.clone())], env),
        }
    }

    /// Apply a verb node to operands. Two arguments are `[left, right]`
    /// with `None` for a missing left; one argument is the right operand
    /// with the node's own left (if any); three or four select the n-ary
    /// slots.
    pub(crate) fn apply_verb(
        &self,
        node: &Value,
        args: Vec<Option<Value>>,
        env: &Environment,
    ) -> Result<Value, Error> {
        let verb = match node {
            Value::Verb(v) => v,
            Value::Adverb(a) => {
                let verb = self.run(&a.verb, env)?;
                let mut args = args;
                if args.len() == 1 {
                    args.insert(0, None);
                }
                return self.apply_adverb(a, verb, args, env);
            }
            other => return Err(Error::expected("function or list", other)),
        };

        let args = match &verb.curry {
            Some(curry) => {
                let mut pending = args.into_iter().flatten();
                let mut filled = Vec::with_capacity(curry.len());
                let mut complete = true;
                for slot in curry {
                    if !slot.is_null() {
                        filled.push(self.run(slot, env)?);
                    } else if let Some(arg) = pending.next() {
                        filled.push(arg);
                    } else {
                        complete = false;
                        filled.push(Value::Nil);
                    }
                }
                if !complete {
                    return Ok(projection(verb, filled));
                }
                filled.into_iter().map(Some).collect()
            }
            None => args,
        };

        if args.len() > 2 {
            let slot = match args.len() {
                3 => Slot::Triad,
                4 => Slot::Tetrad,
                _ => return Err(Error::Valence),
            };
            let args: Vec<Value> = args.into_iter().map(|a| a.unwrap_or(Value::Nil)).collect();
            return self.dispatch(&verb.symbol, slot, &args, env);
        }

        let (left, right) = match <[Option<Value>; 2]>::try_from(args) {
            Ok([left, right]) => (left, right),
            Err(args) => {
                let left = verb.left.as_ref().map(|l| self.run(l, env)).transpose()?;
                (left, args.into_iter().next().flatten())
            }
        };
        let Some(right) = right else {
            return Ok(projection(verb, vec![left.unwrap_or(Value::Nil), Value::Nil]));
        };
        match left {
            None => {
                let slot = if right.is_list() {
                    Slot::ListMonad
                } else {
                    Slot::AtomMonad
                };
                self.dispatch(&verb.symbol, slot, &[right], env)
            }
            Some(left) => {
                let slot = match (left.is_list(), right.is_list()) {
                    (false, false) => Slot::AtomAtom,
                    (true, false) => Slot::ListAtom,
                    (false, true) => Slot::AtomList,
                    (true, true) => Slot::ListList,
                };
                self.dispatch(&verb.symbol, slot, &[left, right], env)
            }
        }
    }

    /// Primitive table first, then native monads, then I/O hooks.
    fn dispatch(
        &self,
        symbol: &str,
        slot: Slot,
        args: &[Value],
        env: &Environment,
    ) -> Result<Value, Error> {
        if let Some(primitive) = verbs::find_verb(symbol).and_then(|def| def.get(slot)) {
            return self.invoke(primitive, args, env);
        }
        if let (Some(f), Slot::AtomMonad | Slot::ListMonad, [x]) =
            (self.natives.get(symbol), slot, args)
        {
            return crate::atomic::atomic_monad(x, &|v: &Value| Ok(Value::Number(f(v.number()?))));
        }
        if let Some(hook) = self.io.get(&(symbol.to_owned(), slot)) {
            return hook(self, args, env);
        }
        Err(Error::invalid_arguments(symbol))
    }

    fn invoke(
        &self,
        primitive: Primitive,
        args: &[Value],
        env: &Environment,
    ) -> Result<Value, Error> {
        match (primitive, args) {
            (Primitive::Monad(f), [x]) => f(self, x, env),
            (Primitive::Dyad(f), [x, y]) => f(self, x, y, env),
            (Primitive::Nary(f), args) => f(self, args, env),
            _ => Err(Error::Valence),
        }
    }

    /// Apply an adverb node whose verb is already evaluated. `args` is
    /// `[left, right]`, or the full argument list of a bracket call.
    pub(crate) fn apply_adverb(
        &self,
        node: &Adverb,
        verb: Value,
        args: Vec<Option<Value>>,
        env: &Environment,
    ) -> Result<Value, Error> {
        let verb = match verb {
            Value::NameRef(_) => self.run(&verb, env)?,
            other => other,
        };
        let def = adverbs::find_adverb(&node.symbol)
            .ok_or_else(|| Error::invalid_arguments(&node.symbol))?;
        let mut valence = self.valence(&verb, env)?;
        if valence > 2 {
            let args: Vec<Value> = args.into_iter().flatten().collect();
            return match def.many {
                Some(f) => f(self, &verb, &args, env),
                None => Err(Error::invalid_arguments(&node.symbol)),
            };
        }

        let mut args = args.into_iter();
        let (first, second) = (args.next().flatten(), args.next().flatten());
        let (mut left, mut right) = match second {
            Some(second) => (first, Some(second)),
            None => (None, first),
        };
        if valence == 0 {
            if !matches!(verb, Value::Function(_)) {
                let primitive = Value::Verb(Box::new(Verb::new(node.symbol.clone())));
                return self.apply_verb(&primitive, vec![Some(verb), right], env);
            }
            valence = 1;
        }
        if valence == 2 && right.is_none() {
            (left, right) = (None, left);
        }

        let applied = match (valence, &left, &right) {
            (1, None, Some(y)) => def.monad.map(|f| f(self, &verb, y, env)),
            (_, None, Some(y)) => def.dyad.map(|f| f(self, &verb, y, env)),
            (1, Some(x), Some(y)) => def.left_monad.map(|f| f(self, &verb, x, y, env)),
            (_, Some(x), Some(y)) => def.left_dyad.map(|f| f(self, &verb, x, y, env)),
            _ => None,
        };
        applied.unwrap_or_else(|| {
            let left = left.map(|l| format!("{l} ")).unwrap_or_default();
            let right = right.map(|r| r.to_string()).unwrap_or_default();
            Err(Error::Domain(format!(
                "invalid arguments to {} [{left}{verb} (valence {valence}), {right}]",
                node.symbol
            )))
        })
    }

    /// Number of arguments `node` takes when applied; 0 for nouns.
    pub fn valence(&self, node: &Value, env: &Environment) -> Result<usize, Error> {
        Ok(match node {
            Value::Function(f) => f.valence(),
            Value::NameRef(r) => return self.valence(&self.lookup(env, &r.name, false)?, env),
            Value::Adverb(a) if a.symbol == "'" => return self.valence(&a.verb, env),
            Value::Adverb(_) => 1,
            Value::Verb(v) if v.force_monad || self.natives.contains_key(&v.symbol) => 1,
            Value::Verb(v) => match (&v.curry, v.sticky) {
                (Some(curry), _) => curry.iter().filter(|s| s.is_null()).count(),
                (None, Some(depth)) => match sticky_target(node, depth) {
                    Some(Value::Adverb(_)) => 1,
                    Some(Value::Verb(t)) if t.force_monad || t.left.is_some() => 1,
                    _ => 2,
                },
                (None, None) => 2,
            },
            _ => 0,
        })
    }
}

/// Bracket-call arguments as verb operands
fn arguments(y: &Value) -> Vec<Option<Value>> {
    match y {
        Value::List(items) => items.iter().cloned().map(Some).collect(),
        other => vec![Some(other.clone())],
    }
}

/// The verb with `slots` as its partial-application list
fn projection(verb: &Verb, slots: Vec<Value>) -> Value {
    let mut projected = Verb::curried(verb.symbol.clone(), slots);
    projected.force_monad = verb.force_monad;
    Value::Verb(Box::new(projected))
}

/// The node `depth` steps down the right-operand chain
fn sticky_target(node: &Value, depth: usize) -> Option<&Value> {
    if depth == 0 {
        return Some(node);
    }
    let next = match node {
        Value::Verb(v) => v.right.as_ref()?,
        Value::Adverb(a) => a.right.as_ref()?,
        _ => return None,
    };
    sticky_target(next, depth - 1)
}

fn sticky_target_mut(node: &mut Value, depth: usize) -> Option<&mut Value> {
    if depth == 0 {
        return Some(node);
    }
    let next = match node {
        Value::Verb(v) => v.right.as_mut()?,
        Value::Adverb(a) => a.right.as_mut()?,
        _ => return None,
    };
    sticky_target_mut(next, depth - 1)
}

/// A copy of the sticky chain `node` with its open operand filled in.
/// The input node is left untouched.
fn fill_sticky(node: &Value, left: Option<Value>, right: Value) -> Result<Value, Error> {
    let depth = sticky_of(node).unwrap_or(0);
    let mut root = node.clone();
    set_sticky(&mut root, None);
    match sticky_target_mut(&mut root, depth) {
        Some(Value::Verb(v)) => {
            v.right = Some(right);
            if left.is_some() {
                v.left = left;
            }
        }
        Some(Value::Adverb(a)) => {
            a.right = Some(right);
            if left.is_some() {
                a.left = left;
            }
        }
        _ => return Err(Error::domain()),
    }
    Ok(root)
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::value::{sym, val};
    use pretty_assertions::assert_eq;

    fn seeded() -> Interpreter {
        Interpreter::with_config(Config::default().with_seed(7))
    }

    /// Each case is `(source, printed result)`; cases share one interpreter
    /// so earlier assignments are visible to later cases.
    fn run_cases(interp: &Interpreter, cases: &[(&str, &str)]) {
        for (i, (source, expected)) in cases.iter().enumerate() {
            match interp.eval(source) {
                Ok(value) => assert_eq!(value.to_string(), *expected, "#{i} {source:?}"),
                Err(e) => panic!("#{i} {source:?} failed: {e}"),
            }
        }
    }

    #[test]
    fn test_statements_and_assignment() {
        run_cases(
            &seeded(),
            &[
                ("a:3", "3"),
                ("a*2", "6"),
                ("b:a+1;b", "4"),
                ("a+:10", "13"),
                ("l:1 2 3", "1 2 3"),
                ("l[1]:20", "1 20 3"),
                ("l", "1 20 3"),
                ("l[0]+:5", "6 20 3"),
                ("d:[a:1;b:2]", "[a:1;b:2]"),
                ("d[`c]:3", "[a:1;b:2;c:3]"),
            ],
        );
    }

    #[test]
    fn test_function_calls_and_projection() {
        run_cases(
            &seeded(),
            &[
                ("{x+y}[2;3]", "5"),
                ("f:{x*y}", "{[x;y]x*y}"),
                ("g:f[2]", "{[x;y]x*y}[2;]"),
                ("g 5", "10"),
                ("f[;3] 4", "12"),
                ("{1}[]", "1"),
                ("{[a;b]a-b}[10;3]", "7"),
                ("{x} 9", "9"),
                ("h:+[1;]", "+[1;]"),
                ("h 2", "3"),
            ],
        );
    }

    #[test]
    fn test_closures_capture_definition_scope() {
        run_cases(
            &seeded(),
            &[
                ("mk:{a:x;{a+x}}", "{[x]a:x;{a+x}}"),
                ("add5:mk 5", "{[x]a+x}"),
                ("add5 1", "6"),
            ],
        );
    }

    #[test]
    fn test_recursion_with_o() {
        run_cases(&seeded(), &[("{$[x<2;x;o[x-1]+o[x-2]]} 10", "55")]);
    }

    #[test]
    fn test_valence_error_on_extra_args() {
        let err = seeded().eval("{x}[1;2]").unwrap_err();
        assert_eq!(err, Error::Valence);
        assert_eq!(err.to_string(), "valence error.");
    }

    #[test]
    fn test_conditional() {
        run_cases(
            &seeded(),
            &[
                ("$[1;`yes;`no]", "`yes"),
                ("$[0;`yes;`no]", "`no"),
                ("$[();1;0;2;3]", "3"),
                ("$[0;1]", "1"),
                ("$[0;1;0;2]", "2"),
                ("$[1;`a;0;`b]", "`a"),
                ("$[\"\";1;2]", "2"),
            ],
        );
    }

    #[test]
    fn test_sticky_fragments_apply_as_functions() {
        run_cases(
            &seeded(),
            &[
                ("f:(2*1+)", "(2*1+)"),
                ("f 3", "8"),
                ("f", "(2*1+)"),
                ("(+)[3;4]", "7"),
                ("(1+)'1 2 3", "2 3 4"),
                ("g:(-)", "-"),
                ("g/10 1 2", "7"),
            ],
        );
    }

    #[test]
    fn test_indexing_at_depth() {
        run_cases(
            &seeded(),
            &[
                ("m:(1 2 3;4 5 6)", "(1 2 3\n 4 5 6)"),
                ("m[1;2]", "6"),
                ("m[;0]", "1 4"),
                ("m[0 1;1]", "2 5"),
                ("m[5]", "0N"),
                ("d:[a:1 2;b:3 4]", "[a:1 2;b:3 4]"),
                ("d[`b;1]", "4"),
                ("d[;0]", "[a:1;b:3]"),
                ("1 2 3@[a:0;b:2]", "[a:1;b:3]"),
            ],
        );
    }

    #[test]
    fn test_call_depth_limit() {
        let interp = Interpreter::with_config(Config::default().with_max_call_depth(32));
        let err = interp.eval("f:{f x};f 1").unwrap_err();
        assert_eq!(err, Error::Limit("stack overflow.".into()));
        assert_eq!(interp.eval("{x+1} 1").unwrap(), val(2));
    }

    #[test]
    fn test_eval_depth_limit() {
        let interp = Interpreter::with_config(Config::default().with_max_eval_depth(50));
        let chain = format!("{}1", "1+".repeat(99));
        let err = interp.eval(&chain).unwrap_err();
        assert_eq!(
            err,
            Error::Limit("evaluation too deeply nested (max depth: 50).".into())
        );

        interp.eval(&format!("f:{{{}x}}", "1+".repeat(99))).unwrap();
        run_cases(
            &interp,
            &[(
                ".[f;,1;:]",
                "(1\n \"evaluation too deeply nested (max depth: 50).\")",
            )],
        );
        assert_eq!(interp.eval("1+1+1").unwrap(), val(3));
    }

    #[test]
    fn test_long_chain_within_limits() {
        let chain = format!("{}1", "1+".repeat(1999));
        assert_eq!(seeded().eval(&chain).unwrap(), val(2000));
    }

    #[test]
    fn test_undefined_name() {
        let err = seeded().eval("nope+1").unwrap_err();
        assert_eq!(err.to_string(), "the name 'nope' has not been defined.");
    }

    #[test]
    fn test_registered_native_monad() {
        let mut interp = seeded();
        interp.register_monad("dbl", |n| n * 2.0).unwrap();
        assert_eq!(interp.eval("dbl 1 2 3").unwrap(), val([2, 4, 6]));
        assert!(interp.register_monad("2x", |n| n).is_err());
        assert_eq!(interp.eval("exp 0").unwrap(), val(1));
    }

    #[test]
    fn test_io_hook_slots() {
        let mut interp = seeded();
        interp
            .set_io("7:", Slot::AtomMonad, |_, args, _| Ok(Value::List(args.to_vec())))
            .unwrap();
        assert_eq!(interp.eval("7: 5").unwrap(), val([5]));
        let err = interp.eval("3 7: 5").unwrap_err();
        assert!(err.to_string().starts_with("invalid arguments to 7:"), "{err}");
        assert!(interp.set_io("x:", Slot::AtomMonad, |_, _, _| Ok(Value::Nil)).is_err());
    }

    #[test]
    fn test_prelude() {
        run_cases(
            &seeded(),
            &[
                ("2 in 1 2 3", "1"),
                ("5 in 1 2 3", "0"),
                ("prm 3", "(0 1 2\n 0 2 1\n 1 0 2\n 1 2 0\n 2 0 1\n 2 1 0)"),
            ],
        );
        let bare = Interpreter::with_config(Config::default().without_prelude());
        assert!(matches!(bare.eval("prm 3"), Err(Error::Undefined(_))));
    }

    #[test]
    fn test_symbol_call_looks_up_name() {
        let interp = seeded();
        interp.eval("f:{x*10}").unwrap();
        assert_eq!(interp.call(&sym("f"), &val([4]), interp.root()).unwrap(), val(40));
    }
}
