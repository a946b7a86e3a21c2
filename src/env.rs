//! Lexical environments and reactive views.
//!
//! An [`Environment`] is a shared handle to one scope: a flat name table plus
//! an optional parent. Children point at parents, never the reverse, so the
//! chain is a tree and drops cleanly.
//!
//! Views (`name::expr`) live in a scope table like any other binding. Reading
//! one through [`Environment::lookup`] recomputes its cache when a dependency
//! changed since the last read.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::Error;
use crate::value::{Dict, Value, View};

/// Evaluation callback used to recompute views
pub type Eval<'a> = &'a dyn Fn(&Value, &Environment) -> Result<Value, Error>;

struct Scope {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Environment>,
}

/// Shared handle to a scope; clones refer to the same table
#[derive(Clone)]
pub struct Environment(Rc<Scope>);

impl Environment {
    /// A root scope with no parent
    pub fn new() -> Self {
        Environment(Rc::new(Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    /// A fresh scope chained to `parent`
    pub fn child(parent: &Environment) -> Self {
        Environment(Rc::new(Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        }))
    }

    /// A root scope seeded from a symbol-keyed dict
    pub fn from_dict(d: &Dict) -> Result<Self, Error> {
        let env = Environment::new();
        for (k, v) in d.iter() {
            match k {
                Value::Symbol(name) => env.define(name, v.clone()),
                other => return Err(Error::expected("symbol", other)),
            }
        }
        Ok(env)
    }

    pub fn parent(&self) -> Option<&Environment> {
        self.0.parent.as_ref()
    }

    fn root(&self) -> &Environment {
        let mut env = self;
        while let Some(parent) = env.parent() {
            env = parent;
        }
        env
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Bind `name` in this scope
    pub fn define(&self, name: &str, value: Value) {
        self.0.bindings.borrow_mut().insert(name.to_owned(), value);
    }

    /// Bind locally, or in the root scope when `global`
    pub fn put(&self, name: &str, global: bool, value: Value) {
        if global {
            self.root().define(name, value);
        } else {
            self.define(name, value);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.bindings.borrow().contains_key(name)
    }

    /// Resolve `name`, walking up the chain; `global` starts at the root.
    ///
    /// A view binding is refreshed with `eval` and its cached value returned.
    pub fn lookup(&self, name: &str, global: bool, eval: Eval<'_>) -> Result<Value, Error> {
        if global {
            return self.root().lookup(name, false, eval);
        }
        let found = self.0.bindings.borrow().get(name).cloned();
        match found {
            Some(Value::View(view)) => self.refresh(&view, eval),
            Some(value) => Ok(value),
            None => match self.parent() {
                Some(parent) => parent.lookup(name, false, eval),
                None => Err(Error::Undefined(name.to_owned())),
            },
        }
    }

    fn refresh(&self, view: &Rc<View>, eval: Eval<'_>) -> Result<Value, Error> {
        let mut dirty = view.cache.borrow().is_none();
        for name in view.dependencies() {
            let current = if name == view.name {
                view.cache.borrow().clone()
            } else {
                Some(self.lookup(&name, false, eval)?)
            };
            let mut depends = view.depends.borrow_mut();
            let seen = depends.entry(name).or_insert(None);
            let changed = match (&*seen, &current) {
                (Some(old), Some(new)) => !old.matches(new),
                _ => true,
            };
            if changed {
                dirty = true;
                *seen = current;
            }
        }
        if dirty {
            tracing::trace!(view = %view.name, "recomputing view");
            let value = eval(&view.expr, self)?;
            *view.cache.borrow_mut() = Some(value.clone());
            if let Some(seen) = view.depends.borrow_mut().get_mut(&view.name) {
                *seen = Some(value);
            }
        }
        view.cache
            .borrow()
            .clone()
            .ok_or_else(|| Error::Undefined(view.name.clone()))
    }

    /// This scope's bindings as a symbol-keyed dict, sorted by name
    pub fn to_dict(&self) -> Value {
        let bindings = self.0.bindings.borrow();
        let mut names: Vec<&String> = bindings.keys().collect();
        names.sort();
        let mut d = Dict::default();
        for name in names {
            d.set(Value::Symbol(name.clone()), bindings[name].clone());
        }
        Value::Dict(Box::new(d))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}
