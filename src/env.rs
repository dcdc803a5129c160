// ABOUTME: Lexical scope frames for variable bindings

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::RuntimeError;
use crate::value::Value;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<IndexMap<String, Value>>,
    consts: RefCell<HashSet<String>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global frame with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(IndexMap::new()),
            consts: RefCell::new(HashSet::new()),
            parent: None,
        })
    }

    /// Creates a child frame enclosing `parent`.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(IndexMap::new()),
            consts: RefCell::new(HashSet::new()),
            parent: Some(parent),
        })
    }

    /// Defines a binding in THIS frame, shadowing any outer binding of the
    /// same name. Constness does not propagate to inner shadowing (§3).
    pub fn define(&self, name: impl Into<String>, value: Value, is_const: bool) {
        let name = name.into();
        if is_const {
            self.consts.borrow_mut().insert(name.clone());
        } else {
            self.consts.borrow_mut().remove(&name);
        }
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Walks the chain outward for a binding.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Climbs to the outermost (global) frame — used by module imports,
    /// which execute in a fresh frame enclosing the globals rather than
    /// the importer's immediate scope (§4.3).
    pub fn global(self: &Rc<Self>) -> Rc<Environment> {
        let mut current = self.clone();
        while let Some(parent) = current.parent.clone() {
            current = parent;
        }
        current
    }

    /// Walks the chain outward, reassigning the first frame that already
    /// defines `name`. Fails if the name is undefined or marked const.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if self.bindings.borrow().contains_key(name) {
            if self.consts.borrow().contains(name) {
                return Err(RuntimeError::ConstReassignment(name.to_string()));
            }
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        }

        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(RuntimeError::UndefinedVariable(name.to_string())),
        }
    }
}
