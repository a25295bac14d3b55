//! Lexical environments.
//!
//! A frame maps names to values and points at its parent. Closures hold an
//! `Env`, so frames are reference counted and mutated through `RefCell`.

use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use crate::atoms::AtomRegistry;
use crate::runtime::value::Value;

#[derive(Clone, Default)]
pub struct Env(Rc<Frame>);

#[derive(Default)]
struct Frame {
    vars: RefCell<HashMap<String, Value>>,
    parent: Option<Env>,
}

impl Env {
    /// A fresh global environment with every registered atom bound.
    pub fn global(registry: &AtomRegistry) -> Self {
        let env = Env::default();
        for (name, native) in registry.atoms.iter() {
            env.define(name, Value::Native(*native));
        }
        env
    }

    pub fn child(&self) -> Self {
        Env(Rc::new(Frame {
            vars: RefCell::default(),
            parent: Some(self.clone()),
        }))
    }

    /// Binds `name` in this frame, shadowing any outer binding.
    pub fn define(&self, name: &str, value: Value) {
        self.0.vars.borrow_mut().insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let mut frame = Some(self);
        while let Some(env) = frame {
            if let Some(value) = env.0.vars.borrow().get(name) {
                return Some(value.clone());
            }
            frame = env.0.parent.as_ref();
        }
        None
    }

    /// Assigns to the nearest existing binding of `name`; without one, the
    /// name is defined in the global frame.
    pub fn set(&self, name: &str, value: Value) {
        let mut frame = self;
        loop {
            if let Some(slot) = frame.0.vars.borrow_mut().get_mut(name) {
                *slot = value;
                return;
            }
            match &frame.0.parent {
                Some(parent) => frame = parent,
                None => break,
            }
        }
        frame.define(name, value);
    }

    pub fn downgrade(&self) -> WeakEnv {
        WeakEnv(Rc::downgrade(&self.0))
    }

    /// Drops every binding of this frame.
    ///
    /// Closures stored in a frame point back at it; clearing the frame breaks
    /// those cycles once a program's scope is no longer needed.
    pub fn clear(&self) {
        let vars = std::mem::take(&mut *self.0.vars.borrow_mut());
        drop(vars);
    }
}

/// A scope reference that does not keep the scope alive.
#[derive(Clone)]
pub struct WeakEnv(Weak<Frame>);

impl WeakEnv {
    pub fn upgrade(&self) -> Option<Env> {
        self.0.upgrade().map(Env)
    }

    pub fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub fn points_to(&self, env: &Env) -> bool {
        std::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&env.0))
    }
}

impl std::fmt::Debug for WeakEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WeakEnv").field(&self.is_live()).finish()
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.0.vars.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Env")
            .field("names", &names)
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}
