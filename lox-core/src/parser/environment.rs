//! Environment frames for lexical scoping
//!
//! Each block entry or function call creates one frame whose parent is the
//! frame it was created in (blocks) or the callee's captured closure frame
//! (calls). Frames are shared: every closure declared in a frame, and every
//! active call running in it, holds a reference.

use crate::types::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared, mutable handle to a frame; mutation is visible to every holder
pub type SharedEnvironment = Rc<RefCell<Environment>>;

/// One binding frame plus a link to its enclosing frame
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<SharedEnvironment>,
}

impl Environment {
    /// Create a global frame (no parent)
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// Create a frame nested inside `enclosing`
    pub fn with_enclosing(enclosing: SharedEnvironment) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn into_shared(self) -> SharedEnvironment {
        Rc::new(RefCell::new(self))
    }

    pub fn enclosing(&self) -> Option<SharedEnvironment> {
        self.enclosing.clone()
    }

    /// Bind `name` in this frame; rebinding silently replaces
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Look up `name` in this frame only
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Update an existing binding in this frame only
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), String> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(format!("Undefined variable '{}'.", name)),
        }
    }

    /// Walk exactly `distance` parent links
    pub fn ancestor(env: &SharedEnvironment, distance: usize) -> Option<SharedEnvironment> {
        let mut current = Rc::clone(env);
        for _ in 0..distance {
            let parent = current.borrow().enclosing()?;
            current = parent;
        }
        Some(current)
    }

    /// Read `name` from the frame exactly `distance` links up
    pub fn get_at(env: &SharedEnvironment, distance: usize, name: &str) -> Option<Value> {
        Self::ancestor(env, distance)?.borrow().get(name)
    }

    /// Assign `name` in the frame exactly `distance` links up
    pub fn assign_at(
        env: &SharedEnvironment,
        distance: usize,
        name: &str,
        value: Value,
    ) -> Result<(), String> {
        match Self::ancestor(env, distance) {
            Some(frame) => frame.borrow_mut().assign(name, value),
            None => Err(format!("Undefined variable '{}'.", name)),
        }
    }

    /// Bindings in this frame, sorted by name (for introspection)
    pub fn bindings(&self) -> Vec<(&String, &Value)> {
        let mut bindings: Vec<_> = self.values.iter().collect();
        bindings.sort_by(|a, b| a.0.cmp(b.0));
        bindings
    }
}
