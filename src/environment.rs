use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// One lexical scope: a name→value map plus a link to the enclosing scope.
///
/// Environments are shared behind `Rc<RefCell<…>>` so closures keep the
/// scope they captured alive after the block that created it exits.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look up `name`, walking outward through enclosing scopes.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Assign to an existing binding, walking outward. Returns false when no
    /// scope binds `name`.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    /// The environment exactly `depth` hops out from `env`.
    pub fn ancestor(env: &Rc<RefCell<Environment>>, depth: usize) -> Rc<RefCell<Environment>> {
        let mut current: Rc<RefCell<Environment>> = env.clone();

        for _ in 0..depth {
            let next = current.borrow().enclosing.clone();
            match next {
                Some(enclosing) => current = enclosing,
                None => break,
            }
        }

        current
    }

    /// Read `name` from the scope `depth` hops out, as recorded by the
    /// resolver.
    pub fn get_at(env: &Rc<RefCell<Environment>>, depth: usize, name: &str) -> Option<Value> {
        Environment::ancestor(env, depth).borrow().values.get(name).cloned()
    }

    /// Write `name` in the scope `depth` hops out. Returns false when the
    /// binding is missing there.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        depth: usize,
        name: &str,
        value: Value,
    ) -> bool {
        let target = Environment::ancestor(env, depth);
        let mut target = target.borrow_mut();

        if target.values.contains_key(name) {
            target.values.insert(name.to_string(), value);
            true
        } else {
            false
        }
    }
}
