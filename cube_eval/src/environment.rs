use std::{cell::RefCell, collections::HashMap, rc::Rc};

use log::debug;

use crate::object::Object;

/// A lexical scope: a name → value map with an optional parent link.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Env {
    values: HashMap<String, Object>,
    pub parent: Option<Rc<RefCell<Env>>>,
}

impl Env {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn with_parent(parent: Rc<RefCell<Env>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            parent: Some(parent),
            ..Default::default()
        }))
    }

    /// Walks the parent chain and returns the first binding found.
    pub fn get(&self, name: &str) -> Option<Object> {
        debug!("Get {name}");
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        self.parent
            .as_ref()
            .and_then(|parent| parent.borrow().get(name))
    }

    /// Always writes into this scope; `let` never reaches outward.
    pub fn set(&mut self, name: String, value: Object) {
        debug!("Set {name} -> {value:?}");
        self.values.insert(name, value);
    }
}
