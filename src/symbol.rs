use std::{cell::RefCell, rc::Rc};

use crate::{Error, SchemyObject, primitive::Primitive};

/// The global slot of a symbol. Variables and special forms share one
/// namespace.
#[derive(Clone)]
pub(crate) enum Binding {
    Unbound,
    Value(SchemyObject),
    Special(Rc<Primitive>),
}

/// An interned (or `gensym`ed) name, owning its global binding.
pub struct Symbol {
    name: String,
    binding: RefCell<Binding>,
    // Keyed by identity, as `eq?` compares.
    properties: RefCell<Vec<(SchemyObject, SchemyObject)>>,
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Symbol").field(&self.name).finish()
    }
}

impl Symbol {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Symbol {
            name: name.into(),
            binding: RefCell::new(Binding::Unbound),
            properties: RefCell::new(vec![]),
        }
    }

    /// Returns the name of the symbol.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn binding(&self) -> Binding {
        self.binding.borrow().clone()
    }

    /// Creates or overwrites the global value. Special forms can't be
    /// rebound.
    pub(crate) fn define(&self, value: SchemyObject) -> Result<(), Error> {
        let mut binding = self.binding.borrow_mut();
        if let Binding::Special(_) = *binding {
            return Err(Error::syntax_error(format!(
                "cannot define special form {}",
                self.name
            )));
        }
        *binding = Binding::Value(value);
        Ok(())
    }

    pub(crate) fn global_value(&self) -> Result<SchemyObject, Error> {
        match &*self.binding.borrow() {
            Binding::Value(value) => Ok(value.clone()),
            Binding::Special(_) => Err(Error::syntax_error(format!(
                "special form {} used as a variable",
                self.name
            ))),
            Binding::Unbound => Err(Error::undefined(format!("undefined variable {}", self.name))),
        }
    }

    /// `set!` on a global: the symbol must already hold an ordinary value.
    pub(crate) fn set_value(&self, value: SchemyObject) -> Result<(), Error> {
        match &mut *self.binding.borrow_mut() {
            Binding::Value(slot) => {
                *slot = value;
                Ok(())
            }
            _ => Err(Error::undefined(format!("undefined variable {}", self.name))),
        }
    }

    /// Installs a host binding, replacing any previous one. Returns `false`
    /// if the symbol was already bound.
    pub(crate) fn install(&self, binding: Binding) -> bool {
        let previous = std::mem::replace(&mut *self.binding.borrow_mut(), binding);
        matches!(previous, Binding::Unbound)
    }

    pub(crate) fn unbind(&self) {
        *self.binding.borrow_mut() = Binding::Unbound;
        self.properties.borrow_mut().clear();
    }

    /// Returns the property stored under `key`, if any.
    pub fn get_property(&self, key: &SchemyObject) -> Option<SchemyObject> {
        self.properties
            .borrow()
            .iter()
            .find(|(k, _)| k.eq(key))
            .map(|(_, value)| value.clone())
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put_property(&self, key: SchemyObject, value: SchemyObject) {
        let mut properties = self.properties.borrow_mut();
        match properties.iter_mut().find(|(k, _)| k.eq(&key)) {
            Some((_, slot)) => *slot = value,
            None => properties.push((key, value)),
        }
    }
}
