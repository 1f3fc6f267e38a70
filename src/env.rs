use std::{cell::RefCell, rc::Rc};

use crate::{Error, SchemyObject, symbol::Symbol};

struct Frame {
    symbol: Rc<Symbol>,
    value: RefCell<SchemyObject>,
    next: Env,
}

/// A lexical environment: a singly linked chain of variable frames.
///
/// Binding a variable never mutates the chain it is added to, so closures
/// created in different scopes can safely share a common tail. Cloning an
/// `Env` is cheap.
#[derive(Clone, Default)]
pub struct Env(Option<Rc<Frame>>);

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = f.debug_list();
        let mut cur = self.0.as_ref();
        while let Some(frame) = cur {
            names.entry(&frame.symbol.name());
            cur = frame.next.0.as_ref();
        }
        names.finish()
    }
}

impl Env {
    /// The empty (top-level) environment.
    pub fn new() -> Self {
        Env(None)
    }

    /// Returns a new environment with `symbol` bound to `value` in front
    /// of `self`.
    pub(crate) fn bind(&self, symbol: Rc<Symbol>, value: SchemyObject) -> Env {
        Env(Some(Rc::new(Frame {
            symbol,
            value: RefCell::new(value),
            next: self.clone(),
        })))
    }

    /// Returns a new environment with a placeholder frame for `symbol`, to
    /// be filled in later with [`rec_bind`](Self::rec_bind).
    pub(crate) fn bind_placeholder(&self, symbol: Rc<Symbol>) -> Env {
        self.bind(symbol, SchemyObject::undefined())
    }

    pub(crate) fn same(&self, other: &Env) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn frame(&self, symbol: &Rc<Symbol>) -> Option<&Rc<Frame>> {
        let mut cur = self.0.as_ref();
        while let Some(frame) = cur {
            if Rc::ptr_eq(&frame.symbol, symbol) {
                return Some(frame);
            }
            cur = frame.next.0.as_ref();
        }
        None
    }

    /// Returns the lexical binding of `symbol`, ignoring globals.
    pub(crate) fn lookup(&self, symbol: &Rc<Symbol>) -> Option<SchemyObject> {
        self.frame(symbol).map(|frame| frame.value.borrow().clone())
    }

    /// Returns the value of `symbol` in the nearest frame binding it, or
    /// its global value.
    pub(crate) fn resolve(&self, symbol: &Rc<Symbol>) -> Result<SchemyObject, Error> {
        let value = match self.lookup(symbol) {
            Some(value) => value,
            None => symbol.global_value()?,
        };
        if value.is_undefined() {
            return Err(Error::uninitialized(format!(
                "variable {} used before its definition",
                symbol.name()
            )));
        }
        Ok(value)
    }

    /// Mutates the nearest frame binding `symbol`, falling back to its
    /// global binding.
    pub(crate) fn assign(&self, symbol: &Rc<Symbol>, value: SchemyObject) -> Result<(), Error> {
        match self.frame(symbol) {
            Some(frame) => {
                *frame.value.borrow_mut() = value;
                Ok(())
            }
            None => symbol.set_value(value),
        }
    }

    /// Fills in the placeholder frame for `symbol` created in `self` after
    /// `boundary`. Only frames newer than `boundary` are searched.
    pub(crate) fn rec_bind(
        &self,
        boundary: &Env,
        symbol: &Rc<Symbol>,
        value: SchemyObject,
    ) -> Result<(), Error> {
        let mut cur = self;
        while !cur.same(boundary) {
            let Some(frame) = cur.0.as_ref() else {
                break;
            };
            if Rc::ptr_eq(&frame.symbol, symbol) {
                *frame.value.borrow_mut() = value;
                return Ok(());
            }
            cur = &frame.next;
        }
        Err(Error::undefined(format!(
            "no local binding for {}",
            symbol.name()
        )))
    }

    /// Binds a proper or dotted parameter list positionally against `args`,
    /// in front of `self`. `name` is the procedure named in arity errors.
    pub(crate) fn bind_params(
        &self,
        params: &SchemyObject,
        args: Vec<SchemyObject>,
        name: &str,
    ) -> Result<Env, Error> {
        let mut env = self.clone();
        let mut args = args.into_iter();
        let mut params = params.clone();
        loop {
            let next = match params.as_pair() {
                Some(cons) => {
                    let Some(symbol) = cons.car().symbol_rc() else {
                        return Err(Error::syntax_error(format!(
                            "bad parameter {} to {}",
                            cons.car(),
                            name
                        )));
                    };
                    let Some(arg) = args.next() else {
                        return Err(Error::arity_mismatch(format!(
                            "too few arguments to {}",
                            name
                        )));
                    };
                    env = env.bind(symbol, arg);
                    cons.cdr().clone()
                }
                None => {
                    if let Some(rest) = params.symbol_rc() {
                        return Ok(env.bind(rest, args.collect()));
                    }
                    if args.next().is_some() {
                        return Err(Error::arity_mismatch(format!(
                            "too many arguments to {}",
                            name
                        )));
                    }
                    return Ok(env);
                }
            };
            params = next;
        }
    }
}
