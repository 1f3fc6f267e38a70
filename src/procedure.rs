use std::{cell::RefCell, fmt, rc::Rc};

use crate::{
    SchemyContext, SchemyObject, continuation::Continuation, env::Env, error::Unwind, eval,
    primitive::Primitive,
};

/// A closure: a parameter list and a body, captured together with the
/// environment they were created in.
pub struct Lambda {
    name: RefCell<Option<Rc<str>>>,
    params: SchemyObject,
    body: SchemyObject,
    env: Env,
}

impl Lambda {
    pub(crate) fn new(
        name: Option<Rc<str>>,
        params: SchemyObject,
        body: SchemyObject,
        env: Env,
    ) -> Self {
        Lambda {
            name: RefCell::new(name),
            params,
            body,
            env,
        }
    }

    /// The name used in backtraces: the defining name, or `lambda`.
    pub fn name(&self) -> Rc<str> {
        self.name
            .borrow()
            .clone()
            .unwrap_or_else(|| Rc::from("lambda"))
    }

    /// Names an anonymous closure. A closure keeps the first name it gets.
    pub(crate) fn name_it(&self, name: &str) {
        let mut slot = self.name.borrow_mut();
        if slot.is_none() {
            *slot = Some(Rc::from(name));
        }
    }

    fn invoke0(&self, ctx: &mut SchemyContext, args: Vec<SchemyObject>) -> Result<Bounce, Unwind> {
        let name = self.name();
        let env = self
            .env
            .bind_params(&self.params, args, &name)
            .map_err(|e| Unwind::from(e.with_trace(&*name)))?;
        eval::eval_body(ctx, &self.body, &env, true).map_err(|e| e.with_trace(&name))
    }
}

/// Anything that can be applied to arguments: closures, host primitives
/// and escape continuations share this one calling convention.
#[derive(Clone)]
pub enum Procedure {
    Lambda(Rc<Lambda>),
    Primitive(Rc<Primitive>),
    Continuation(Rc<Continuation>),
}

impl Procedure {
    pub fn name(&self) -> String {
        match self {
            Procedure::Lambda(lambda) => lambda.name().to_string(),
            Procedure::Primitive(primitive) => primitive.name().to_string(),
            Procedure::Continuation(_) => "continuation".to_string(),
        }
    }

    pub(crate) fn ptr_eq(&self, other: &Procedure) -> bool {
        match (self, other) {
            (Procedure::Lambda(a), Procedure::Lambda(b)) => Rc::ptr_eq(a, b),
            (Procedure::Primitive(a), Procedure::Primitive(b)) => Rc::ptr_eq(a, b),
            (Procedure::Continuation(a), Procedure::Continuation(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Applies the procedure once. The result may be a pending tail call.
    pub(crate) fn invoke0(
        &self,
        ctx: &mut SchemyContext,
        args: Vec<SchemyObject>,
    ) -> Result<Bounce, Unwind> {
        match self {
            Procedure::Lambda(lambda) => lambda.invoke0(ctx, args),
            Procedure::Primitive(primitive) => primitive.invoke0(ctx, args),
            Procedure::Continuation(token) => Continuation::invoke0(token, args),
        }
    }

    /// Applies the procedure and runs pending tail calls until a value is
    /// reached.
    pub(crate) fn invoke(
        &self,
        ctx: &mut SchemyContext,
        args: Vec<SchemyObject>,
    ) -> Result<SchemyObject, Unwind> {
        self.invoke0(ctx, args)?.finish(ctx)
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Procedure::Lambda(lambda) => match &*lambda.name.borrow() {
                Some(name) => write!(f, "#<procedure {}>", name),
                None => f.write_str("#<procedure>"),
            },
            Procedure::Primitive(primitive) => write!(f, "#<procedure {}>", primitive.name()),
            Procedure::Continuation(_) => f.write_str("#<continuation>"),
        }
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A tail call waiting to be run by the trampoline.
pub struct Call {
    pub(crate) func: Procedure,
    pub(crate) args: Vec<SchemyObject>,
}

/// The result of one evaluation step: either a final value, or a call that
/// the caller has to make on the callee's behalf.
pub enum Bounce {
    Done(SchemyObject),
    Call(Call),
}

impl Bounce {
    /// Requests that `func` be applied to `args` in place of the current
    /// call.
    pub fn call(func: Procedure, args: Vec<SchemyObject>) -> Self {
        Bounce::Call(Call { func, args })
    }

    /// The trampoline: keeps making pending calls until one of them
    /// produces a value.
    pub(crate) fn finish(self, ctx: &mut SchemyContext) -> Result<SchemyObject, Unwind> {
        let mut bounce = self;
        loop {
            match bounce {
                Bounce::Done(value) => return Ok(value),
                Bounce::Call(Call { func, args }) => bounce = func.invoke0(ctx, args)?,
            }
        }
    }
}

impl From<SchemyObject> for Bounce {
    fn from(value: SchemyObject) -> Self {
        Bounce::Done(value)
    }
}
