use std::{any::Any, rc::Rc};

use crate::{
    Error, SchemyContext, SchemyObject,
    cons::Cons,
    env::Env,
    error::Unwind,
    procedure::{Bounce, Procedure},
    symbol::Symbol,
    value::SchemyValue,
};

/// The shape of the argument list a primitive accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub required: usize,
    pub optional: usize,
    pub rest: bool,
}

impl Arity {
    pub const fn new(required: usize, optional: usize, rest: bool) -> Self {
        Arity {
            required,
            optional,
            rest,
        }
    }

    /// Any number of arguments, all collected in the rest list.
    pub const fn variadic() -> Self {
        Arity::new(0, 0, true)
    }
}

pub(crate) type PrimitiveFn = dyn Fn(&mut SchemyContext, Arguments) -> Result<Bounce, Unwind>;

/// A host function registered under a name, with its declared arity.
pub struct Primitive {
    name: Rc<str>,
    arity: Arity,
    func: Box<PrimitiveFn>,
}

impl Primitive {
    pub(crate) fn new(name: &str, arity: Arity, func: Box<PrimitiveFn>) -> Self {
        Primitive {
            name: Rc::from(name),
            arity,
            func,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Splits `args` according to the arity, and fails with an arity error
    /// when there are too few or too many.
    fn normalize(&self, args: Vec<SchemyObject>, env: Env, tail: bool) -> Result<Arguments, Error> {
        let Arity {
            required,
            optional,
            rest,
        } = self.arity;
        if args.len() < required {
            return Err(Error::arity_mismatch(format!(
                "too few arguments to {}",
                self.name
            )));
        }
        if !rest && args.len() > required + optional {
            return Err(Error::arity_mismatch(format!(
                "too many arguments to {}",
                self.name
            )));
        }
        let mut args = args.into_iter();
        let req = args.by_ref().take(required).collect();
        let opt = (0..optional).map(|_| args.next()).collect();
        Ok(Arguments {
            name: self.name.clone(),
            required: req,
            optional: opt,
            rest: args.collect(),
            env,
            tail,
        })
    }

    /// Invokes the primitive as an ordinary procedure.
    pub(crate) fn invoke0(&self, ctx: &mut SchemyContext, args: Vec<SchemyObject>) -> Result<Bounce, Unwind> {
        self.dispatch(ctx, args, Env::new(), false)
    }

    /// Invokes the primitive as a special form, with its unevaluated
    /// operands, the caller's environment and tail-position flag.
    pub(crate) fn invoke_special(
        &self,
        ctx: &mut SchemyContext,
        operands: Vec<SchemyObject>,
        env: &Env,
        tail: bool,
    ) -> Result<Bounce, Unwind> {
        self.dispatch(ctx, operands, env.clone(), tail)
    }

    fn dispatch(
        &self,
        ctx: &mut SchemyContext,
        args: Vec<SchemyObject>,
        env: Env,
        tail: bool,
    ) -> Result<Bounce, Unwind> {
        let args = self
            .normalize(args, env, tail)
            .map_err(|e| Unwind::from(e.with_trace(&*self.name)))?;
        (self.func)(ctx, args).map_err(|e| e.with_trace(&self.name))
    }
}

/// The arguments a primitive is called with, already checked against its
/// arity.
pub struct Arguments {
    name: Rc<str>,
    required: Vec<SchemyObject>,
    optional: Vec<Option<SchemyObject>>,
    rest: Vec<SchemyObject>,
    env: Env,
    tail: bool,
}

impl Arguments {
    /// The name the primitive was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `i`th required argument.
    ///
    /// Panics if `i` is not below the declared number of required
    /// arguments.
    pub fn arg(&self, i: usize) -> &SchemyObject {
        &self.required[i]
    }

    /// The `i`th optional argument, if the caller supplied it.
    pub fn opt(&self, i: usize) -> Option<&SchemyObject> {
        self.optional.get(i).and_then(|o| o.as_ref())
    }

    /// The arguments beyond the required and optional ones.
    pub fn rest(&self) -> &[SchemyObject] {
        &self.rest
    }

    /// The rest arguments as a fresh list.
    pub fn rest_list(&self) -> SchemyObject {
        self.rest.iter().cloned().collect()
    }

    /// The caller's environment. Empty unless called as a special form.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Whether a special form was called in tail position.
    pub fn tail(&self) -> bool {
        self.tail
    }

    /// Converts the `i`th required argument to `T`.
    pub fn typed<T: FromArg>(&self, i: usize) -> Result<T, Error> {
        self.convert(i, &self.required[i])
    }

    /// Converts the `i`th optional argument to `T`, if present.
    pub fn typed_opt<T: FromArg>(&self, i: usize) -> Result<Option<T>, Error> {
        match self.opt(i) {
            Some(arg) => self.convert(self.required.len() + i, arg).map(Some),
            None => Ok(None),
        }
    }

    /// Converts every rest argument to `T`.
    pub fn typed_rest<T: FromArg>(&self) -> Result<Vec<T>, Error> {
        let offset = self.required.len() + self.optional.len();
        self.rest
            .iter()
            .enumerate()
            .map(|(i, arg)| self.convert(offset + i, arg))
            .collect()
    }

    fn convert<T: FromArg>(&self, position: usize, arg: &SchemyObject) -> Result<T, Error> {
        T::from_arg(arg).ok_or_else(|| {
            Error::type_mismatch(format!(
                "{} argument {} to {} is not {}",
                ordinal(position + 1),
                arg,
                self.name,
                T::KIND
            ))
        })
    }
}

pub(crate) fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// Conversion from a Schemy value to a host type, for typed primitive
/// arguments.
pub trait FromArg: Sized {
    /// Names the expected kind of value in type errors, e.g. `"a string"`.
    const KIND: &'static str;

    fn from_arg(arg: &SchemyObject) -> Option<Self>;
}

macro_rules! from_arg_impl {
    ($ty: ty, $kind: literal, $($pat: pat => $out: expr),+ $(,)?) => {
        impl FromArg for $ty {
            const KIND: &'static str = $kind;

            fn from_arg(arg: &SchemyObject) -> Option<Self> {
                match &*arg.inner_ref() {
                    $($pat => Some($out),)+
                    _ => None,
                }
            }
        }
    };
}

from_arg_impl!(i64, "an integer", SchemyValue::Int(vv) => *vv);
from_arg_impl!(
    f64,
    "a number",
    SchemyValue::Float(vv) => *vv,
    SchemyValue::Int(vv) => *vv as f64,
);
from_arg_impl!(String, "a string", SchemyValue::String(vv) => vv.clone());
from_arg_impl!(char, "a character", SchemyValue::Char(vv) => *vv);
from_arg_impl!(Cons, "a pair", SchemyValue::Pair(cons) => cons.clone());
from_arg_impl!(Procedure, "a procedure", SchemyValue::Procedure(func) => func.clone());
from_arg_impl!(Rc<Symbol>, "a symbol", SchemyValue::Symbol(sym) => sym.clone());
from_arg_impl!(Rc<dyn Any>, "an object", SchemyValue::Any(vv) => vv.clone());

impl FromArg for SchemyObject {
    const KIND: &'static str = "an object";

    fn from_arg(arg: &SchemyObject) -> Option<Self> {
        Some(arg.clone())
    }
}

/// Any value can be used as a condition.
impl FromArg for bool {
    const KIND: &'static str = "a boolean";

    fn from_arg(arg: &SchemyObject) -> Option<Self> {
        Some(arg.as_bool())
    }
}

/// A number argument that keeps track of whether it was exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(vv) => vv as f64,
            Number::Float(vv) => vv,
        }
    }
}

from_arg_impl!(
    Number,
    "a number",
    SchemyValue::Int(vv) => Number::Int(*vv),
    SchemyValue::Float(vv) => Number::Float(*vv),
);

impl From<Number> for SchemyObject {
    fn from(num: Number) -> Self {
        match num {
            Number::Int(vv) => vv.into(),
            Number::Float(vv) => vv.into(),
        }
    }
}

/// A list argument: `()` or a proper list, as its elements.
pub struct ListArg(pub Vec<SchemyObject>);

impl FromArg for ListArg {
    const KIND: &'static str = "a list";

    fn from_arg(arg: &SchemyObject) -> Option<Self> {
        if !arg.listp() {
            return None;
        }
        crate::cons::list_to_vec(arg).map(ListArg)
    }
}

/// A pair argument, as a handle to the shared pair, for procedures that
/// mutate it.
pub struct PairArg(pub SchemyObject);

impl FromArg for PairArg {
    const KIND: &'static str = "a pair";

    fn from_arg(arg: &SchemyObject) -> Option<Self> {
        arg.consp().then(|| PairArg(arg.clone()))
    }
}

/// A vector argument, as a handle to the shared vector.
pub struct VectorArg(pub SchemyObject);

impl FromArg for VectorArg {
    const KIND: &'static str = "a vector";

    fn from_arg(arg: &SchemyObject) -> Option<Self> {
        arg.vectorp().then(|| VectorArg(arg.clone()))
    }
}

/// A string argument, as a handle to the shared string, for procedures
/// that mutate it.
pub struct StringArg(pub SchemyObject);

impl FromArg for StringArg {
    const KIND: &'static str = "a string";

    fn from_arg(arg: &SchemyObject) -> Option<Self> {
        arg.stringp().then(|| StringArg(arg.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, test_utils::eval_assert_error};

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(22), "22nd");
    }

    #[test]
    fn test_normalize() {
        let ctx = &mut SchemyContext::without_builtins();
        ctx.add_primitive("opt", Arity::new(1, 2, false), |_ctx, args| {
            let items: SchemyObject = vec![
                args.arg(0).clone(),
                args.opt(0).cloned().unwrap_or_else(|| "none".into()),
                args.opt(1).cloned().unwrap_or_else(|| "none".into()),
            ]
            .into_iter()
            .collect();
            Ok(items.into())
        });
        assert_eq!(
            ctx.eval_string("(opt 1)").unwrap().to_string(),
            r#"(1 "none" "none")"#
        );
        assert_eq!(
            ctx.eval_string("(opt 1 2)").unwrap().to_string(),
            r#"(1 2 "none")"#
        );
        let err = ctx.eval_string("(opt)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArityMismatch);
        assert_eq!(err.desc(), "too few arguments to opt");
        let err = ctx.eval_string("(opt 1 2 3 4)").unwrap_err();
        assert_eq!(err.desc(), "too many arguments to opt");
        assert_eq!(err.backtrace(), ["opt".to_string()]);
    }

    #[test]
    fn test_typed_argument_errors() {
        let ctx = &mut SchemyContext::new();
        eval_assert_error(
            ctx,
            "(car 5)",
            "ERR TypeMismatch: 1st argument 5 to car is not a pair\nBacktrace: car < top-level\n",
        );
        eval_assert_error(
            ctx,
            r#"(vector-ref (vector 1 2) "x")"#,
            "ERR TypeMismatch: 2nd argument \"x\" to vector-ref is not an integer\nBacktrace: vector-ref < top-level\n",
        );
    }
}
