use std::rc::Rc;

use tracing::debug;

use crate::{
    Error, SchemyContext, SchemyObject,
    cons::list_to_vec,
    env::Env,
    error::Unwind,
    procedure::{Bounce, Lambda, Procedure},
    symbol::{Binding, Symbol},
    value::SchemyValue,
};

/// Evaluates `expr` in `env`. When `tail` is set, a call in tail position
/// is returned as [`Bounce::Call`] instead of being made.
pub(crate) fn eval(
    ctx: &mut SchemyContext,
    expr: &SchemyObject,
    env: &Env,
    tail: bool,
) -> Result<Bounce, Unwind> {
    let cons = match &*expr.inner_ref() {
        SchemyValue::Pair(cons) => cons.clone(),
        SchemyValue::Symbol(sym) => return Ok(Bounce::Done(env.resolve(sym)?)),
        _ => return Ok(Bounce::Done(expr.clone())),
    };
    let head = cons.car();
    let func = match head.symbol_rc() {
        Some(sym) => match env.lookup(&sym) {
            Some(_) => env.resolve(&sym)?,
            None => match sym.binding() {
                Binding::Special(form) => {
                    let operands = operands_of(expr, cons.cdr())?;
                    return form.invoke_special(ctx, operands, env, tail);
                }
                _ => sym.global_value()?,
            },
        },
        None => eval_value(ctx, head, env)?,
    };
    let func = func.as_procedure()?;
    let operands = operands_of(expr, cons.cdr())?;
    let mut args = Vec::with_capacity(operands.len());
    for operand in &operands {
        args.push(eval_value(ctx, operand, env)?);
    }
    apply_in_position(ctx, func, args, tail)
}

/// Applies `func` to `args`, or leaves the call to the trampoline when in
/// tail position.
pub(crate) fn apply_in_position(
    ctx: &mut SchemyContext,
    func: Procedure,
    args: Vec<SchemyObject>,
    tail: bool,
) -> Result<Bounce, Unwind> {
    if tail {
        Ok(Bounce::call(func, args))
    } else {
        Ok(Bounce::Done(func.invoke(ctx, args)?))
    }
}

fn operands_of(expr: &SchemyObject, operands: &SchemyObject) -> Result<Vec<SchemyObject>, Error> {
    list_to_vec(operands).ok_or_else(|| Error::syntax_error(format!("bad syntax {}", expr)))
}

/// Evaluates `expr` in non-tail position, to a value.
pub(crate) fn eval_value(
    ctx: &mut SchemyContext,
    expr: &SchemyObject,
    env: &Env,
) -> Result<SchemyObject, Unwind> {
    eval(ctx, expr, env, false)?.finish(ctx)
}

/// Evaluates `forms` in order. Only the last one is in tail position, and
/// an empty sequence yields `()`.
pub(crate) fn eval_sequence(
    ctx: &mut SchemyContext,
    forms: &[SchemyObject],
    env: &Env,
    tail: bool,
) -> Result<Bounce, Unwind> {
    let Some((last, init)) = forms.split_last() else {
        return Ok(Bounce::Done(SchemyObject::nil()));
    };
    for form in init {
        eval_value(ctx, form, env)?;
    }
    eval(ctx, last, env, tail)
}

/// Evaluates a body that may begin with internal definitions. The defined
/// names are all bound before any of their initializers run, so the
/// definitions can refer to each other in any order.
pub(crate) fn eval_body(
    ctx: &mut SchemyContext,
    body: &SchemyObject,
    env: &Env,
    tail: bool,
) -> Result<Bounce, Unwind> {
    let forms =
        list_to_vec(body).ok_or_else(|| Error::syntax_error(format!("bad body {}", body)))?;
    eval_body_forms(ctx, &forms, env, tail)
}

pub(crate) fn eval_body_forms(
    ctx: &mut SchemyContext,
    forms: &[SchemyObject],
    env: &Env,
    tail: bool,
) -> Result<Bounce, Unwind> {
    let define = ctx.keywords.define.clone();
    let split = forms
        .iter()
        .position(|form| form.head_symbol().is_none_or(|sym| !Rc::ptr_eq(&sym, &define)))
        .unwrap_or(forms.len());
    if split == 0 {
        return eval_sequence(ctx, forms, env, tail);
    }

    let mut definitions = Vec::with_capacity(split);
    let mut body_env = env.clone();
    for form in &forms[..split] {
        let (name, definition) = parse_define(&form.cdr()?)?;
        body_env = body_env.bind_placeholder(name.clone());
        definitions.push((name, definition));
    }
    for (name, definition) in definitions {
        let value = definition.evaluate(ctx, &name, &body_env)?;
        body_env.rec_bind(env, &name, value)?;
    }
    eval_sequence(ctx, &forms[split..], &body_env, tail)
}

/// Evaluates a form at top level, where `define`, `begin`, `trace` and
/// `untrace` have their top-level meaning.
pub(crate) fn eval_toplevel(
    ctx: &mut SchemyContext,
    expr: &SchemyObject,
) -> Result<SchemyObject, Unwind> {
    if let Some(head) = expr.head_symbol() {
        let keywords = ctx.keywords.clone();
        let operands = || -> Result<Vec<SchemyObject>, Error> {
            list_to_vec(&expr.cdr()?)
                .ok_or_else(|| Error::syntax_error(format!("bad syntax {}", expr)))
        };
        if Rc::ptr_eq(&head, &keywords.define) {
            return define_toplevel(ctx, &expr.cdr()?);
        } else if Rc::ptr_eq(&head, &keywords.begin) {
            let mut value = SchemyObject::nil();
            for form in operands()? {
                value = eval_toplevel(ctx, &form)?;
            }
            return Ok(value);
        } else if Rc::ptr_eq(&head, &keywords.trace) {
            return Ok(ctx.trace(&symbols_of(operands()?)?)?);
        } else if Rc::ptr_eq(&head, &keywords.untrace) {
            return Ok(ctx.untrace(&symbols_of(operands()?)?)?);
        }
    }
    eval_value(ctx, expr, &Env::new())
}

fn symbols_of(items: Vec<SchemyObject>) -> Result<Vec<Rc<Symbol>>, Error> {
    items
        .iter()
        .map(|item| {
            item.symbol_rc()
                .ok_or_else(|| Error::type_mismatch(format!("{} is not a symbol", item)))
        })
        .collect()
}

fn define_toplevel(ctx: &mut SchemyContext, operands: &SchemyObject) -> Result<SchemyObject, Unwind> {
    let (name, definition) = parse_define(operands)?;
    let value = definition.evaluate(ctx, &name, &Env::new())?;
    name.define(value)?;
    debug!(name = name.name(), "defined global");
    Ok(name.into())
}

/// The right-hand side of a `define`.
pub(crate) enum Definition {
    /// `(define name expr)`
    Value(SchemyObject),
    /// `(define (name . params) body...)`
    Procedure {
        params: SchemyObject,
        body: SchemyObject,
    },
}

impl Definition {
    /// Produces the value to bind to `name`. Anonymous closures are named
    /// after `name`.
    fn evaluate(
        self,
        ctx: &mut SchemyContext,
        name: &Rc<Symbol>,
        env: &Env,
    ) -> Result<SchemyObject, Unwind> {
        match self {
            Definition::Value(expr) => {
                let value = eval_value(ctx, &expr, env)?;
                name_closure(&value, name.name());
                Ok(value)
            }
            Definition::Procedure { params, body } => {
                Ok(make_lambda(Some(name.name()), params, body, env)?)
            }
        }
    }
}

/// Names `value` after `name` if it is an anonymous closure.
pub(crate) fn name_closure(value: &SchemyObject, name: &str) {
    if let SchemyValue::Procedure(Procedure::Lambda(lambda)) = &*value.inner_ref() {
        lambda.name_it(name);
    }
}

/// Splits the operands of a `define` form into the defined name and its
/// definition.
pub(crate) fn parse_define(operands: &SchemyObject) -> Result<(Rc<Symbol>, Definition), Error> {
    let Some(cons) = operands.as_pair() else {
        return Err(Error::syntax_error("too few arguments to define"));
    };
    let target = cons.car();
    if let Some(name) = target.symbol_rc() {
        let value = cons.cdr().as_pair().ok_or_else(|| {
            Error::syntax_error(format!("too few arguments to define {}", name.name()))
        })?;
        if !value.cdr().null() {
            return Err(Error::syntax_error("too many arguments to define"));
        }
        return Ok((name, Definition::Value(value.car().clone())));
    }
    match target.as_pair() {
        Some(signature) => {
            let name = signature.car().symbol_rc().ok_or_else(|| {
                Error::syntax_error(format!("bad procedure name {}", signature.car()))
            })?;
            Ok((
                name,
                Definition::Procedure {
                    params: signature.cdr().clone(),
                    body: cons.cdr().clone(),
                },
            ))
        }
        None => Err(Error::syntax_error(format!("cannot define {}", target))),
    }
}

/// Builds a closure after checking that `params` is a proper or dotted
/// list of symbols.
pub(crate) fn make_lambda(
    name: Option<&str>,
    params: SchemyObject,
    body: SchemyObject,
    env: &Env,
) -> Result<SchemyObject, Error> {
    let mut rest = params.clone();
    while let Some(cons) = rest.as_pair() {
        if !cons.car().symbolp() {
            return Err(Error::syntax_error(format!("bad parameter {}", cons.car())));
        }
        rest = cons.cdr().clone();
    }
    if !rest.null() && !rest.symbolp() {
        return Err(Error::syntax_error(format!("bad parameter list {}", params)));
    }
    let lambda = Lambda::new(name.map(Rc::from), params, body, env.clone());
    Ok(Procedure::Lambda(Rc::new(lambda)).into())
}

#[cfg(test)]
mod tests {
    use crate::{
        ErrorKind, SchemyContext,
        test_utils::{eval_assert_equal, eval_assert_error, eval_assert_error_kind},
    };

    #[test]
    fn test_self_evaluating_and_symbols() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(ctx, "42", "42");
        eval_assert_equal(ctx, r#""str""#, r#""str""#);
        eval_assert_equal(ctx, "#(1 2)", "#(1 2)");
        eval_assert_error(
            ctx,
            "nothing-here",
            "ERR Undefined: undefined variable nothing-here\nat top-level\n",
        );
    }

    #[test]
    fn test_toplevel_define() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(ctx, "(define x 10)", "'x");
        eval_assert_equal(ctx, "(define (add a b) (+ a b)) (add x 5)", "15");
        ctx.eval_string("(define f (lambda () 1))").unwrap();
        assert_eq!(ctx.eval_string("f").unwrap().to_string(), "#<procedure f>");
        eval_assert_equal(ctx, "(begin (define y 1) (define z 2)) (+ y z)", "3");
        eval_assert_error_kind(ctx, "(define x 1 2)", ErrorKind::SyntaxError);
        eval_assert_error_kind(ctx, "(define x)", ErrorKind::SyntaxError);
        eval_assert_error(
            ctx,
            "(define if 1)",
            "ERR SyntaxError: cannot define special form if\nat top-level\n",
        );
    }

    #[test]
    fn test_internal_defines() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(
            ctx,
            r#"(define (parity n)
                 (define (ev? n) (if (= n 0) #t (od? (- n 1))))
                 (define (od? n) (if (= n 0) #f (ev? (- n 1))))
                 (list (ev? n) (od? n)))
               (parity 7)"#,
            "'(#f #t)",
        );
        eval_assert_equal(
            ctx,
            "(let () (define a 1) (define b (lambda () a)) (b))",
            "1",
        );
        eval_assert_error_kind(
            ctx,
            "(let () (define a b) (define b 1) a)",
            ErrorKind::Uninitialized,
        );
        eval_assert_error_kind(
            ctx,
            "(let () (display \"\") (define a 1) a)",
            ErrorKind::SyntaxError,
        );
    }

    #[test]
    fn test_application() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(ctx, "((lambda (x . r) (list x r)) 1 2 3)", "'(1 (2 3))");
        eval_assert_equal(ctx, "((if #t + -) 3 2)", "5");
        eval_assert_error(
            ctx,
            "(5 1)",
            "ERR TypeMismatch: 5 is not a procedure\nat top-level\n",
        );
        eval_assert_error_kind(ctx, "(+ 1 . 2)", ErrorKind::SyntaxError);
        eval_assert_error(
            ctx,
            "(define (f a b) (car a)) (define (g) (+ 1 (f 1 2))) (g)",
            "ERR TypeMismatch: 1st argument 1 to car is not a pair\nBacktrace: car < g < top-level\n",
        );
        eval_assert_error(
            ctx,
            "(define (h a) (car a) 0) (h 1)",
            "ERR TypeMismatch: 1st argument 1 to car is not a pair\nBacktrace: car < h < top-level\n",
        );
    }
}
