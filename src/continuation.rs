use std::{cell::Cell, fmt, rc::Rc};

use tracing::trace;

use crate::{
    Error, SchemyContext, SchemyObject,
    error::Unwind,
    procedure::{Bounce, Procedure},
};

/// An escape-only continuation. It stays callable only while the
/// `call-with-current-continuation` that created it is still running.
pub struct Continuation {
    valid: Cell<bool>,
}

/// A continuation escape in flight, carrying the value back to the
/// `call-with-current-continuation` frame that created `token`.
#[derive(Clone)]
pub struct Escape {
    token: Rc<Continuation>,
    value: SchemyObject,
}

impl fmt::Debug for Escape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("continuation escape")
    }
}

impl fmt::Display for Escape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("continuation escape")
    }
}

impl Continuation {
    pub(crate) fn invoke0(token: &Rc<Continuation>, args: Vec<SchemyObject>) -> Result<Bounce, Unwind> {
        let mut args = args.into_iter();
        let value = match (args.next(), args.next()) {
            (Some(value), None) => value,
            (None, _) => {
                return Err(Error::arity_mismatch("too few arguments to continuation").into());
            }
            (Some(_), Some(_)) => {
                return Err(Error::arity_mismatch("too many arguments to continuation").into());
            }
        };
        if !token.valid.get() {
            return Err(Error::invalid_continuation("no continuation receiver").into());
        }
        trace!("escaping to continuation with {}", value);
        Err(Unwind::Escape(Escape {
            token: token.clone(),
            value,
        }))
    }
}

/// Calls `receiver` with a fresh escape continuation. Invoking that
/// continuation while `receiver` is running makes this call return the
/// value passed to it. Once this call returns, by either path, the
/// continuation is dead.
pub(crate) fn call_with_current_continuation(
    ctx: &mut SchemyContext,
    receiver: &Procedure,
) -> Result<SchemyObject, Unwind> {
    let token = Rc::new(Continuation {
        valid: Cell::new(true),
    });
    let k: SchemyObject = Procedure::Continuation(token.clone()).into();
    let result = receiver.invoke(ctx, vec![k]);
    token.valid.set(false);
    match result {
        Err(Unwind::Escape(escape)) if Rc::ptr_eq(&escape.token, &token) => {
            trace!("continuation escape caught with {}", escape.value);
            Ok(escape.value)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ErrorKind, SchemyContext,
        test_utils::{eval_assert_equal, eval_assert_error_kind},
    };

    #[test]
    fn test_escape() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(ctx, "(+ 1 (call/cc (lambda (k) (k 41) 999)))", "42");
        eval_assert_equal(ctx, "(call/cc (lambda (k) 7))", "7");
        eval_assert_equal(
            ctx,
            r#"(define (find-first pred lst)
                 (call/cc
                   (lambda (return)
                     (for-each (lambda (x) (if (pred x) (return x))) lst)
                     #f)))
               (find-first (lambda (x) (> x 2)) '(1 2 3 4))"#,
            "3",
        );
    }

    #[test]
    fn test_nested_escapes_reach_their_own_frame() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(
            ctx,
            "(call/cc (lambda (outer) (+ 1 (call/cc (lambda (inner) (outer 10))))))",
            "10",
        );
        eval_assert_equal(
            ctx,
            "(call/cc (lambda (outer) (+ 1 (call/cc (lambda (inner) (inner 10))))))",
            "11",
        );
    }

    #[test]
    fn test_dead_continuation() {
        let ctx = &mut SchemyContext::new();
        ctx.eval_string("(define saved #f) (call/cc (lambda (k) (set! saved k) 1))")
            .unwrap();
        eval_assert_error_kind(ctx, "(saved 5)", ErrorKind::InvalidContinuation);
        eval_assert_error_kind(
            ctx,
            "(call/cc (lambda (k) (k)))",
            ErrorKind::ArityMismatch,
        );
        eval_assert_error_kind(
            ctx,
            "(call/cc (lambda (k) (k 1 2)))",
            ErrorKind::ArityMismatch,
        );
    }
}
