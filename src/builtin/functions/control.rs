use crate::{
    Error, Rest, SchemyContext, SchemyObject,
    continuation::call_with_current_continuation,
    error::Unwind,
    primitive::{Arguments, Arity, FromArg, ListArg},
    procedure::{Bounce, Procedure},
};

/// Calls `func` on the elements of `lists` taken side by side, stopping
/// at the end of the shortest one.
fn map_lists(
    ctx: &mut SchemyContext,
    func: &Procedure,
    first: Vec<SchemyObject>,
    rest: Rest<ListArg>,
) -> Result<Vec<SchemyObject>, Error> {
    let lists: Vec<Vec<SchemyObject>> = std::iter::once(first)
        .chain(rest.into_iter().map(|ListArg(items)| items))
        .collect();
    let len = lists.iter().map(Vec::len).min().unwrap_or(0);
    let mut results = Vec::with_capacity(len);
    for i in 0..len {
        let args = lists.iter().map(|list| list[i].clone()).collect();
        results.push(func.invoke(ctx, args)?);
    }
    Ok(results)
}

pub(crate) fn add(ctx: &mut SchemyContext) {
    ctx.add_function("procedure?", |x: SchemyObject| x.procedurep());

    // The last argument is a list of further arguments. The call itself
    // is handed back to the trampoline, so `apply` in tail position
    // doesn't grow the stack.
    fn apply(_ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        let func = args.typed::<Procedure>(0)?;
        let mut spread = vec![];
        let last = match args.rest().split_last() {
            None => args.arg(1),
            Some((last, init)) => {
                spread.push(args.arg(1).clone());
                spread.extend(init.iter().cloned());
                last
            }
        };
        let ListArg(tail) = ListArg::from_arg(last).ok_or_else(|| {
            Error::type_mismatch(format!("last argument {} to apply is not a list", last))
        })?;
        spread.extend(tail);
        Ok(Bounce::call(func, spread))
    }
    ctx.add_primitive("apply", Arity::new(2, 0, true), apply);

    ctx.add_function(
        "map",
        |ctx: &mut SchemyContext,
         func: Procedure,
         ListArg(first): ListArg,
         rest: Rest<ListArg>|
         -> Result<SchemyObject, Error> {
            Ok(map_lists(ctx, &func, first, rest)?.into_iter().collect())
        },
    );

    ctx.add_function(
        "for-each",
        |ctx: &mut SchemyContext,
         func: Procedure,
         ListArg(first): ListArg,
         rest: Rest<ListArg>|
         -> Result<SchemyObject, Error> {
            map_lists(ctx, &func, first, rest)?;
            Ok(SchemyObject::nil())
        },
    );

    for name in ["call-with-current-continuation", "call/cc"] {
        ctx.add_function(
            name,
            |ctx: &mut SchemyContext, receiver: Procedure| -> Result<SchemyObject, Error> {
                Ok(call_with_current_continuation(ctx, &receiver)?)
            },
        );
    }

    // `(error message irritant...)`: the message is displayed, the
    // irritants are written after it.
    ctx.add_function(
        "error",
        |message: SchemyObject, irritants: Rest<SchemyObject>| -> Result<SchemyObject, Error> {
            let mut desc = message.fmt_string();
            for irritant in irritants {
                desc.push(' ');
                desc.push_str(&irritant.to_string());
            }
            Err(Error::lisp_error(desc))
        },
    );
}

#[cfg(test)]
mod tests {
    use crate::{
        ErrorKind, SchemyContext,
        test_utils::{SharedOutput, eval_assert, eval_assert_equal, eval_assert_error, eval_assert_error_kind, eval_assert_not},
    };

    #[test]
    fn test_apply() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(ctx, "(apply + '(1 2 3))", "6");
        eval_assert_equal(ctx, "(apply + 1 2 '(3 4))", "10");
        eval_assert_equal(ctx, "(apply list '())", "'()");
        eval_assert_equal(ctx, "(apply (lambda args args) 1 '(2))", "'(1 2)");
        eval_assert_equal(
            ctx,
            "(define (count n) (if (= n 0) 'done (apply count (list (- n 1))))) (count 100000)",
            "'done",
        );
        eval_assert_error(
            ctx,
            "(apply + 1 2)",
            "ERR TypeMismatch: last argument 2 to apply is not a list\nBacktrace: apply < top-level\n",
        );
        eval_assert_error(
            ctx,
            "(apply 5 '())",
            "ERR TypeMismatch: 1st argument 5 to apply is not a procedure\nBacktrace: apply < top-level\n",
        );
    }

    #[test]
    fn test_map_and_for_each() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(ctx, "(map cadr '((a b) (d e) (g h)))", "'(b e h)");
        eval_assert_equal(ctx, "(map + '(1 2 3) '(10 20 30))", "'(11 22 33)");
        eval_assert_equal(ctx, "(map + '(1 2 3) '(10 20))", "'(11 22)");
        eval_assert_equal(ctx, "(map car '())", "'()");
        eval_assert_error_kind(ctx, "(map car 5)", ErrorKind::TypeMismatch);
        eval_assert_error_kind(ctx, "(map car '(1 . 2))", ErrorKind::TypeMismatch);

        let out = SharedOutput::default();
        ctx.set_output(Box::new(out.clone()));
        eval_assert_equal(ctx, "(for-each (lambda (x y) (display (+ x y))) '(1 2) '(3 4))", "'()");
        assert_eq!(out.contents(), "46");
        eval_assert_equal(
            ctx,
            "(let ((v (make-vector 3 0))) (for-each (lambda (i) (vector-set! v i (* i i))) '(0 1 2)) v)",
            "#(0 1 4)",
        );
    }

    #[test]
    fn test_escape_through_map() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(
            ctx,
            "(call-with-current-continuation (lambda (k) (map (lambda (x) (if (< x 0) (k x) x)) '(1 -2 3))))",
            "-2",
        );
    }

    #[test]
    fn test_error() {
        let ctx = &mut SchemyContext::new();
        eval_assert_error(
            ctx,
            r#"(define (f x) (+ 1 (error "bad thing:" x "here"))) (f 'a)"#,
            "ERR LispError: bad thing: a \"here\"\nBacktrace: error < f < top-level\n",
        );
        eval_assert_error_kind(ctx, "(error 'oops)", ErrorKind::LispError);
    }

    #[test]
    fn test_procedure_predicate() {
        let ctx = &mut SchemyContext::new();
        eval_assert(ctx, "(procedure? car)");
        eval_assert(ctx, "(procedure? (lambda (x) x))");
        eval_assert(ctx, "(call/cc procedure?)");
        eval_assert_not(ctx, "(procedure? 'car)");
        eval_assert_not(ctx, "(procedure? '(lambda (x) x))");
    }
}
