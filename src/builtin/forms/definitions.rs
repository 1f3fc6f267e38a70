use std::time::Instant;

use crate::{
    Error, SchemyContext,
    error::Unwind,
    eval::{eval_sequence, eval_value, make_lambda},
    macros::destruct_bind,
    primitive::Arguments,
    procedure::Bounce,
};

pub(crate) fn add(ctx: &mut SchemyContext) {
    fn lambda(_ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        destruct_bind!((params &rest body) = args.rest(), "lambda");
        let func = make_lambda(None, params.clone(), body.iter().cloned().collect(), args.env())?;
        Ok(Bounce::Done(func))
    }
    ctx.add_special_form("lambda", lambda);

    // Top-level and body-prefix definitions never get here.
    fn define(_ctx: &mut SchemyContext, _args: Arguments) -> Result<Bounce, Unwind> {
        Err(Error::syntax_error("define in a bad place").into())
    }
    ctx.add_special_form("define", define);

    fn set(ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        destruct_bind!((target value) = args.rest(), "set!");
        let symbol = target
            .symbol_rc()
            .ok_or_else(|| Error::syntax_error(format!("cannot set! {}", target)))?;
        let value = eval_value(ctx, value, args.env())?;
        args.env().assign(&symbol, value.clone())?;
        Ok(Bounce::Done(value))
    }
    ctx.add_special_form("set!", set);

    fn begin(ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        eval_sequence(ctx, args.rest(), args.env(), args.tail())
    }
    ctx.add_special_form("begin", begin);

    fn time(ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        destruct_bind!((expr) = args.rest(), "time");
        let start = Instant::now();
        let value = eval_value(ctx, expr, args.env())?;
        let secs = start.elapsed().as_secs_f64();
        ctx.print(&format!("time: {} secs\n", secs))?;
        Ok(Bounce::Done(value))
    }
    ctx.add_special_form("time", time);
}

#[cfg(test)]
mod tests {
    use crate::{
        ErrorKind, SchemyContext,
        test_utils::{SharedOutput, eval_assert_equal, eval_assert_error, eval_assert_error_kind},
    };

    #[test]
    fn test_lambda() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(ctx, "((lambda (x y) (+ x y)) 3 4)", "7");
        eval_assert_equal(ctx, "((lambda args args) 1 2)", "'(1 2)");
        eval_assert_equal(ctx, "((lambda (a . b) b) 1)", "'()");
        assert_eq!(
            ctx.eval_string("(lambda (x) x)").unwrap().to_string(),
            "#<procedure>"
        );
        eval_assert_error_kind(ctx, "(lambda (x 1) x)", ErrorKind::SyntaxError);
        eval_assert_error_kind(ctx, "(lambda (x . 1) x)", ErrorKind::SyntaxError);
        eval_assert_error(
            ctx,
            "((lambda (x y) x) 1)",
            "ERR ArityMismatch: too few arguments to lambda\nBacktrace: lambda < top-level\n",
        );
    }

    #[test]
    fn test_define_in_a_bad_place() {
        let ctx = &mut SchemyContext::new();
        eval_assert_error(
            ctx,
            "(if #t (define x 1))",
            "ERR SyntaxError: define in a bad place\nBacktrace: define < if < top-level\n",
        );
    }

    #[test]
    fn test_set() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(ctx, "(define x 1) (set! x 5) x", "5");
        eval_assert_equal(ctx, "(let ((y 1)) (set! y (+ y 1)) y)", "2");
        eval_assert_equal(ctx, "(set! x 7)", "7");
        eval_assert_error_kind(ctx, "(set! never-defined 1)", ErrorKind::Undefined);
        eval_assert_error_kind(ctx, "(set! if 1)", ErrorKind::Undefined);
        eval_assert_error_kind(ctx, "(set! 5 1)", ErrorKind::SyntaxError);
        eval_assert_error_kind(ctx, "(set! x)", ErrorKind::SyntaxError);
    }

    #[test]
    fn test_begin_and_time() {
        let ctx = &mut SchemyContext::new();
        let out = SharedOutput::default();
        ctx.set_output(Box::new(out.clone()));
        eval_assert_equal(ctx, "(begin)", "'()");
        eval_assert_equal(ctx, "(let () (begin 1 2 3))", "3");
        eval_assert_equal(ctx, "(time (+ 1 2))", "3");
        let printed = out.contents();
        assert!(printed.starts_with("time: "), "{}", printed);
        assert!(printed.ends_with(" secs\n"), "{}", printed);
    }
}
