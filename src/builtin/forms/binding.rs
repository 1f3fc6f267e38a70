use std::rc::Rc;

use super::clause_items;
use crate::{
    Error, SchemyContext, SchemyObject,
    cons::list_to_vec,
    env::Env,
    error::Unwind,
    eval::{apply_in_position, eval_body_forms, eval_sequence, eval_value, make_lambda, name_closure},
    macros::destruct_bind,
    primitive::Arguments,
    procedure::Bounce,
    symbol::Symbol,
};

/// One `(name init)` binding of a `let`-family form, or one
/// `(name init [step])` spec of a `do` loop.
struct VarSpec {
    symbol: Rc<Symbol>,
    init: SchemyObject,
    step: Option<SchemyObject>,
}

fn parse_bindings(bindings: &SchemyObject, form: &str, allow_step: bool) -> Result<Vec<VarSpec>, Error> {
    let items = list_to_vec(bindings)
        .ok_or_else(|| Error::syntax_error(format!("bad {} bindings {}", form, bindings)))?;
    items
        .iter()
        .map(|binding| {
            let parts = clause_items(binding, form)?;
            let bad = || Error::syntax_error(format!("bad {} binding {}", form, binding));
            let (name, init, step) = match parts.as_slice() {
                [name, init] => (name, init, None),
                [name, init, step] if allow_step => (name, init, Some(step.clone())),
                _ => return Err(bad()),
            };
            Ok(VarSpec {
                symbol: name.symbol_rc().ok_or_else(bad)?,
                init: init.clone(),
                step,
            })
        })
        .collect()
}

pub(crate) fn add(ctx: &mut SchemyContext) {
    fn named_let(
        ctx: &mut SchemyContext,
        name: Rc<Symbol>,
        operands: &[SchemyObject],
        env: &Env,
        tail: bool,
    ) -> Result<Bounce, Unwind> {
        destruct_bind!((bindings &rest body) = operands, "let");
        let bindings = parse_bindings(bindings, "let", false)?;
        let mut values = Vec::with_capacity(bindings.len());
        for binding in &bindings {
            values.push(eval_value(ctx, &binding.init, env)?);
        }
        let params: SchemyObject = bindings.iter().map(|b| b.symbol.clone().into()).collect();
        let loop_env = env.bind_placeholder(name.clone());
        let func = make_lambda(Some(name.name()), params, body.iter().cloned().collect(), &loop_env)?;
        loop_env.rec_bind(env, &name, func.clone())?;
        apply_in_position(ctx, func.as_procedure()?, values, tail)
    }

    fn impl_let(ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        if let Some((name, operands)) = args.rest().split_first() {
            if let Some(name) = name.symbol_rc() {
                return named_let(ctx, name, operands, args.env(), args.tail());
            }
        }
        destruct_bind!((bindings &rest body) = args.rest(), "let");
        let mut new_env = args.env().clone();
        for binding in parse_bindings(bindings, "let", false)? {
            let value = eval_value(ctx, &binding.init, args.env())?;
            new_env = new_env.bind(binding.symbol, value);
        }
        eval_body_forms(ctx, body, &new_env, args.tail())
    }
    ctx.add_special_form("let", impl_let);

    fn let_star(ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        destruct_bind!((bindings &rest body) = args.rest(), "let*");
        let mut new_env = args.env().clone();
        for binding in parse_bindings(bindings, "let*", false)? {
            let value = eval_value(ctx, &binding.init, &new_env)?;
            new_env = new_env.bind(binding.symbol, value);
        }
        eval_body_forms(ctx, body, &new_env, args.tail())
    }
    ctx.add_special_form("let*", let_star);

    fn letrec(ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        destruct_bind!((bindings &rest body) = args.rest(), "letrec");
        let bindings = parse_bindings(bindings, "letrec", false)?;
        let mut new_env = args.env().clone();
        for binding in &bindings {
            new_env = new_env.bind_placeholder(binding.symbol.clone());
        }
        for binding in &bindings {
            let value = eval_value(ctx, &binding.init, &new_env)?;
            name_closure(&value, binding.symbol.name());
            new_env.rec_bind(args.env(), &binding.symbol, value)?;
        }
        eval_body_forms(ctx, body, &new_env, args.tail())
    }
    ctx.add_special_form("letrec", letrec);

    fn impl_do(ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        destruct_bind!((specs exit &rest body) = args.rest(), "do");
        let specs = parse_bindings(specs, "do", true)?;
        let exit = clause_items(exit, "do")?;
        destruct_bind!((test &rest results) = &exit, "do");

        let env = args.env();
        let mut loop_env = env.clone();
        for spec in &specs {
            let value = eval_value(ctx, &spec.init, env)?;
            loop_env = loop_env.bind(spec.symbol.clone(), value);
        }
        while !eval_value(ctx, test, &loop_env)?.as_bool() {
            for form in body {
                eval_value(ctx, form, &loop_env)?;
            }
            // each iteration gets fresh frames, so closures made in the
            // body keep the values they saw
            let mut next_env = env.clone();
            for spec in &specs {
                let value = match &spec.step {
                    Some(step) => eval_value(ctx, step, &loop_env)?,
                    None => loop_env.resolve(&spec.symbol)?,
                };
                next_env = next_env.bind(spec.symbol.clone(), value);
            }
            loop_env = next_env;
        }
        eval_sequence(ctx, results, &loop_env, args.tail())
    }
    ctx.add_special_form("do", impl_do);
}

#[cfg(test)]
mod tests {
    use crate::{
        ErrorKind, SchemyContext,
        test_utils::{eval_assert_equal, eval_assert_error_kind},
    };

    #[test]
    fn test_let() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(ctx, "(let ((x 2) (y 3)) (* x y))", "6");
        eval_assert_equal(
            ctx,
            "(let ((x 2) (y 3)) (let ((x 7) (z (+ x y))) (* z x)))",
            "35",
        );
        eval_assert_equal(ctx, "(let () 5)", "5");
        eval_assert_equal(ctx, "(let ((x 1)))", "'()");
        eval_assert_error_kind(ctx, "(let ((x)) x)", ErrorKind::SyntaxError);
        eval_assert_error_kind(ctx, "(let ((1 2)) 1)", ErrorKind::SyntaxError);
        eval_assert_error_kind(ctx, "(let x)", ErrorKind::SyntaxError);
    }

    #[test]
    fn test_named_let() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(
            ctx,
            r#"(let loop ((numbers '(3 -2 1 6 -5)) (nonneg '()) (neg '()))
                 (cond ((null? numbers) (list nonneg neg))
                       ((>= (car numbers) 0)
                        (loop (cdr numbers) (cons (car numbers) nonneg) neg))
                       ((< (car numbers) 0)
                        (loop (cdr numbers) nonneg (cons (car numbers) neg)))))"#,
            "'((6 1 3) (-5 -2))",
        );
        eval_assert_equal(ctx, "(let loop ((i 0)) (if (< i 100000) (loop (+ i 1)) i))", "100000");
        // the loop name is not visible to the initializers
        eval_assert_error_kind(ctx, "(let f ((x f)) x)", ErrorKind::Undefined);
    }

    #[test]
    fn test_let_star_and_letrec() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(ctx, "(let ((x 2) (y 3)) (let* ((x 7) (z (+ x y))) (* z x)))", "70");
        eval_assert_equal(
            ctx,
            r#"(letrec ((even? (lambda (n) (if (zero? n) #t (odd? (- n 1)))))
                        (odd? (lambda (n) (if (zero? n) #f (even? (- n 1))))))
                 (even? 1001))"#,
            "#f",
        );
        eval_assert_error_kind(ctx, "(letrec ((a b) (b 1)) a)", ErrorKind::Uninitialized);
        ctx.eval_string("(define g (letrec ((h (lambda () 1))) h))").unwrap();
        assert_eq!(ctx.eval_string("g").unwrap().to_string(), "#<procedure h>");
    }

    #[test]
    fn test_do() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(
            ctx,
            "(do ((vec (make-vector 5)) (i 0 (+ i 1))) ((= i 5) vec) (vector-set! vec i i))",
            "#(0 1 2 3 4)",
        );
        eval_assert_equal(
            ctx,
            "(let ((x '(1 3 5 7 9))) (do ((x x (cdr x)) (sum 0 (+ sum (car x)))) ((null? x) sum)))",
            "25",
        );
        eval_assert_equal(ctx, "(do ((i 0 (+ i 1))) ((= i 3)))", "'()");
        eval_assert_equal(
            ctx,
            r#"(define procs '())
               (do ((i 0 (+ i 1))) ((= i 3))
                 (set! procs (cons (lambda () i) procs)))
               (map (lambda (p) (p)) procs)"#,
            "'(2 1 0)",
        );
        eval_assert_error_kind(ctx, "(do ((i 0 1 2)) (#t))", ErrorKind::SyntaxError);
        eval_assert_error_kind(ctx, "(do ((i 0)) ())", ErrorKind::SyntaxError);
    }
}
