use std::rc::Rc;

use super::clause_items;
use crate::{
    Error, SchemyContext, SchemyObject,
    env::Env,
    error::Unwind,
    eval::{apply_in_position, eval, eval_sequence, eval_value},
    macros::destruct_bind,
    primitive::Arguments,
    procedure::Bounce,
    symbol::Symbol,
};

/// Runs the body of a selected `cond` or `case` clause. `value` is the
/// test value, handed to the receiver of a `=>` clause or returned when
/// the body is empty.
fn clause_body(
    ctx: &mut SchemyContext,
    value: SchemyObject,
    body: &[SchemyObject],
    env: &Env,
    tail: bool,
    arrow: &Rc<Symbol>,
) -> Result<Bounce, Unwind> {
    match body {
        [] => Ok(Bounce::Done(value)),
        [head, receiver] if head.is_symbol(arrow) => {
            let receiver = eval_value(ctx, receiver, env)?.as_procedure()?;
            apply_in_position(ctx, receiver, vec![value], tail)
        }
        [head, ..] if head.is_symbol(arrow) => {
            Err(Error::syntax_error("=> takes exactly one receiver").into())
        }
        body => eval_sequence(ctx, body, env, tail),
    }
}

pub(crate) fn add(ctx: &mut SchemyContext) {
    fn impl_if(ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        destruct_bind!((condition then &optional otherwise) = args.rest(), "if");
        if eval_value(ctx, condition, args.env())?.as_bool() {
            eval(ctx, then, args.env(), args.tail())
        } else if let Some(otherwise) = otherwise {
            eval(ctx, otherwise, args.env(), args.tail())
        } else {
            Ok(Bounce::Done(SchemyObject::nil()))
        }
    }
    ctx.add_special_form("if", impl_if);

    fn cond(ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        let else_ = ctx.keywords.else_.clone();
        let arrow = ctx.keywords.arrow.clone();
        for clause in args.rest() {
            let items = clause_items(clause, "cond")?;
            destruct_bind!((test &rest body) = &items, "cond clause");
            let value = if test.is_symbol(&else_) {
                true.into()
            } else {
                eval_value(ctx, test, args.env())?
            };
            if value.as_bool() {
                return clause_body(ctx, value, body, args.env(), args.tail(), &arrow);
            }
        }
        Ok(Bounce::Done(SchemyObject::nil()))
    }
    ctx.add_special_form("cond", cond);

    fn case(ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        let else_ = ctx.keywords.else_.clone();
        let arrow = ctx.keywords.arrow.clone();
        destruct_bind!((key &rest clauses) = args.rest(), "case");
        let key = eval_value(ctx, key, args.env())?;
        for clause in clauses {
            let items = clause_items(clause, "case")?;
            destruct_bind!((data &rest body) = &items, "case clause");
            let matched = if data.is_symbol(&else_) {
                true
            } else if data.listp() {
                data.base_iter().any(|datum| datum.eqv(&key))
            } else {
                return Err(Error::syntax_error(format!("bad case clause {}", clause)).into());
            };
            if matched {
                return clause_body(ctx, key, body, args.env(), args.tail(), &arrow);
            }
        }
        Ok(Bounce::Done(SchemyObject::nil()))
    }
    ctx.add_special_form("case", case);

    fn and(ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        let Some((last, init)) = args.rest().split_last() else {
            return Ok(Bounce::Done(true.into()));
        };
        for item in init {
            let value = eval_value(ctx, item, args.env())?;
            if !value.as_bool() {
                return Ok(Bounce::Done(value));
            }
        }
        eval(ctx, last, args.env(), args.tail())
    }
    ctx.add_special_form("and", and);

    fn or(ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        let Some((last, init)) = args.rest().split_last() else {
            return Ok(Bounce::Done(false.into()));
        };
        for item in init {
            let value = eval_value(ctx, item, args.env())?;
            if value.as_bool() {
                return Ok(Bounce::Done(value));
            }
        }
        eval(ctx, last, args.env(), args.tail())
    }
    ctx.add_special_form("or", or);
}

#[cfg(test)]
mod tests {
    use crate::{
        ErrorKind, SchemyContext,
        test_utils::{eval_assert, eval_assert_equal, eval_assert_error_kind, eval_assert_not},
    };

    #[test]
    fn test_if() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(ctx, "(if '() 1 2)", "1");
        eval_assert_equal(ctx, "(if #f 1 2)", "2");
        eval_assert_equal(ctx, "(if #f 1)", "'()");
        eval_assert_equal(ctx, "(if 0 'yes)", "'yes");
        eval_assert_error_kind(ctx, "(if)", ErrorKind::SyntaxError);
        eval_assert_error_kind(ctx, "(if 1 2 3 4)", ErrorKind::SyntaxError);
    }

    #[test]
    fn test_cond() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(
            ctx,
            "(define (sign n) (cond ((< n 0) 'neg) ((= n 0) 'zero) (else 'pos))) (list (sign -3) (sign 0) (sign 9))",
            "'(neg zero pos)",
        );
        eval_assert_equal(ctx, "(cond (#f 1))", "'()");
        eval_assert_equal(ctx, "(cond ((memv 2 '(1 2 3))))", "'(2 3)");
        eval_assert_equal(ctx, "(cond ((assv 'b '((a 1) (b 2))) => cadr) (else #f))", "2");
        eval_assert_error_kind(ctx, "(cond (#t => car cdr))", ErrorKind::SyntaxError);
        eval_assert_error_kind(ctx, "(cond 5)", ErrorKind::SyntaxError);
    }

    #[test]
    fn test_case() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(
            ctx,
            "(case (* 2 3) ((2 3 5 7) 'prime) ((1 4 6 8 9) 'composite))",
            "'composite",
        );
        eval_assert_equal(ctx, "(case (car '(c d)) ((a e i o u) 'vowel) ((w y) 'semivowel) (else 'consonant))", "'consonant");
        eval_assert_equal(ctx, "(case 2.0 ((2) 'two) (else 'other))", "'two");
        eval_assert_equal(ctx, "(case 'z ((a) 1))", "'()");
        eval_assert_equal(ctx, "(case 5 (else => (lambda (x) (* x x))))", "25");
        eval_assert_error_kind(ctx, "(case 1 (1 'one))", ErrorKind::SyntaxError);
    }

    #[test]
    fn test_and_or() {
        let ctx = &mut SchemyContext::new();
        eval_assert(ctx, "(and)");
        eval_assert_not(ctx, "(or)");
        eval_assert_equal(ctx, "(and 1 2 3)", "3");
        eval_assert_equal(ctx, "(and 1 #f (car '()))", "#f");
        eval_assert_equal(ctx, "(or #f 2 (car '()))", "2");
        eval_assert_equal(ctx, "(or #f #f)", "#f");
        eval_assert_equal(ctx, "(and '() 'x)", "'x");
    }

    #[test]
    fn test_tail_positions() {
        let ctx = &mut SchemyContext::new();
        eval_assert_equal(
            ctx,
            r#"(define (loop n acc)
                 (cond ((= n 0) acc)
                       (else (and #t (or #f (if #t (case 1 ((1) (loop (- n 1) (+ acc 1))))))))))
               (loop 100000 0)"#,
            "100000",
        );
    }
}
