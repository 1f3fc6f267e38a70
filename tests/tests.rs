use std::{any::Any, cell::RefCell, io, rc::Rc};

use proptest::prelude::*;
use schemy::{Error, ErrorKind, Rest, SchemyContext, SchemyObject};

macro_rules! schemy_assert {
    (@impl $ctx: expr, program:$input:expr, result:$result:expr $(,)?) => {
        let output = $ctx.eval_string($input).map_err(|err| {
            println!("{}:{}: execution failed: {}", file!(), line!(), err.format());
            err
        })?;
        let expected = $ctx.eval_string($result)?;
        assert!(
            output.equal(&expected),
            "\n{}:{}: program: {}\n  output: {},\n  expected: {}\n",
            file!(),
            line!(),
            $input,
            output,
            expected
        );
    };
    (@impl $ctx: expr, program:$input:expr, error:$desc:expr $(,)?) => {
        let output = $ctx.eval_string($input);
        assert!(output.is_err(), "{}: expected an error, got {:?}", $input, output);
        assert_eq!(output.unwrap_err().format(), $desc);
    };
    (ctx: $ctx: expr, program: $($tail:tt)+) => {
        schemy_assert!(@impl $ctx, program: $($tail)+)
    };
    (program: $($tail:tt)+) => {
        let mut ctx = SchemyContext::new();
        schemy_assert!(ctx: ctx, program: $($tail)+)
    };
}

#[derive(Clone, Default)]
struct Captured(Rc<RefCell<Vec<u8>>>);

impl Captured {
    fn attach(ctx: &mut SchemyContext) -> Self {
        let captured = Captured::default();
        ctx.set_output(Box::new(captured.clone()));
        captured
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_tail_calls() -> Result<(), Error> {
    schemy_assert! { program: r##"
        (define (loop n acc)
          (if (= n 0) acc (loop (- n 1) (+ acc 1))))
        (loop 1000000 0)
    "##, result: "1000000" }

    schemy_assert! { program: r##"
        (define (my-even? n) (if (= n 0) #t (my-odd? (- n 1))))
        (define (my-odd? n) (if (= n 0) #f (my-even? (- n 1))))
        (list (my-even? 1000000) (my-odd? 1000001))
    "##, result: "'(#t #t)" }

    schemy_assert! { program: r##"
        (let loop ((i 0))
          (cond ((= i 1000000) 'done)
                (else (begin (and #t (or #f (loop (+ i 1))))))))
    "##, result: "'done" }

    schemy_assert! { program: r##"
        (define (count-down n)
          (let ((m (- n 1)))
            (let* ((k m))
              (letrec ((z k))
                (if (< z 0) 'bottom (count-down z))))))
        (count-down 300000)
    "##, result: "'bottom" }

    schemy_assert! { program: r##"
        (define (f n) (if (= n 0) 'ok (apply f (list (- n 1)))))
        (f 300000)
    "##, result: "'ok" }

    schemy_assert! { program: r##"
        (do ((i 0 (+ i 1)) (acc '() (if (< i 3) (cons i acc) acc)))
            ((= i 500000) acc))
    "##, result: "'(2 1 0)" }
    Ok(())
}

#[test]
fn test_internal_defines_and_letrec() -> Result<(), Error> {
    schemy_assert! { program: r##"
        (define (parity n)
          (define (ev? n) (if (= n 0) #t (od? (- n 1))))
          (define (od? n) (if (= n 0) #f (ev? (- n 1))))
          (if (ev? n) 'even 'odd))
        (list (parity 100001) (parity 100000))
    "##, result: "'(odd even)" }

    schemy_assert! { program: r##"
        (letrec ((ev? (lambda (n) (if (= n 0) #t (od? (- n 1)))))
                 (od? (lambda (n) (if (= n 0) #f (ev? (- n 1))))))
          (ev? 100000))
    "##, result: "#t" }

    schemy_assert! { program: r##"
        (define (f)
          (define a 1)
          (display a)
          (define b 2)
          b)
        (f)
    "##, error: "ERR SyntaxError: define in a bad place\nBacktrace: define < f < top-level\n" }

    schemy_assert! { program: "(letrec ((a (+ b 1)) (b 1)) a)",
                     error: "ERR Uninitialized: variable b used before its definition\nBacktrace: letrec < top-level\n" }
    Ok(())
}

#[test]
fn test_continuations() -> Result<(), Error> {
    schemy_assert! { program: "(+ 1 (call/cc (lambda (k) (k 41))))", result: "42" }
    schemy_assert! { program: "(call-with-current-continuation (lambda (k) (* 2 (k 42))))", result: "42" }

    schemy_assert! { program: r##"
        (define (product lst)
          (call/cc
            (lambda (return)
              (let loop ((l lst))
                (cond ((null? l) 1)
                      ((= (car l) 0) (return 0))
                      (else (* (car l) (loop (cdr l)))))))))
        (list (product '(1 2 3 4)) (product '(1 2 0 (not a number))))
    "##, result: "'(24 0)" }

    schemy_assert! { program: r##"
        (define saved #f)
        (call/cc (lambda (k) (set! saved k) 1))
        (saved 5)
    "##, error: "ERR InvalidContinuation: no continuation receiver\nat top-level\n" }

    schemy_assert! { program: r##"
        (call/cc (lambda (outer)
          (+ 1 (call/cc (lambda (inner) (outer 10))))))
    "##, result: "10" }

    schemy_assert! { program: "(call/cc (lambda (k) (k 1 2)))",
                     error: "ERR ArityMismatch: too many arguments to continuation\nBacktrace: call/cc < top-level\n" }
    Ok(())
}

#[test]
fn test_quasiquote() -> Result<(), Error> {
    schemy_assert! { program: "`(1 ,(+ 1 1) ,@(list 3 4))", result: "'(1 2 3 4)" }
    schemy_assert! { program: "(let ((x 'a) (xs '(b c))) `(,x ,@xs . end))", result: "'(a b c . end)" }
    schemy_assert! { program: "`#(1 ,(* 2 3))", result: "#(1 6)" }
    schemy_assert! { program: "`(1 `(2 ,(3 ,(+ 1 3))))", result: "'(1 (quasiquote (2 (unquote (3 4)))))" }
    Ok(())
}

#[test]
fn test_equivalence() -> Result<(), Error> {
    schemy_assert! { program: "(eqv? 2 2)", result: "#t" }
    schemy_assert! { program: r#"(eqv? "" "")"#, result: "#t" }
    schemy_assert! { program: "(eqv? (list 1) (list 1))", result: "#f" }
    schemy_assert! { program: "(equal? (list 1 2) (list 1 2))", result: "#t" }
    schemy_assert! { program: "(eq? 'sym 'sym)", result: "#t" }
    schemy_assert! { program: "(case (* 2 3) ((2 3 5 7) 'prime) ((1 4 6 8 9) 'composite))", result: "'composite" }
    schemy_assert! { program: "(memv 3 '(1 2 3 4))", result: "'(3 4)" }
    schemy_assert! { program: "(assoc \"b\" '((\"a\" . 1) (\"b\" . 2)))", result: "'(\"b\" . 2)" }
    Ok(())
}

#[test]
fn test_shared_frame_mutation() -> Result<(), Error> {
    schemy_assert! { program: r##"
        (define (make-counter)
          (let ((n 0))
            (list (lambda () (set! n (+ n 1)) n)
                  (lambda () n))))
        (define c (make-counter))
        ((car c))
        ((car c))
        ((cadr c))
    "##, result: "2" }

    schemy_assert! { program: r##"
        (define x 1)
        (define (bump!) (set! x (+ x 1)))
        (bump!)
        (bump!)
        x
    "##, result: "3" }
    Ok(())
}

#[test]
fn test_arity_errors() -> Result<(), Error> {
    let mut ctx = SchemyContext::new();
    let out = Captured::attach(&mut ctx);
    ctx.eval_string(r#"(define (two a b) (display "ran") (+ a b))"#)?;
    schemy_assert! { ctx: ctx, program: "(two 1)",
                     error: "ERR ArityMismatch: too few arguments to two\nBacktrace: two < top-level\n" }
    schemy_assert! { ctx: ctx, program: "(two 1 2 3)",
                     error: "ERR ArityMismatch: too many arguments to two\nBacktrace: two < top-level\n" }
    assert_eq!(out.text(), "");
    schemy_assert! { ctx: ctx, program: "(two 1 2)", result: "3" }
    assert_eq!(out.text(), "ran");

    schemy_assert! { ctx: ctx, program: "((lambda (a . rest) rest) 1 2 3)", result: "'(2 3)" }
    schemy_assert! { ctx: ctx, program: "(car '(1) '(2))",
                     error: "ERR ArityMismatch: too many arguments to car\nBacktrace: car < top-level\n" }
    schemy_assert! { ctx: ctx, program: "(5 1)",
                     error: "ERR TypeMismatch: 5 is not a procedure\nat top-level\n" }
    schemy_assert! { ctx: ctx, program: "undefined-thing",
                     error: "ERR Undefined: undefined variable undefined-thing\nat top-level\n" }
    Ok(())
}

#[test]
fn test_cyclic_structure() -> Result<(), Error> {
    let mut ctx = SchemyContext::new();
    let out = Captured::attach(&mut ctx);
    ctx.eval_string("(define ring (list 1 2)) (set-cdr! (cdr ring) ring)")?;
    schemy_assert! { ctx: ctx, program: "(list? ring)", result: "#f" }
    schemy_assert! { ctx: ctx, program: "(length ring)",
                     error: "ERR TypeMismatch: 1st argument (1 2 ...) to length is not a list\nBacktrace: length < top-level\n" }
    schemy_assert! { ctx: ctx, program: "(apply + ring)",
                     error: "ERR TypeMismatch: last argument (1 2 ...) to apply is not a list\nBacktrace: apply < top-level\n" }
    schemy_assert! { ctx: ctx, program: "(for-each display ring)",
                     error: "ERR TypeMismatch: 2nd argument (1 2 ...) to for-each is not a list\nBacktrace: for-each < top-level\n" }
    schemy_assert! { ctx: ctx, program: "(append ring '())",
                     error: "ERR TypeMismatch: 1st argument (1 2 ...) to append is not a list\nBacktrace: append < top-level\n" }
    schemy_assert! { ctx: ctx, program: "(cadr (cddr ring))", result: "2" }

    ctx.eval_string("(write ring) (define v (vector 1 2)) (vector-set! v 1 v) (display v)")?;
    assert_eq!(out.text(), "(1 2 ...)#(1 ...)");
    Ok(())
}

#[test]
fn test_host_functions() -> Result<(), Error> {
    let mut ctx = SchemyContext::new();
    ctx.add_function("sum", |nums: Rest<i64>| -> i64 { nums.into_iter().sum() });
    ctx.add_function(
        "checked-div",
        |a: i64, b: i64| -> Result<i64, Error> {
            a.checked_div(b)
                .ok_or_else(|| Error::out_of_range("checked-div by zero"))
        },
    );
    ctx.add_function("make-any", |n: i64| -> Rc<dyn Any> { Rc::new(n * 2) });
    ctx.add_function("read-any", |obj: Rc<dyn Any>| -> Result<i64, Error> {
        obj.downcast_ref::<i64>()
            .copied()
            .ok_or_else(|| Error::type_mismatch("not an i64 box"))
    });

    schemy_assert! { ctx: ctx, program: "(apply sum (map (lambda (x) (* x x)) '(1 2 3)))", result: "14" }
    schemy_assert! { ctx: ctx, program: "(checked-div 7 2)", result: "3" }
    schemy_assert! { ctx: ctx, program: "(checked-div 7 0)",
                     error: "ERR OutOfRange: checked-div by zero\nBacktrace: checked-div < top-level\n" }
    schemy_assert! { ctx: ctx, program: "(read-any (make-any 21))", result: "42" }

    let square = ctx.eval_string("(lambda (x) (* x x))")?;
    let result = ctx.apply(&square, vec![SchemyObject::from(12i64)])?;
    assert_eq!(result.as_int()?, 144);

    ctx.define("answer", 42i64.into())?;
    schemy_assert! { ctx: ctx, program: "(+ answer 0)", result: "42" }
    Ok(())
}

#[test]
fn test_reader_errors() {
    let mut ctx = SchemyContext::new();
    let err = ctx.eval_string("(+ 1 2").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParsingError);
    let err = ctx.eval_string("(display 1))").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParsingError);
}

#[test]
fn test_program_output() -> Result<(), Error> {
    let mut ctx = SchemyContext::new();
    let out = Captured::attach(&mut ctx);
    ctx.eval_string(
        r#"
        (define (show . items) (for-each display items) (newline))
        (show "sum: " (+ 1 2))
        (write '(a "b" #\c 1.5))
        "#,
    )?;
    assert_eq!(out.text(), "sum: 3\n(a \"b\" #\\c 1.5)");
    Ok(())
}

fn eval_bool(ctx: &mut SchemyContext, program: &str) -> bool {
    ctx.eval_string(program)
        .unwrap_or_else(|e| panic!("{}", e.format()))
        .as_bool()
}

proptest! {
    #[test]
    fn eqv_is_reflexive_on_numbers(n in any::<i64>()) {
        let mut ctx = SchemyContext::new();
        let let_bound = eval_bool(&mut ctx, &format!("(let ((x {})) (eqv? x x))", n));
        prop_assert!(let_bound);
        let literal = eval_bool(&mut ctx, &format!("(eqv? {} {})", n, n));
        prop_assert!(literal);
    }

    #[test]
    fn equal_agrees_with_structure(
        a in prop::collection::vec(-1000i64..1000, 0..8),
        b in prop::collection::vec(-1000i64..1000, 0..8),
    ) {
        let mut ctx = SchemyContext::new();
        let show = |v: &Vec<i64>| v.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let program = format!("(equal? (list {}) (list {}))", show(&a), show(&b));
        prop_assert_eq!(eval_bool(&mut ctx, &program), a == b);
        let program = format!("(equal? (list {}) (list {}))", show(&b), show(&a));
        prop_assert_eq!(eval_bool(&mut ctx, &program), a == b);
        // fresh lists are never eqv?, unless both are empty
        let program = format!("(eqv? (list {}) (list {}))", show(&a), show(&a));
        prop_assert_eq!(eval_bool(&mut ctx, &program), a.is_empty());
    }

    #[test]
    fn equal_on_strings(a in "[a-z ]{0,12}", b in "[a-z ]{0,12}") {
        let mut ctx = SchemyContext::new();
        let program = format!(r#"(equal? "{}" "{}")"#, a, b);
        prop_assert_eq!(eval_bool(&mut ctx, &program), a == b);
        let program = format!(r#"(string=? "{}" "{}")"#, a, b);
        prop_assert_eq!(eval_bool(&mut ctx, &program), a == b);
    }

    #[test]
    fn arithmetic_matches_host(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
        let mut ctx = SchemyContext::new();
        let result = ctx
            .eval_string(&format!("(list (+ {a} {b}) (- {a} {b}) (* {a} {b}))"))
            .map_err(|e| TestCaseError::fail(e.format()))?;
        let expected = ctx
            .eval_string(&format!("'({} {} {})", a + b, a - b, a * b))
            .map_err(|e| TestCaseError::fail(e.format()))?;
        prop_assert!(result.equal(&expected));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn tail_loops_run_at_any_depth(n in 0i64..200_000) {
        let mut ctx = SchemyContext::new();
        let program = format!(
            "(define (count i acc) (if (= i 0) acc (count (- i 1) (+ acc 2)))) (count {} 0)",
            n
        );
        let result = ctx.eval_string(&program).map_err(|e| TestCaseError::fail(e.format()))?;
        prop_assert_eq!(result.as_int().map_err(|e| TestCaseError::fail(e.format()))?, n * 2);
    }
}
