/*!
Schemy is a Scheme interpreter that can be embedded into Rust programs.

It implements the core of the language the way a small Scheme should:
calls in tail position never grow the host stack, `call/cc` gives
first-class escape continuations, `letrec` and internal `define`s can
refer to each other before they are initialized, and closures and host
functions are called through one uniform procedure protocol.

## Getting started

It is very easy to get started.  Here's an example:
*/

/*!
  ```rust
  use schemy::{SchemyContext, Error};

  fn main() -> Result<(), Error> {
      // Create a new Schemy execution context.
      let mut ctx = SchemyContext::new();

      // Add a function called `add-nums` to `ctx`.
      ctx.add_function("add-nums", |num1: i64, num2: i64| num1 + num2);

      // Write a scheme program that calls `add-nums`
      let program = r#"
          (define (sum-to n acc)
            (if (= n 0) acc (sum-to (- n 1) (add-nums acc n))))
          (sum-to 100000 0)
      "#;

      // Evaluate the program, and save the result.
      let sum: i64 = ctx.eval_string(program)?.as_int()?;

      assert_eq!(sum, 5000050000);
      Ok(())
  }
  ```
*/

/*!
## Next steps

1. Values in _Schemy_ are represented in rust as [`SchemyObject`](SchemyObject)s.
   That struct implements methods for performing operations on Schemy values.

1. [`SchemyContext`](SchemyContext) tracks the state of the interpreter and
   provides methods for executing _Schemy_ programs.

1. [`SchemyContext::add_function`] registers Rust functions and closures
   with typed arguments, and [`SchemyContext::add_primitive`] and
   [`SchemyContext::add_special_form`] give full control over argument
   handling and evaluation.
*/

mod eval;
mod macros;
mod parse;

mod builtin;

mod cons;
pub use cons::{BaseIter, Cons, Iter};

mod context;
pub use context::{Rest, SchemyCallable, SchemyContext};

mod continuation;

mod env;
pub use env::Env;

mod error;
pub use error::{Error, ErrorKind, Unwind};

mod object;
pub use object::SchemyObject;

mod primitive;
pub use primitive::{Arguments, Arity, FromArg, ListArg, Number, PairArg, StringArg, VectorArg};

mod procedure;
pub use procedure::{Bounce, Procedure};

mod symbol;
pub use symbol::Symbol;

mod value;
pub use value::SchemyValue;

#[cfg(test)]
mod test_utils;
