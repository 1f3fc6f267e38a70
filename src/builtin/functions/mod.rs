use crate::SchemyContext;

// These macros are used by multiple submodules, so they are defined here.

/// A closure that combines two numbers: exact when both are integers,
/// failing with `OutOfRange` on overflow, and inexact otherwise.
macro_rules! number_ops {
    ($name:literal, $checked:ident, $float_op:expr) => {{
        |a: Number, b: Number| -> Result<Number, Error> {
            match (a, b) {
                (Number::Int(a), Number::Int(b)) => a.$checked(b).map(Number::Int).ok_or_else(|| {
                    Error::out_of_range(format!("integer overflow in {}", $name))
                }),
                (a, b) => Ok(Number::Float($float_op(a.to_f64(), b.to_f64()))),
            }
        }
    }};
}

/// Registers a numeric comparison that holds when every adjacent pair of
/// its arguments compares as one of the given orderings.
macro_rules! compare_ops {
    ($ctx:ident, $name:literal, $($ord:ident)|+) => {
        $ctx.add_function($name, |first: Number, rest: Rest<Number>| -> bool {
            let mut prev = first;
            rest.into_iter().all(|next| {
                let holds = matches!(compare(prev, next), $(Some(Ordering::$ord))|+);
                prev = next;
                holds
            })
        });
    };
}

mod control;
mod equivalence;
mod lists;
mod numbers;
mod output;
mod strings;
mod vectors;

pub(crate) fn add(ctx: &mut SchemyContext) {
    control::add(ctx);
    equivalence::add(ctx);
    lists::add(ctx);
    numbers::add(ctx);
    output::add(ctx);
    strings::add(ctx);
    vectors::add(ctx);
}
