use std::cmp::Ordering;

use rand::Rng;

use crate::{
    Error, Rest, SchemyContext, SchemyObject,
    primitive::{FromArg, Number},
};

fn compare(a: Number, b: Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
        (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
    }
}

/// Integer division stays exact when it has no remainder. There are no
/// rationals, so anything else falls back to floats.
fn divide(a: Number, b: Number) -> Result<Number, Error> {
    match (a, b) {
        (Number::Int(_), Number::Int(0)) => Err(Error::out_of_range("division by zero")),
        (Number::Int(a), Number::Int(b)) if a.checked_rem(b) == Some(0) => a
            .checked_div(b)
            .map(Number::Int)
            .ok_or_else(|| Error::out_of_range("integer overflow in /")),
        (a, b) => Ok(Number::Float(a.to_f64() / b.to_f64())),
    }
}

fn nonzero_divisor(name: &str, b: i64) -> Result<i64, Error> {
    if b == 0 {
        Err(Error::out_of_range(format!("division by zero in {}", name)))
    } else {
        Ok(b)
    }
}

/// The smallest or largest of the numbers, made inexact if any of them
/// is.
fn extremum(first: Number, rest: Rest<Number>, wanted: Ordering) -> Number {
    let mut inexact = matches!(first, Number::Float(_));
    let mut best = first;
    for num in rest {
        inexact |= matches!(num, Number::Float(_));
        if compare(num, best) == Some(wanted) {
            best = num;
        }
    }
    if inexact {
        Number::Float(best.to_f64())
    } else {
        best
    }
}

/// Integer powers stay exact and fail on overflow like the other integer
/// operations. A negative integer power is computed in floats.
fn expt(base: Number, power: Number) -> Result<Number, Error> {
    let overflow = || Error::out_of_range("integer overflow in expt");
    match (base, power) {
        (Number::Int(0), Number::Int(p)) if p < 0 => {
            Err(Error::out_of_range("division by zero in expt"))
        }
        (Number::Int(b), Number::Int(p)) if p >= 0 => match (b, u32::try_from(p)) {
            (_, Ok(p)) => b.checked_pow(p).map(Number::Int).ok_or_else(overflow),
            (0 | 1, Err(_)) => Ok(Number::Int(b)),
            (-1, Err(_)) => Ok(Number::Int(if p % 2 == 0 { 1 } else { -1 })),
            _ => Err(overflow()),
        },
        (b, p) => Ok(Number::Float(b.to_f64().powf(p.to_f64()))),
    }
}

/// Applies a float rounding function. Integers are already whole; whole
/// floats come back as integers.
fn round_with(name: &str, num: Number, round: fn(f64) -> f64) -> Result<i64, Error> {
    match num {
        Number::Int(vv) => Ok(vv),
        Number::Float(vv) => {
            let rounded = round(vv);
            // `i64::MAX as f64` rounds up to 2^63, which is already out of
            // range.
            if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
                Ok(rounded as i64)
            } else {
                Err(Error::out_of_range(format!("{}: {} has no integer value", name, vv)))
            }
        }
    }
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        (a, b) = (b, a.wrapping_rem(b));
    }
    a
}

fn nonnegative(name: &str, vv: i64) -> Result<i64, Error> {
    vv.checked_abs()
        .ok_or_else(|| Error::out_of_range(format!("integer overflow in {}", name)))
}

fn check_radix(name: &str, radix: Option<i64>) -> Result<u32, Error> {
    match radix {
        None => Ok(10),
        Some(radix @ 2..=36) => Ok(radix as u32),
        Some(radix) => Err(Error::out_of_range(format!("{}: bad radix {}", name, radix))),
    }
}

fn int_to_string(vv: i64, radix: u32) -> String {
    let mut magnitude = vv.unsigned_abs();
    let mut digits = vec![];
    loop {
        let digit = (magnitude % radix as u64) as u32;
        digits.push(char::from_digit(digit, radix).unwrap_or('?'));
        magnitude /= radix as u64;
        if magnitude == 0 {
            break;
        }
    }
    if vv < 0 {
        digits.push('-');
    }
    digits.into_iter().rev().collect()
}

fn parse_number(text: &str) -> Option<Number> {
    if let Ok(vv) = text.parse::<i64>() {
        return Some(Number::Int(vv));
    }
    // `f64::from_str` also takes words like "inf" and "nan".
    let numeric = text
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | 'e' | 'E' | '+' | '-'));
    if numeric && text.chars().any(|ch| ch.is_ascii_digit()) {
        text.parse::<f64>().ok().map(Number::Float)
    } else {
        None
    }
}

pub(crate) fn add(ctx: &mut SchemyContext) {
    ctx.add_function("+", |nums: Rest<Number>| -> Result<Number, Error> {
        nums.into_iter()
            .try_fold(Number::Int(0), number_ops!("+", checked_add, std::ops::Add::add))
    });

    ctx.add_function("*", |nums: Rest<Number>| -> Result<Number, Error> {
        nums.into_iter()
            .try_fold(Number::Int(1), number_ops!("*", checked_mul, std::ops::Mul::mul))
    });

    ctx.add_function("-", |first: Number, rest: Rest<Number>| -> Result<Number, Error> {
        let sub = number_ops!("-", checked_sub, std::ops::Sub::sub);
        if rest.is_empty() {
            return sub(Number::Int(0), first);
        }
        rest.into_iter().try_fold(first, sub)
    });

    ctx.add_function("/", |first: Number, rest: Rest<Number>| -> Result<Number, Error> {
        if rest.is_empty() {
            return divide(Number::Int(1), first);
        }
        rest.into_iter().try_fold(first, divide)
    });

    compare_ops!(ctx, "=", Equal);
    compare_ops!(ctx, "<", Less);
    compare_ops!(ctx, ">", Greater);
    compare_ops!(ctx, "<=", Less | Equal);
    compare_ops!(ctx, ">=", Greater | Equal);

    ctx.add_function("quotient", |a: i64, b: i64| -> Result<i64, Error> {
        let b = nonzero_divisor("quotient", b)?;
        a.checked_div(b)
            .ok_or_else(|| Error::out_of_range("integer overflow in quotient"))
    });

    ctx.add_function("remainder", |a: i64, b: i64| -> Result<i64, Error> {
        let b = nonzero_divisor("remainder", b)?;
        Ok(a.checked_rem(b).unwrap_or(0))
    });

    // The result takes the sign of the divisor.
    ctx.add_function("modulo", |a: i64, b: i64| -> Result<i64, Error> {
        let b = nonzero_divisor("modulo", b)?;
        let rem = a.checked_rem(b).unwrap_or(0);
        if rem != 0 && (rem < 0) != (b < 0) {
            Ok(rem + b)
        } else {
            Ok(rem)
        }
    });

    ctx.add_function("abs", |num: Number| -> Result<Number, Error> {
        match num {
            Number::Int(vv) => vv
                .checked_abs()
                .map(Number::Int)
                .ok_or_else(|| Error::out_of_range("integer overflow in abs")),
            Number::Float(vv) => Ok(Number::Float(vv.abs())),
        }
    });

    ctx.add_function("min", |first: Number, rest: Rest<Number>| {
        extremum(first, rest, Ordering::Less)
    });
    ctx.add_function("max", |first: Number, rest: Rest<Number>| {
        extremum(first, rest, Ordering::Greater)
    });

    ctx.add_function("expt", expt);

    ctx.add_function("sqrt", |num: Number| -> Number {
        let root = num.to_f64().sqrt();
        match num {
            Number::Int(vv) if vv >= 0 && (root as i64).checked_mul(root as i64) == Some(vv) => {
                Number::Int(root as i64)
            }
            _ => Number::Float(root),
        }
    });

    ctx.add_function("exp", |num: f64| num.exp());
    ctx.add_function("log", |num: f64| num.ln());
    ctx.add_function("sin", |num: f64| num.sin());
    ctx.add_function("cos", |num: f64| num.cos());
    ctx.add_function("tan", |num: f64| num.tan());
    ctx.add_function("asin", |num: f64| num.asin());
    ctx.add_function("acos", |num: f64| num.acos());
    // With two arguments, the angle of the point `(x, y)`.
    ctx.add_function("atan", |y: f64, x: Option<f64>| match x {
        Some(x) => y.atan2(x),
        None => y.atan(),
    });

    ctx.add_function("floor", |num: Number| round_with("floor", num, f64::floor));
    ctx.add_function("ceiling", |num: Number| round_with("ceiling", num, f64::ceil));
    ctx.add_function("truncate", |num: Number| round_with("truncate", num, f64::trunc));
    ctx.add_function("round", |num: Number| {
        round_with("round", num, f64::round_ties_even)
    });

    ctx.add_function("gcd", |nums: Rest<i64>| -> Result<i64, Error> {
        nums.into_iter()
            .try_fold(0, |acc, num| nonnegative("gcd", gcd(acc, num)))
    });
    ctx.add_function("lcm", |nums: Rest<i64>| -> Result<i64, Error> {
        nums.into_iter().try_fold(1, |acc: i64, num| {
            if num == 0 || acc == 0 {
                return Ok(0);
            }
            (acc / gcd(acc, num))
                .checked_mul(num)
                .ok_or_else(|| Error::out_of_range("integer overflow in lcm"))
                .and_then(|vv| nonnegative("lcm", vv))
        })
    });

    // A uniformly distributed number below `limit`, of the same exactness.
    ctx.add_function("random", |limit: Number| -> Result<Number, Error> {
        let mut rng = rand::thread_rng();
        match limit {
            Number::Int(vv) if vv > 0 => Ok(Number::Int(rng.gen_range(0..vv))),
            Number::Float(vv) if vv > 0.0 && vv.is_finite() => {
                Ok(Number::Float(rng.gen_range(0.0..vv)))
            }
            _ => Err(Error::out_of_range(format!(
                "random: limit {} is not positive",
                SchemyObject::from(limit)
            ))),
        }
    });

    ctx.add_function("number?", |x: SchemyObject| x.numberp());
    ctx.add_function("integer?", |x: SchemyObject| match Number::from_arg(&x) {
        Some(Number::Int(_)) => true,
        Some(Number::Float(vv)) => vv.is_finite() && vv.fract() == 0.0,
        None => false,
    });
    ctx.add_function("zero?", |num: Number| num.to_f64() == 0.0);
    ctx.add_function("positive?", |num: Number| num.to_f64() > 0.0);
    ctx.add_function("negative?", |num: Number| num.to_f64() < 0.0);
    ctx.add_function("odd?", |num: i64| num % 2 != 0);
    ctx.add_function("even?", |num: i64| num % 2 == 0);

    ctx.add_function(
        "number->string",
        |num: Number, radix: Option<i64>| -> Result<String, Error> {
            let radix = check_radix("number->string", radix)?;
            Ok(match num {
                Number::Int(vv) => int_to_string(vv, radix),
                // Floats are always written in decimal.
                Number::Float(_) => SchemyObject::from(num).to_string(),
            })
        },
    );
    ctx.add_function(
        "string->number",
        |text: String, radix: Option<i64>| -> Result<SchemyObject, Error> {
            let text = text.trim();
            let parsed = match check_radix("string->number", radix)? {
                10 => parse_number(text),
                radix => i64::from_str_radix(text, radix).ok().map(Number::Int),
            };
            Ok(match parsed {
                Some(num) => num.into(),
                None => false.into(),
            })
        },
    );
}
