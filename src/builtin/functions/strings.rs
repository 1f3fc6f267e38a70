use std::{cmp::Ordering, rc::Rc};

use crate::{
    Error, Rest, SchemyContext, SchemyObject,
    primitive::{ListArg, StringArg},
    symbol::Symbol,
};

/// Suffixes of the two-argument comparisons, with the orderings each one
/// accepts.
const COMPARISONS: [(&str, &[Ordering]); 5] = [
    ("=?", &[Ordering::Equal]),
    ("<?", &[Ordering::Less]),
    (">?", &[Ordering::Greater]),
    ("<=?", &[Ordering::Less, Ordering::Equal]),
    (">=?", &[Ordering::Greater, Ordering::Equal]),
];

fn fold_char(ch: char) -> char {
    ch.to_lowercase().next().unwrap_or(ch)
}

fn char_index(text: &str, k: i64, name: &str) -> Result<usize, Error> {
    usize::try_from(k)
        .ok()
        .filter(|k| *k <= text.chars().count())
        .ok_or_else(|| Error::out_of_range(format!("{}: index {} is out of range", name, k)))
}

pub(crate) fn add(ctx: &mut SchemyContext) {
    // strings
    ctx.add_function("string?", |x: SchemyObject| x.stringp());
    ctx.add_function("string-length", |text: String| text.chars().count() as i64);
    ctx.add_function("string-append", |parts: Rest<String>| -> String {
        parts.into_iter().collect()
    });
    ctx.add_function("string=?", |first: String, rest: Rest<String>| {
        rest.iter().all(|other| *other == first)
    });
    for (suffix, holds) in COMPARISONS {
        // `string=?` takes any number of arguments.
        if suffix != "=?" {
            ctx.add_function(&format!("string{}", suffix), move |a: String, b: String| {
                holds.contains(&a.cmp(&b))
            });
        }
        ctx.add_function(&format!("string-ci{}", suffix), move |a: String, b: String| {
            holds.contains(&a.chars().map(fold_char).cmp(b.chars().map(fold_char)))
        });
        ctx.add_function(&format!("char{}", suffix), move |a: char, b: char| {
            holds.contains(&a.cmp(&b))
        });
        ctx.add_function(&format!("char-ci{}", suffix), move |a: char, b: char| {
            holds.contains(&fold_char(a).cmp(&fold_char(b)))
        });
    }

    ctx.add_function(
        "make-string",
        |k: i64, fill: Option<char>| -> Result<String, Error> {
            let len = usize::try_from(k)
                .map_err(|_| Error::out_of_range(format!("make-string: bad length {}", k)))?;
            Ok(std::iter::repeat_n(fill.unwrap_or(' '), len).collect())
        },
    );
    ctx.add_function("string", |chars: Rest<char>| -> String { chars.into_iter().collect() });

    ctx.add_function("string-ref", |text: String, k: i64| -> Result<char, Error> {
        let index = char_index(&text, k, "string-ref")?;
        text.chars()
            .nth(index)
            .ok_or_else(|| Error::out_of_range(format!("string-ref: index {} is out of range", k)))
    });

    ctx.add_function(
        "substring",
        |text: String, start: i64, end: Option<i64>| -> Result<String, Error> {
            let start = char_index(&text, start, "substring")?;
            let end = match end {
                Some(end) => char_index(&text, end, "substring")?,
                None => text.chars().count(),
            };
            if start > end {
                return Err(Error::out_of_range(format!(
                    "substring: start {} is past end {}",
                    start, end
                )));
            }
            Ok(text.chars().skip(start).take(end - start).collect())
        },
    );

    // Strings are shared, so every holder sees the change.
    ctx.add_function(
        "string-set!",
        |StringArg(text): StringArg, k: i64, ch: char| -> Result<SchemyObject, Error> {
            let replaced = text.with_string_mut(|chars| {
                let index = usize::try_from(k).ok().filter(|k| *k < chars.chars().count())?;
                *chars = chars
                    .chars()
                    .enumerate()
                    .map(|(i, old)| if i == index { ch } else { old })
                    .collect();
                Some(())
            });
            match replaced {
                Some(Some(())) => Ok(text),
                _ => Err(Error::out_of_range(format!("string-set!: index {} is out of range", k))),
            }
        },
    );

    ctx.add_function("string->list", |text: String| -> SchemyObject {
        text.chars().map(SchemyObject::from).collect()
    });
    ctx.add_function("list->string", |ListArg(items): ListArg| -> Result<String, Error> {
        items.iter().map(|item| item.as_char()).collect()
    });

    // symbols
    ctx.add_function("symbol?", |x: SchemyObject| x.symbolp());
    ctx.add_function("symbol->string", |sym: Rc<Symbol>| sym.name().to_string());
    ctx.add_function("string->symbol", |ctx: &mut SchemyContext, name: String| {
        ctx.intern(&name)
    });
    ctx.add_function("gensym", |ctx: &mut SchemyContext| ctx.gensym());
    ctx.add_function("get", |sym: Rc<Symbol>, key: SchemyObject| {
        sym.get_property(&key).unwrap_or_default()
    });
    ctx.add_function("put", |sym: Rc<Symbol>, key: SchemyObject, value: SchemyObject| {
        sym.put_property(key, value.clone());
        value
    });

    // characters
    ctx.add_function("char?", |x: SchemyObject| x.charp());
    ctx.add_function("char-alphabetic?", |ch: char| ch.is_alphabetic());
    ctx.add_function("char-numeric?", |ch: char| ch.is_numeric());
    ctx.add_function("char-whitespace?", |ch: char| ch.is_whitespace());
    ctx.add_function("char-upper-case?", |ch: char| ch.is_uppercase());
    ctx.add_function("char-lower-case?", |ch: char| ch.is_lowercase());
    ctx.add_function("char-upcase", |ch: char| ch.to_uppercase().next().unwrap_or(ch));
    ctx.add_function("char-downcase", |ch: char| ch.to_lowercase().next().unwrap_or(ch));
    ctx.add_function("char->integer", |ch: char| ch as i64);
    ctx.add_function("integer->char", |code: i64| -> Result<char, Error> {
        u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| Error::out_of_range(format!("integer->char: {} is not a character code", code)))
    });
}
