use crate::{
    Error, Rest, SchemyContext, SchemyObject,
    cons::{Cons, list_with_tail},
    primitive::{FromArg, ListArg, PairArg, ordinal},
};

fn not_a_list(position: usize, arg: &SchemyObject, name: &str) -> Error {
    Error::type_mismatch(format!(
        "{} argument {} to {} is not a list",
        ordinal(position),
        arg,
        name
    ))
}

/// Returns the first sublist of `list` whose car satisfies `pred`, or
/// `#f`.
fn member_by(
    list: SchemyObject,
    name: &str,
    pred: impl Fn(&SchemyObject) -> bool,
) -> Result<SchemyObject, Error> {
    if !list.listp() {
        return Err(not_a_list(2, &list, name));
    }
    let mut rest = list;
    while let Some(cons) = rest.as_pair() {
        if pred(cons.car()) {
            return Ok(rest);
        }
        rest = cons.cdr().clone();
    }
    Ok(false.into())
}

/// Returns the first pair in `alist` whose car satisfies `pred`, or `#f`.
fn assoc_by(alist: Vec<SchemyObject>, pred: impl Fn(&SchemyObject) -> bool) -> Result<SchemyObject, Error> {
    for entry in alist {
        let key = entry.car()?;
        if pred(&key) {
            return Ok(entry);
        }
    }
    Ok(false.into())
}

fn list_tail(list: &SchemyObject, k: i64, name: &str) -> Result<SchemyObject, Error> {
    let out_of_range = || Error::out_of_range(format!("{}: index {} is out of range", name, k));
    let steps = usize::try_from(k).map_err(|_| out_of_range())?;
    let mut rest = list.clone();
    for _ in 0..steps {
        rest = rest.as_pair().ok_or_else(out_of_range)?.cdr().clone();
    }
    Ok(rest)
}

/// The last pair of `pair`'s spine. Fails on a spine that loops back on
/// itself.
fn last_pair(pair: SchemyObject) -> Result<SchemyObject, Error> {
    let mut slow = pair.clone();
    let mut fast = pair.clone();
    let mut advance_slow = false;
    loop {
        let next = match fast.as_pair() {
            Some(cons) if cons.cdr().consp() => cons.cdr().clone(),
            _ => return Ok(fast),
        };
        fast = next;
        if advance_slow {
            slow = slow.cdr()?;
            if slow.eq(&fast) {
                return Err(not_a_list(1, &pair, "last"));
            }
        }
        advance_slow = !advance_slow;
    }
}

/// Composes `car` and `cdr` as the letters in the name of a `c[ad]+r`
/// procedure say, innermost last.
fn cxr(path: &'static str) -> impl Fn(SchemyObject) -> Result<SchemyObject, Error> {
    move |obj: SchemyObject| {
        path.chars().rev().try_fold(obj, |obj, op| match op {
            'a' => obj.car(),
            _ => obj.cdr(),
        })
    }
}

pub(crate) fn add(ctx: &mut SchemyContext) {
    ctx.add_function("cons", |car: SchemyObject, cdr: SchemyObject| {
        SchemyObject::cons(car, cdr)
    });
    ctx.add_function("car", |pair: Cons| pair.car().clone());
    ctx.add_function("cdr", |pair: Cons| pair.cdr().clone());

    ctx.add_function(
        "set-car!",
        |PairArg(pair): PairArg, value: SchemyObject| -> Result<SchemyObject, Error> {
            pair.set_car(value.clone())?;
            Ok(value)
        },
    );
    ctx.add_function(
        "set-cdr!",
        |PairArg(pair): PairArg, value: SchemyObject| -> Result<SchemyObject, Error> {
            pair.set_cdr(value.clone())?;
            Ok(value)
        },
    );

    for name in [
        "caar", "cadr", "cdar", "cddr", "caaar", "caadr", "cadar", "caddr", "cdaar", "cdadr",
        "cddar", "cdddr", "caaaar", "caaadr", "caadar", "caaddr", "cadaar", "cadadr", "caddar",
        "cadddr", "cdaaar", "cdaadr", "cdadar", "cdaddr", "cddaar", "cddadr", "cdddar", "cddddr",
    ] {
        ctx.add_function(name, cxr(&name[1..name.len() - 1]));
    }

    ctx.add_function("pair?", |x: SchemyObject| x.consp());
    ctx.add_function("null?", |x: SchemyObject| x.null());
    ctx.add_function("list?", |x: SchemyObject| x.listp());

    ctx.add_function("list", |items: Rest<SchemyObject>| -> SchemyObject {
        items.into_iter().collect()
    });
    // The last argument is the tail of the result.
    ctx.add_function("list*", |first: SchemyObject, rest: Rest<SchemyObject>| -> SchemyObject {
        let mut items: Vec<SchemyObject> = std::iter::once(first).chain(rest).collect();
        let tail = items.pop().unwrap_or_default();
        list_with_tail(items, tail)
    });
    ctx.add_function("length", |ListArg(items): ListArg| items.len() as i64);
    ctx.add_function("last", |PairArg(pair): PairArg| last_pair(pair));
    ctx.add_function("reverse", |ListArg(items): ListArg| -> SchemyObject {
        items.into_iter().rev().collect()
    });
    ctx.add_function("nreverse", |list: SchemyObject| -> Result<SchemyObject, Error> {
        if !list.listp() {
            return Err(not_a_list(1, &list, "nreverse"));
        }
        let mut reversed = SchemyObject::nil();
        let mut rest = list;
        while let Some(cons) = rest.as_pair() {
            let next = cons.cdr().clone();
            rest.set_cdr(reversed)?;
            reversed = rest;
            rest = next;
        }
        Ok(reversed)
    });

    // Every argument but the last is copied; the last one becomes the
    // tail of the result as it is.
    ctx.add_function("append", |lists: Rest<SchemyObject>| -> Result<SchemyObject, Error> {
        let mut lists: Vec<SchemyObject> = lists.into_iter().collect();
        let Some(tail) = lists.pop() else {
            return Ok(SchemyObject::nil());
        };
        let mut items = vec![];
        for (i, list) in lists.iter().enumerate() {
            let ListArg(elements) =
                ListArg::from_arg(list).ok_or_else(|| not_a_list(i + 1, list, "append"))?;
            items.extend(elements);
        }
        Ok(list_with_tail(items, tail))
    });

    // Like `append`, but reuses the pairs of every argument but the last.
    ctx.add_function("nconc", |lists: Rest<SchemyObject>| -> Result<SchemyObject, Error> {
        let mut lists: Vec<SchemyObject> = lists.into_iter().collect();
        let Some(mut result) = lists.pop() else {
            return Ok(SchemyObject::nil());
        };
        for (i, list) in lists.iter().enumerate() {
            if !list.listp() {
                return Err(not_a_list(i + 1, list, "nconc"));
            }
        }
        // Every last pair is found before any of them is relinked, so an
        // argument that appears twice can't send the search around a loop.
        let mut spliced = vec![];
        for list in lists.into_iter().filter(|list| list.consp()) {
            let last = last_pair(list.clone())?;
            spliced.push((list, last));
        }
        for (list, last) in spliced.into_iter().rev() {
            last.set_cdr(result)?;
            result = list;
        }
        Ok(result)
    });

    ctx.add_function("list-tail", |list: SchemyObject, k: i64| {
        list_tail(&list, k, "list-tail")
    });
    ctx.add_function("nthcdr", |k: i64, list: SchemyObject| list_tail(&list, k, "nthcdr"));
    ctx.add_function("nth", |k: i64, list: SchemyObject| -> Result<SchemyObject, Error> {
        list_tail(&list, k, "nth")?
            .as_pair()
            .map(|cons| cons.car().clone())
            .ok_or_else(|| Error::out_of_range(format!("nth: index {} is out of range", k)))
    });
    ctx.add_function("list-ref", |list: SchemyObject, k: i64| -> Result<SchemyObject, Error> {
        list_tail(&list, k, "list-ref")?
            .as_pair()
            .map(|cons| cons.car().clone())
            .ok_or_else(|| Error::out_of_range(format!("list-ref: index {} is out of range", k)))
    });

    ctx.add_function("memq", |item: SchemyObject, list: SchemyObject| {
        member_by(list, "memq", |x| x.eq(&item))
    });
    ctx.add_function("memv", |item: SchemyObject, list: SchemyObject| {
        member_by(list, "memv", |x| x.eqv(&item))
    });
    ctx.add_function("member", |item: SchemyObject, list: SchemyObject| {
        member_by(list, "member", |x| x.equal(&item))
    });

    ctx.add_function("assq", |key: SchemyObject, ListArg(alist): ListArg| {
        assoc_by(alist, |x| x.eq(&key))
    });
    ctx.add_function("assv", |key: SchemyObject, ListArg(alist): ListArg| {
        assoc_by(alist, |x| x.eqv(&key))
    });
    ctx.add_function("assoc", |key: SchemyObject, ListArg(alist): ListArg| {
        assoc_by(alist, |x| x.equal(&key))
    });
}
