use crate::{
    Error, SchemyContext, SchemyObject,
    cons::{list_to_vec, list_with_tail},
    context::Keywords,
    env::Env,
    error::Unwind,
    eval::eval_value,
    macros::destruct_bind,
    primitive::Arguments,
    procedure::Bounce,
};

/// The single operand of an `(unquote x)` style form.
fn single_operand(form: &SchemyObject, rest: &SchemyObject) -> Result<SchemyObject, Error> {
    match rest.as_pair() {
        Some(cons) if cons.cdr().null() => Ok(cons.car().clone()),
        _ => Err(Error::syntax_error(format!("bad syntax {}", form))),
    }
}

/// Expands a quasiquote template. `level` counts the quasiquotes that
/// enclose the template beyond the outermost one; only unquotes at level
/// zero are evaluated.
fn qq(
    ctx: &mut SchemyContext,
    kw: &Keywords,
    template: &SchemyObject,
    level: usize,
    env: &Env,
) -> Result<SchemyObject, Unwind> {
    if let Some(items) = template.with_vector(|items| items.clone()) {
        let list: SchemyObject = items.into_iter().collect();
        let expanded = qq(ctx, kw, &list, level, env)?;
        return match list_to_vec(&expanded) {
            Some(items) => Ok(SchemyObject::vector(items)),
            None => Err(Error::syntax_error(format!("bad vector template {}", template)).into()),
        };
    }

    // Walks the spine of the template, so that long templates don't
    // recurse. `(a . ,b)` reads as `(a unquote b)`, so unquote forms can
    // show up in the middle of the spine.
    let mut items = vec![];
    let mut level = level;
    let mut rest = template.clone();
    let tail = loop {
        let Some(cons) = rest.as_pair() else {
            break rest;
        };
        let head = cons.car();
        if head.is_symbol(&kw.quasiquote) {
            items.push(head.clone());
            level += 1;
        } else if head.is_symbol(&kw.unquote) {
            if level == 0 {
                let expr = single_operand(&rest, cons.cdr())?;
                break eval_value(ctx, &expr, env)?;
            }
            items.push(head.clone());
            level -= 1;
        } else if head
            .as_pair()
            .is_some_and(|inner| inner.car().is_symbol(&kw.unquote_splicing))
        {
            let splice = head.cdr()?;
            if level == 0 {
                let expr = single_operand(head, &splice)?;
                let value = eval_value(ctx, &expr, env)?;
                let spliced = list_to_vec(&value).ok_or_else(|| {
                    Error::type_mismatch(format!("unquote-splicing: {} is not a list", value))
                })?;
                items.extend(spliced);
            } else {
                let inner = qq(ctx, kw, &splice, level - 1, env)?;
                items.push(SchemyObject::cons(kw.unquote_splicing.clone().into(), inner));
            }
        } else {
            items.push(qq(ctx, kw, head, level, env)?);
        }
        rest = cons.cdr().clone();
    };
    Ok(list_with_tail(items, tail))
}

pub(crate) fn add(ctx: &mut SchemyContext) {
    fn quote(_ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        destruct_bind!((datum) = args.rest(), "quote");
        Ok(Bounce::Done(datum.clone()))
    }
    ctx.add_special_form("quote", quote);

    fn quasiquote(ctx: &mut SchemyContext, args: Arguments) -> Result<Bounce, Unwind> {
        destruct_bind!((template) = args.rest(), "quasiquote");
        let kw = ctx.keywords.clone();
        Ok(Bounce::Done(qq(ctx, &kw, template, 0, args.env())?))
    }
    ctx.add_special_form("quasiquote", quasiquote);

    fn unquote(_ctx: &mut SchemyContext, _args: Arguments) -> Result<Bounce, Unwind> {
        Err(Error::syntax_error("unquote outside quasiquote").into())
    }
    ctx.add_special_form("unquote", unquote);

    fn unquote_splicing(_ctx: &mut SchemyContext, _args: Arguments) -> Result<Bounce, Unwind> {
        Err(Error::syntax_error("unquote-splicing outside quasiquote").into())
    }
    ctx.add_special_form("unquote-splicing", unquote_splicing);
}
