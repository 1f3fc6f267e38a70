use crate::{SchemyContext, SchemyObject};

pub(crate) fn add(ctx: &mut SchemyContext) {
    ctx.add_function("eq?", |a: SchemyObject, b: SchemyObject| a.eq(&b));
    ctx.add_function("eqv?", |a: SchemyObject, b: SchemyObject| a.eqv(&b));
    ctx.add_function("equal?", |a: SchemyObject, b: SchemyObject| a.equal(&b));
    ctx.add_function("not", |x: bool| !x);
    ctx.add_function("boolean?", |x: SchemyObject| x.booleanp());
}
