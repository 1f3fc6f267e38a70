use crate::{Error, SchemyObject, cons::list_to_vec};

mod binding;
mod conditionals;
mod definitions;
mod quoting;

pub(crate) fn add(ctx: &mut crate::SchemyContext) {
    binding::add(ctx);
    conditionals::add(ctx);
    definitions::add(ctx);
    quoting::add(ctx);
}

/// The items of a clause or binding, which must be a proper list.
fn clause_items(clause: &SchemyObject, form: &str) -> Result<Vec<SchemyObject>, Error> {
    list_to_vec(clause).ok_or_else(|| Error::syntax_error(format!("bad {} clause {}", form, clause)))
}
