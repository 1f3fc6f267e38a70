use crate::{Error, SchemyContext, SchemyObject};

pub(crate) fn add(ctx: &mut SchemyContext) {
    ctx.add_function(
        "display",
        |ctx: &mut SchemyContext, obj: SchemyObject| -> Result<SchemyObject, Error> {
            ctx.print(&obj.fmt_string())?;
            Ok(obj)
        },
    );
    ctx.add_function(
        "write",
        |ctx: &mut SchemyContext, obj: SchemyObject| -> Result<SchemyObject, Error> {
            ctx.print(&obj.to_string())?;
            Ok(obj)
        },
    );
    ctx.add_function("newline", |ctx: &mut SchemyContext| -> Result<bool, Error> {
        ctx.print("\n")?;
        Ok(true)
    });
}
