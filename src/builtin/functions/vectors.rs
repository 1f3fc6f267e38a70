use crate::{
    Error, Rest, SchemyContext, SchemyObject,
    primitive::{ListArg, VectorArg},
};

fn check_index(name: &str, k: i64, len: usize) -> Result<usize, Error> {
    usize::try_from(k)
        .ok()
        .filter(|k| *k < len)
        .ok_or_else(|| {
            Error::out_of_range(format!("{}: index {} is out of range for length {}", name, k, len))
        })
}

// `VectorArg` always holds a vector, so the `unwrap_or` fallbacks below
// are never taken.
fn vector_len(vector: &SchemyObject) -> usize {
    vector.with_vector(|items| items.len()).unwrap_or(0)
}

pub(crate) fn add(ctx: &mut SchemyContext) {
    ctx.add_function("vector?", |x: SchemyObject| x.vectorp());
    ctx.add_function("vector", |items: Rest<SchemyObject>| {
        SchemyObject::vector(items.into_iter().collect())
    });

    ctx.add_function(
        "make-vector",
        |k: i64, fill: Option<SchemyObject>| -> Result<SchemyObject, Error> {
            let len = usize::try_from(k)
                .map_err(|_| Error::out_of_range(format!("make-vector: bad length {}", k)))?;
            let fill = fill.unwrap_or_else(|| 0.into());
            Ok(SchemyObject::vector(vec![fill; len]))
        },
    );

    ctx.add_function("vector-length", |VectorArg(vector): VectorArg| {
        vector_len(&vector) as i64
    });

    ctx.add_function(
        "vector-ref",
        |VectorArg(vector): VectorArg, k: i64| -> Result<SchemyObject, Error> {
            let index = check_index("vector-ref", k, vector_len(&vector))?;
            Ok(vector
                .with_vector(|items| items[index].clone())
                .unwrap_or_else(SchemyObject::nil))
        },
    );

    ctx.add_function(
        "vector-set!",
        |VectorArg(vector): VectorArg, k: i64, value: SchemyObject| -> Result<SchemyObject, Error> {
            let index = check_index("vector-set!", k, vector_len(&vector))?;
            vector.with_vector_mut(|items| items[index] = value.clone());
            Ok(value)
        },
    );

    ctx.add_function("vector->list", |VectorArg(vector): VectorArg| -> SchemyObject {
        vector
            .with_vector(|items| items.iter().cloned().collect())
            .unwrap_or_else(SchemyObject::nil)
    });
    ctx.add_function("list->vector", |ListArg(items): ListArg| {
        SchemyObject::vector(items)
    });
}
