use crate::{
    Error, Rest, SchemyContext, SchemyObject,
    primitive::{Arity, FromArg},
    procedure::Bounce,
};

/// Implemented for Rust functions and closures that can be registered with
/// [`SchemyContext::add_function`].
///
/// The const parameters only tell the implementations apart: whether the
/// function takes the context, how many required and optional arguments
/// it has, whether it takes a [`Rest`] list, and whether it returns a
/// `Result`.
pub trait SchemyCallable<
    Args: 'static,
    Output: 'static,
    const NEEDS_CONTEXT: bool,
    const NUM_ARGS: usize,
    const NUM_OPTIONAL: usize,
    const HAS_REST: bool,
    const FALLIBLE: bool,
>
{
    fn add_to_context(self, ctx: &mut SchemyContext, name: &str);
}

macro_rules! impl_schemy_callable {
    (@extract $args_var: ident, ($($arg: ident),*), ($($opt: ident),*)) => {
        let _args = &$args_var;
        let _idx = 0usize;
        $(
            let $arg: $arg = _args.typed::<$arg>(_idx)?;
            let _idx = _idx + 1;
        )*
        let _idx = 0usize;
        $(
            let $opt: Option<$opt> = _args.typed_opt::<$opt>(_idx)?;
            let _idx = _idx + 1;
        )*
    };
    (
        args: $args_count:literal: ($($arg: ident),*),
        opts: $opts_count:literal: ($($opt: ident),*) $(,)?
    ) => {

        // Without context, infallible, no rest
        #[allow(nonstandard_style)]
        impl<OutT, FnT, $($arg,)* $($opt,)*>
        SchemyCallable<($($arg,)* $($opt,)*), OutT, false, $args_count, $opts_count, false, false> for FnT
        where
        FnT: Fn($($arg,)* $(Option<$opt>),*) -> OutT + 'static,
        $($arg: FromArg + 'static,)*
        $($opt: FromArg + 'static,)*
        OutT: Into<SchemyObject> + 'static,
        {
            fn add_to_context(self, ctx: &mut SchemyContext, name: &str) {
                ctx.add_primitive(
                    name,
                    Arity::new($args_count, $opts_count, false),
                    move |_ctx, args| {
                        impl_schemy_callable!(@extract args, ($($arg),*), ($($opt),*));
                        let res = (self)($($arg,)* $($opt),*);
                        Ok(Bounce::Done(res.into()))
                    },
                );
            }
        }

        // With context, infallible, no rest
        #[allow(nonstandard_style)]
        impl<OutT, FnT, $($arg,)* $($opt,)*>
        SchemyCallable<($($arg,)* $($opt,)*), OutT, true, $args_count, $opts_count, false, false> for FnT
        where
        FnT: Fn(&mut SchemyContext, $($arg,)* $(Option<$opt>),*) -> OutT + 'static,
        $($arg: FromArg + 'static,)*
        $($opt: FromArg + 'static,)*
        OutT: Into<SchemyObject> + 'static,
        {
            fn add_to_context(self, ctx: &mut SchemyContext, name: &str) {
                ctx.add_primitive(
                    name,
                    Arity::new($args_count, $opts_count, false),
                    move |ctx, args| {
                        impl_schemy_callable!(@extract args, ($($arg),*), ($($opt),*));
                        let res = (self)(ctx, $($arg,)* $($opt),*);
                        Ok(Bounce::Done(res.into()))
                    },
                );
            }
        }

        // Without context, fallible, no rest
        #[allow(nonstandard_style)]
        impl<OutT, FnT, $($arg,)* $($opt,)*>
        SchemyCallable<($($arg,)* $($opt,)*), OutT, false, $args_count, $opts_count, false, true> for FnT
        where
        FnT: Fn($($arg,)* $(Option<$opt>),*) -> Result<OutT, Error> + 'static,
        $($arg: FromArg + 'static,)*
        $($opt: FromArg + 'static,)*
        OutT: Into<SchemyObject> + 'static,
        {
            fn add_to_context(self, ctx: &mut SchemyContext, name: &str) {
                ctx.add_primitive(
                    name,
                    Arity::new($args_count, $opts_count, false),
                    move |_ctx, args| {
                        impl_schemy_callable!(@extract args, ($($arg),*), ($($opt),*));
                        let res = (self)($($arg,)* $($opt),*)?;
                        Ok(Bounce::Done(res.into()))
                    },
                );
            }
        }

        // With context, fallible, no rest
        #[allow(nonstandard_style)]
        impl<OutT, FnT, $($arg,)* $($opt,)*>
        SchemyCallable<($($arg,)* $($opt,)*), OutT, true, $args_count, $opts_count, false, true> for FnT
        where
        FnT: Fn(&mut SchemyContext, $($arg,)* $(Option<$opt>),*) -> Result<OutT, Error> + 'static,
        $($arg: FromArg + 'static,)*
        $($opt: FromArg + 'static,)*
        OutT: Into<SchemyObject> + 'static,
        {
            fn add_to_context(self, ctx: &mut SchemyContext, name: &str) {
                ctx.add_primitive(
                    name,
                    Arity::new($args_count, $opts_count, false),
                    move |ctx, args| {
                        impl_schemy_callable!(@extract args, ($($arg),*), ($($opt),*));
                        let res = (self)(ctx, $($arg,)* $($opt),*)?;
                        Ok(Bounce::Done(res.into()))
                    },
                );
            }
        }

        // Without context, infallible, with rest
        #[allow(nonstandard_style)]
        impl<RestT, OutT, FnT, $($arg,)* $($opt,)*>
        SchemyCallable<($($arg,)* $($opt,)* RestT,), OutT, false, $args_count, $opts_count, true, false> for FnT
        where
        FnT: Fn($($arg,)* $(Option<$opt>,)* Rest<RestT>) -> OutT + 'static,
        $($arg: FromArg + 'static,)*
        $($opt: FromArg + 'static,)*
        RestT: FromArg + 'static,
        OutT: Into<SchemyObject> + 'static,
        {
            fn add_to_context(self, ctx: &mut SchemyContext, name: &str) {
                ctx.add_primitive(
                    name,
                    Arity::new($args_count, $opts_count, true),
                    move |_ctx, args| {
                        impl_schemy_callable!(@extract args, ($($arg),*), ($($opt),*));
                        let rest = Rest::new(args.typed_rest::<RestT>()?);
                        let res = (self)($($arg,)* $($opt,)* rest);
                        Ok(Bounce::Done(res.into()))
                    },
                );
            }
        }

        // With context, infallible, with rest
        #[allow(nonstandard_style)]
        impl<RestT, OutT, FnT, $($arg,)* $($opt,)*>
        SchemyCallable<($($arg,)* $($opt,)* RestT,), OutT, true, $args_count, $opts_count, true, false> for FnT
        where
        FnT: Fn(&mut SchemyContext, $($arg,)* $(Option<$opt>,)* Rest<RestT>) -> OutT + 'static,
        $($arg: FromArg + 'static,)*
        $($opt: FromArg + 'static,)*
        RestT: FromArg + 'static,
        OutT: Into<SchemyObject> + 'static,
        {
            fn add_to_context(self, ctx: &mut SchemyContext, name: &str) {
                ctx.add_primitive(
                    name,
                    Arity::new($args_count, $opts_count, true),
                    move |ctx, args| {
                        impl_schemy_callable!(@extract args, ($($arg),*), ($($opt),*));
                        let rest = Rest::new(args.typed_rest::<RestT>()?);
                        let res = (self)(ctx, $($arg,)* $($opt,)* rest);
                        Ok(Bounce::Done(res.into()))
                    },
                );
            }
        }

        // Without context, fallible, with rest
        #[allow(nonstandard_style)]
        impl<RestT, OutT, FnT, $($arg,)* $($opt,)*>
        SchemyCallable<($($arg,)* $($opt,)* RestT,), OutT, false, $args_count, $opts_count, true, true> for FnT
        where
        FnT: Fn($($arg,)* $(Option<$opt>,)* Rest<RestT>) -> Result<OutT, Error> + 'static,
        $($arg: FromArg + 'static,)*
        $($opt: FromArg + 'static,)*
        RestT: FromArg + 'static,
        OutT: Into<SchemyObject> + 'static,
        {
            fn add_to_context(self, ctx: &mut SchemyContext, name: &str) {
                ctx.add_primitive(
                    name,
                    Arity::new($args_count, $opts_count, true),
                    move |_ctx, args| {
                        impl_schemy_callable!(@extract args, ($($arg),*), ($($opt),*));
                        let rest = Rest::new(args.typed_rest::<RestT>()?);
                        let res = (self)($($arg,)* $($opt,)* rest)?;
                        Ok(Bounce::Done(res.into()))
                    },
                );
            }
        }

        // With context, fallible, with rest
        #[allow(nonstandard_style)]
        impl<RestT, OutT, FnT, $($arg,)* $($opt,)*>
        SchemyCallable<($($arg,)* $($opt,)* RestT,), OutT, true, $args_count, $opts_count, true, true> for FnT
        where
        FnT: Fn(&mut SchemyContext, $($arg,)* $(Option<$opt>,)* Rest<RestT>) -> Result<OutT, Error> + 'static,
        $($arg: FromArg + 'static,)*
        $($opt: FromArg + 'static,)*
        RestT: FromArg + 'static,
        OutT: Into<SchemyObject> + 'static,
        {
            fn add_to_context(self, ctx: &mut SchemyContext, name: &str) {
                ctx.add_primitive(
                    name,
                    Arity::new($args_count, $opts_count, true),
                    move |ctx, args| {
                        impl_schemy_callable!(@extract args, ($($arg),*), ($($opt),*));
                        let rest = Rest::new(args.typed_rest::<RestT>()?);
                        let res = (self)(ctx, $($arg,)* $($opt,)* rest)?;
                        Ok(Bounce::Done(res.into()))
                    },
                );
            }
        }
    };
}

impl_schemy_callable!(args: 0: (), opts: 0: ());
impl_schemy_callable!(args: 0: (), opts: 1: (O1));
impl_schemy_callable!(args: 0: (), opts: 2: (O1, O2));
impl_schemy_callable!(args: 1: (A1), opts: 0: ());
impl_schemy_callable!(args: 1: (A1), opts: 1: (O1));
impl_schemy_callable!(args: 1: (A1), opts: 2: (O1, O2));
impl_schemy_callable!(args: 2: (A1, A2), opts: 0: ());
impl_schemy_callable!(args: 2: (A1, A2), opts: 1: (O1));
impl_schemy_callable!(args: 2: (A1, A2), opts: 2: (O1, O2));
impl_schemy_callable!(args: 3: (A1, A2, A3), opts: 0: ());
impl_schemy_callable!(args: 3: (A1, A2, A3), opts: 1: (O1));
impl_schemy_callable!(args: 3: (A1, A2, A3), opts: 2: (O1, O2));

#[cfg(feature = "big_functions")]
mod big_functions {
    use super::*;

    impl_schemy_callable!(args: 0: (), opts: 3: (O1, O2, O3));
    impl_schemy_callable!(args: 1: (A1), opts: 3: (O1, O2, O3));
    impl_schemy_callable!(args: 2: (A1, A2), opts: 3: (O1, O2, O3));
    impl_schemy_callable!(args: 3: (A1, A2, A3), opts: 3: (O1, O2, O3));
    impl_schemy_callable!(args: 4: (A1, A2, A3, A4), opts: 0: ());
    impl_schemy_callable!(args: 4: (A1, A2, A3, A4), opts: 1: (O1));
    impl_schemy_callable!(args: 4: (A1, A2, A3, A4), opts: 2: (O1, O2));
    impl_schemy_callable!(args: 4: (A1, A2, A3, A4), opts: 3: (O1, O2, O3));
    impl_schemy_callable!(args: 5: (A1, A2, A3, A4, A5), opts: 0: ());
    impl_schemy_callable!(args: 5: (A1, A2, A3, A4, A5), opts: 1: (O1));
    impl_schemy_callable!(args: 5: (A1, A2, A3, A4, A5), opts: 2: (O1, O2));
    impl_schemy_callable!(args: 5: (A1, A2, A3, A4, A5), opts: 3: (O1, O2, O3));
}
