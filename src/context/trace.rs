use std::rc::Rc;

use tracing::debug;

use crate::{
    Error, SchemyContext, SchemyObject,
    error::Unwind,
    primitive::{Arguments, Arity, Primitive},
    procedure::{Bounce, Procedure},
    symbol::{Binding, Symbol},
};

/// A traced global: the wrapper installed in place of the original
/// procedure.
pub(crate) struct TraceEntry {
    symbol: Rc<Symbol>,
    wrapper: SchemyObject,
    original: SchemyObject,
}

impl TraceEntry {
    /// Whether the global still holds the wrapper, i.e. it wasn't
    /// redefined after being traced.
    fn is_installed(&self) -> bool {
        self.symbol
            .global_value()
            .map(|current| current.eq(&self.wrapper))
            .unwrap_or(false)
    }

    fn restore(self) -> Result<SchemyObject, Error> {
        self.symbol.define(self.original)?;
        debug!(name = self.symbol.name(), "untraced");
        Ok(self.symbol.into())
    }
}

/// Wraps `original` so that every call to it prints its arguments and its
/// result, indented by nesting depth.
fn make_tracer(symbol: &Rc<Symbol>, original: Procedure) -> SchemyObject {
    let head: SchemyObject = symbol.clone().into();
    let tracer = move |ctx: &mut SchemyContext, args: Arguments| -> Result<Bounce, Unwind> {
        let args = args.rest().to_vec();
        let level = ctx.trace_level;
        let indent = "  ".repeat(level);
        let call: SchemyObject = std::iter::once(head.clone())
            .chain(args.iter().cloned())
            .collect();
        ctx.print(&format!("{}{}> {}\n", indent, level, call))?;
        ctx.trace_level += 1;
        let result = original.invoke(ctx, args);
        ctx.trace_level = level;
        let value = result?;
        ctx.print(&format!("{}<{} ({} {})\n", indent, level, head, value))?;
        Ok(Bounce::Done(value))
    };
    let primitive = Primitive::new(symbol.name(), Arity::variadic(), Box::new(tracer));
    Procedure::Primitive(Rc::new(primitive)).into()
}

impl SchemyContext {
    /// Replaces each named global procedure with a tracing wrapper. Returns
    /// the list of names that were traced.
    pub(crate) fn trace(&mut self, names: &[Rc<Symbol>]) -> Result<SchemyObject, Error> {
        let mut traced = vec![];
        for symbol in names {
            let current = match symbol.binding() {
                Binding::Value(value) if value.procedurep() => value,
                _ => {
                    self.print(&format!("function {} is not defined\n", symbol.name()))?;
                    continue;
                }
            };
            if let Some(entry) = self.traced.get(symbol.name()) {
                if entry.wrapper.eq(&current) {
                    self.print(&format!("function {} is already traced\n", symbol.name()))?;
                    continue;
                }
            }
            let wrapper = make_tracer(symbol, current.as_procedure()?);
            symbol.define(wrapper.clone())?;
            self.traced.insert(
                symbol.name().to_string(),
                TraceEntry {
                    symbol: symbol.clone(),
                    wrapper,
                    original: current,
                },
            );
            debug!(name = symbol.name(), "traced");
            traced.push(symbol.clone().into());
        }
        Ok(traced.into_iter().collect())
    }

    /// Restores the named traced procedures, or every traced procedure
    /// when `names` is empty. A procedure redefined since it was traced is
    /// left alone. Returns the list of names that were restored.
    pub(crate) fn untrace(&mut self, names: &[Rc<Symbol>]) -> Result<SchemyObject, Error> {
        let mut untraced = vec![];
        if names.is_empty() {
            let mut entries: Vec<_> = self.traced.drain().map(|(_, entry)| entry).collect();
            entries.sort_by(|a, b| a.symbol.name().cmp(b.symbol.name()));
            for entry in entries {
                if entry.is_installed() {
                    untraced.push(entry.restore()?);
                }
            }
        } else {
            for symbol in names {
                match self.traced.remove(symbol.name()) {
                    None => {
                        self.print(&format!("function {} is not traced\n", symbol.name()))?;
                    }
                    Some(entry) if entry.is_installed() => untraced.push(entry.restore()?),
                    Some(_) => {
                        self.print(&format!("function {} has been redefined\n", symbol.name()))?;
                    }
                }
            }
        }
        Ok(untraced.into_iter().collect())
    }
}
