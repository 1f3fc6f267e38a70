use std::{collections::HashMap, fs, io::Write, rc::Rc};

mod add_function;
pub use add_function::SchemyCallable;

mod rest;
pub use rest::Rest;

mod trace;
pub(crate) use trace::TraceEntry;

use tracing::{debug, warn};

use crate::{
    Error, SchemyObject, builtin,
    error::Unwind,
    eval,
    parse::parse,
    primitive::{Arguments, Arity, Primitive},
    procedure::{Bounce, Procedure},
    symbol::{Binding, Symbol},
};

/// Symbols the evaluator recognizes by identity.
#[derive(Clone)]
pub(crate) struct Keywords {
    pub define: Rc<Symbol>,
    pub begin: Rc<Symbol>,
    pub quote: Rc<Symbol>,
    pub quasiquote: Rc<Symbol>,
    pub unquote: Rc<Symbol>,
    pub unquote_splicing: Rc<Symbol>,
    pub else_: Rc<Symbol>,
    pub arrow: Rc<Symbol>,
    pub trace: Rc<Symbol>,
    pub untrace: Rc<Symbol>,
}

impl Keywords {
    fn new(symbols: &mut HashMap<String, Rc<Symbol>>) -> Self {
        let mut intern = |name: &str| {
            symbols
                .entry(name.to_string())
                .or_insert_with(|| Rc::new(Symbol::new(name)))
                .clone()
        };
        Keywords {
            define: intern("define"),
            begin: intern("begin"),
            quote: intern("quote"),
            quasiquote: intern("quasiquote"),
            unquote: intern("unquote"),
            unquote_splicing: intern("unquote-splicing"),
            else_: intern("else"),
            arrow: intern("=>"),
            trace: intern("trace"),
            untrace: intern("untrace"),
        }
    }
}

/// Represents an instance of the _Schemy_ interpreter.
///
/// Owns the symbol table, the registered primitives and the output sink.
/// Every global binding created through a context is cleared when the
/// context is dropped.
pub struct SchemyContext {
    symbols: HashMap<String, Rc<Symbol>>,
    pub(crate) keywords: Keywords,
    gensym_counter: u64,
    pub(crate) traced: HashMap<String, TraceEntry>,
    pub(crate) trace_level: usize,
    output: Box<dyn Write>,
}

impl Default for SchemyContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SchemyContext {
    fn drop(&mut self) {
        // Closures stored in globals refer back to their symbols through
        // their bodies.
        for symbol in self.symbols.values() {
            symbol.unbind();
        }
        self.traced.clear();
    }
}

impl SchemyContext {
    /// Creates a _Schemy_ context with the special forms and the full
    /// primitive library.
    pub fn new() -> Self {
        let mut ctx = Self::without_builtins();
        builtin::functions::add(&mut ctx);
        ctx
    }

    /// Creates a _Schemy_ context with only the special forms, leaving the
    /// procedure vocabulary to the host.
    pub fn without_builtins() -> Self {
        let mut symbols = HashMap::new();
        let keywords = Keywords::new(&mut symbols);
        let mut ctx = Self {
            symbols,
            keywords,
            gensym_counter: 0,
            traced: HashMap::new(),
            trace_level: 1,
            output: Box::new(std::io::stdout()),
        };
        builtin::forms::add(&mut ctx);
        ctx
    }

    /// Redirects everything the program prints (`display`, `write`,
    /// `newline`, `time` and function tracing). Defaults to stdout.
    pub fn set_output(&mut self, output: Box<dyn Write>) {
        self.output = output;
    }

    /// Writes `text` to the output sink, turning I/O failures into errors.
    pub(crate) fn print(&mut self, text: &str) -> Result<(), Error> {
        self.output
            .write_all(text.as_bytes())
            .and_then(|_| self.output.flush())
            .map_err(|e| Error::os_error(format!("write failed: {}", e)))
    }

    /// Returns an interned symbol with the given name. Interning the same
    /// name twice gives `eq?` symbols.
    pub fn intern(&mut self, name: &str) -> SchemyObject {
        self.intern_symbol(name).into()
    }

    pub(crate) fn intern_symbol(&mut self, name: &str) -> Rc<Symbol> {
        if let Some(sym) = self.symbols.get(name) {
            return sym.clone();
        }
        let sym = Rc::new(Symbol::new(name));
        self.symbols.insert(name.to_string(), sym.clone());
        sym
    }

    /// Returns a fresh uninterned symbol, distinct from every other symbol.
    pub fn gensym(&mut self) -> SchemyObject {
        let name = format!("#${}", self.gensym_counter);
        self.gensym_counter += 1;
        Rc::new(Symbol::new(name)).into()
    }

    /// Registers a special form: `func` receives the unevaluated operands
    /// in [`Arguments::rest`], along with the caller's environment and
    /// tail-position flag.
    pub fn add_special_form(
        &mut self,
        name: &str,
        func: impl Fn(&mut SchemyContext, Arguments) -> Result<Bounce, Unwind> + 'static,
    ) {
        let primitive = Primitive::new(name, Arity::variadic(), Box::new(func));
        self.install(name, Binding::Special(Rc::new(primitive)));
    }

    /// Registers a primitive procedure with the given arity. Callers'
    /// arguments are checked against `arity` before `func` is called.
    pub fn add_primitive(
        &mut self,
        name: &str,
        arity: Arity,
        func: impl Fn(&mut SchemyContext, Arguments) -> Result<Bounce, Unwind> + 'static,
    ) {
        let primitive = Primitive::new(name, arity, Box::new(func));
        let value = Procedure::Primitive(Rc::new(primitive)).into();
        self.install(name, Binding::Value(value));
    }

    /// Registers a Rust function as a primitive. Argument and return types
    /// are converted automatically.
    ///
    /// ```rust
    /// # use schemy::{SchemyContext, Rest, Error};
    /// # fn main() -> Result<(), Error> {
    /// let mut ctx = SchemyContext::new();
    /// ctx.add_function("sum", |nums: Rest<i64>| -> i64 { nums.into_iter().sum() });
    /// ctx.add_function("greet", |name: String, greeting: Option<String>| {
    ///     format!("{}, {}!", greeting.unwrap_or("Hello".to_string()), name)
    /// });
    ///
    /// assert_eq!(ctx.eval_string("(sum 1 2 3)")?.as_int()?, 6);
    /// assert_eq!(ctx.eval_string(r#"(greet "Ada")"#)?.as_string()?, "Hello, Ada!");
    /// # Ok(())
    /// # }
    /// ```
    pub fn add_function<
        Args: 'static,
        Output: 'static,
        const NEEDS_CONTEXT: bool,
        const NUM_ARGS: usize,
        const NUM_OPTIONAL: usize,
        const HAS_REST: bool,
        const FALLIBLE: bool,
    >(
        &mut self,
        name: &str,
        func: impl SchemyCallable<
            Args,
            Output,
            NEEDS_CONTEXT,
            NUM_ARGS,
            NUM_OPTIONAL,
            HAS_REST,
            FALLIBLE,
        >,
    ) {
        func.add_to_context(self, name);
    }

    fn install(&mut self, name: &str, binding: Binding) {
        let symbol = self.intern_symbol(name);
        if symbol.install(binding) {
            debug!(name, "registered");
        } else {
            warn!(name, "doubly defined symbol");
        }
    }

    /// Binds `name` globally to `value`, as a top-level `define` would.
    pub fn define(&mut self, name: &str, value: SchemyObject) -> Result<(), Error> {
        self.intern_symbol(name).define(value)
    }

    /// Evaluates a form at top level, where `define`, `begin`, `trace` and
    /// `untrace` have their top-level meaning.
    pub fn eval(&mut self, expr: &SchemyObject) -> Result<SchemyObject, Error> {
        eval::eval_toplevel(self, expr).map_err(Error::from)
    }

    /// Parses and evaluates each form in `string` in turn, and returns the
    /// value of the last one.
    pub fn eval_string(&mut self, string: &str) -> Result<SchemyObject, Error> {
        let forms = self.read_string(string)?;
        self.eval_each(&forms)
    }

    /// Parses and evaluates each form in the file at `filename`, and
    /// returns the value of the last one.
    pub fn eval_file(&mut self, filename: &str) -> Result<SchemyObject, Error> {
        let contents = fs::read_to_string(filename)
            .map_err(|e| Error::os_error(format!("Unable to read file: {filename}. Error: {e}")))?;
        self.eval_string(&contents)
    }

    /// Evaluates `forms` one after the other, stopping at the first error.
    pub fn eval_each(&mut self, forms: &[SchemyObject]) -> Result<SchemyObject, Error> {
        let mut ret = SchemyObject::nil();
        for form in forms {
            ret = self.eval(form)?;
        }
        Ok(ret)
    }

    /// Reads every form in `string` without evaluating them.
    pub fn read_string(&mut self, string: &str) -> Result<Vec<SchemyObject>, Error> {
        parse(self, string)
    }

    /// Calls the procedure `func` with already-evaluated `args`.
    pub fn apply(
        &mut self,
        func: &SchemyObject,
        args: Vec<SchemyObject>,
    ) -> Result<SchemyObject, Error> {
        let func = func.as_procedure()?;
        func.invoke(self, args).map_err(Error::from)
    }
}
