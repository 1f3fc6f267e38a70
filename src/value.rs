use crate::{SchemyObject, cons::Cons, procedure::Procedure, symbol::Symbol};
use std::{
    any::Any,
    collections::HashSet,
    fmt::{self, Write},
    rc::Rc,
};

/// The representation of every Schemy value.
#[derive(Clone)]
pub enum SchemyValue {
    /// The empty list.
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    String(String),
    Symbol(Rc<Symbol>),
    Pair(Cons),
    Vector(Vec<SchemyObject>),
    Procedure(Procedure),
    /// An opaque host value.
    Any(Rc<dyn Any>),
    /// Placeholder held by a forward-reference binding until its
    /// initializer has run.
    Undefined,
}

impl SchemyValue {
    pub(crate) fn write_to(&self, f: &mut impl Write, display: bool) -> fmt::Result {
        self.write_nested(f, display, &mut HashSet::new())
    }

    fn write_nested(
        &self,
        f: &mut impl Write,
        display: bool,
        open: &mut HashSet<*const ()>,
    ) -> fmt::Result {
        match self {
            SchemyValue::Nil => f.write_str("()"),
            SchemyValue::Bool(true) => f.write_str("#t"),
            SchemyValue::Bool(false) => f.write_str("#f"),
            SchemyValue::Int(vv) => write!(f, "{}", vv),
            SchemyValue::Float(vv) => write!(f, "{:?}", vv),
            SchemyValue::Char(ch) if display => f.write_char(*ch),
            SchemyValue::Char(ch) => match ch {
                ' ' => f.write_str("#\\space"),
                '\n' => f.write_str("#\\newline"),
                '\t' => f.write_str("#\\tab"),
                ch => write!(f, "#\\{}", ch),
            },
            SchemyValue::String(vv) if display => f.write_str(vv),
            SchemyValue::String(vv) => {
                f.write_char('"')?;
                for ch in vv.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        ch => f.write_char(ch)?,
                    }
                }
                f.write_char('"')
            }
            SchemyValue::Symbol(sym) => f.write_str(sym.name()),
            SchemyValue::Pair(cons) => fmt_list(cons, f, display, open),
            SchemyValue::Vector(items) => {
                f.write_str("#(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_char(' ')?;
                    }
                    write_object(item, f, display, open)?;
                }
                f.write_char(')')
            }
            SchemyValue::Procedure(func) => write!(f, "{}", func),
            SchemyValue::Any(_) => f.write_str("#<object>"),
            SchemyValue::Undefined => f.write_str("#<undefined>"),
        }
    }
}

/// Writes `obj`, or `...` in place of a pair or vector that is already
/// being written further out, so cyclic structure terminates.
pub(crate) fn write_object(
    obj: &SchemyObject,
    f: &mut impl Write,
    display: bool,
    open: &mut HashSet<*const ()>,
) -> fmt::Result {
    let inner = obj.inner_ref();
    if !matches!(&*inner, SchemyValue::Pair(_) | SchemyValue::Vector(_)) {
        return inner.write_nested(f, display, open);
    }
    let addr = obj.addr();
    if !open.insert(addr) {
        return f.write_str("...");
    }
    let res = inner.write_nested(f, display, open);
    open.remove(&addr);
    res
}

/// Formats lists without recursing on the `cdr`. A spine that loops back
/// on itself ends in `...`.
fn fmt_list(
    cons: &Cons,
    f: &mut impl Write,
    display: bool,
    open: &mut HashSet<*const ()>,
) -> fmt::Result {
    let mut spine = vec![];
    f.write_char('(')?;
    write_object(cons.car(), f, display, open)?;
    let mut rest = cons.cdr().clone();
    loop {
        let next = match &*rest.inner_ref() {
            SchemyValue::Pair(cons) => {
                let addr = rest.addr();
                if !open.insert(addr) {
                    f.write_str(" ...")?;
                    break;
                }
                spine.push(addr);
                f.write_char(' ')?;
                write_object(cons.car(), f, display, open)?;
                cons.cdr().clone()
            }
            SchemyValue::Nil => break,
            _ => {
                f.write_str(" . ")?;
                write_object(&rest, f, display, open)?;
                break;
            }
        };
        rest = next;
    }
    for addr in spine {
        open.remove(&addr);
    }
    f.write_char(')')
}

impl fmt::Display for SchemyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, false)
    }
}

impl fmt::Debug for SchemyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, false)
    }
}

impl From<i64> for SchemyValue {
    fn from(vv: i64) -> Self {
        SchemyValue::Int(vv)
    }
}

impl From<f64> for SchemyValue {
    fn from(vv: f64) -> Self {
        SchemyValue::Float(vv)
    }
}

impl From<bool> for SchemyValue {
    fn from(vv: bool) -> Self {
        SchemyValue::Bool(vv)
    }
}

impl From<char> for SchemyValue {
    fn from(vv: char) -> Self {
        SchemyValue::Char(vv)
    }
}

impl From<&str> for SchemyValue {
    fn from(vv: &str) -> Self {
        SchemyValue::String(vv.to_owned())
    }
}

impl From<String> for SchemyValue {
    fn from(vv: String) -> Self {
        SchemyValue::String(vv)
    }
}

impl From<Procedure> for SchemyValue {
    fn from(vv: Procedure) -> Self {
        SchemyValue::Procedure(vv)
    }
}

impl From<Rc<dyn Any>> for SchemyValue {
    fn from(vv: Rc<dyn Any>) -> Self {
        SchemyValue::Any(vv)
    }
}

#[cfg(test)]
mod tests {
    use crate::SchemyObject;

    #[test]
    fn test_write_and_display() {
        let list: SchemyObject = vec![
            SchemyObject::from(1),
            SchemyObject::from(2.0),
            SchemyObject::from("a\"b"),
            SchemyObject::from(' '),
        ]
        .into_iter()
        .collect();
        assert_eq!(list.to_string(), r#"(1 2.0 "a\"b" #\space)"#);
        assert_eq!(list.fmt_string(), r#"(1 2.0 a"b  )"#);

        let dotted = SchemyObject::cons(1.into(), SchemyObject::cons(2.into(), 3.into()));
        assert_eq!(dotted.to_string(), "(1 2 . 3)");
        assert_eq!(SchemyObject::nil().to_string(), "()");
        assert_eq!(SchemyObject::from(false).to_string(), "#f");
    }

    #[test]
    fn test_write_cyclic() {
        let ring: SchemyObject = vec![SchemyObject::from(1i64), SchemyObject::from(2i64)]
            .into_iter()
            .collect();
        ring.cdr().unwrap().set_cdr(ring.clone()).unwrap();
        assert_eq!(ring.to_string(), "(1 2 ...)");

        let nested = SchemyObject::cons(1i64.into(), SchemyObject::nil());
        nested.set_car(nested.clone()).unwrap();
        assert_eq!(nested.to_string(), "(...)");

        let vector = SchemyObject::vector(vec![SchemyObject::nil()]);
        let wrapper = SchemyObject::cons(vector.clone(), SchemyObject::nil());
        vector.with_vector_mut(|items| items[0] = wrapper.clone());
        assert_eq!(wrapper.to_string(), "(#((...)))");

        // Shared but acyclic structure prints in full.
        let shared: SchemyObject = vec![SchemyObject::from(7i64)].into_iter().collect();
        let pair = SchemyObject::cons(shared.clone(), shared.clone());
        assert_eq!(pair.to_string(), "((7) 7)");

        ring.cdr().unwrap().set_cdr(SchemyObject::nil()).unwrap();
        nested.set_car(SchemyObject::nil()).unwrap();
        vector.with_vector_mut(|items| items.clear());
    }
}
