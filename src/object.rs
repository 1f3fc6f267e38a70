use crate::{
    cons::{self, Cons},
    error::Error,
    primitive::FromArg,
    procedure::Procedure,
    symbol::Symbol,
    value::{SchemyValue, write_object},
};
use std::{
    any::Any,
    cell::{Ref, RefCell},
    collections::HashSet,
    rc::Rc,
};

/// A type for representing Schemy objects.
///
/// Cloning a `SchemyObject` is cheap, and produces another handle to the
/// same underlying value.
#[derive(Clone)]
pub struct SchemyObject {
    rc: Rc<RefCell<SchemyValue>>,
}

impl Default for SchemyObject {
    fn default() -> Self {
        SchemyObject::nil()
    }
}

impl std::fmt::Display for SchemyObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_object(self, f, false, &mut HashSet::new())
    }
}

impl std::fmt::Debug for SchemyObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_object(self, f, false, &mut HashSet::new())
    }
}

// Long lists would otherwise be dropped through one nested call per pair.
impl Drop for SchemyObject {
    fn drop(&mut self) {
        if Rc::strong_count(&self.rc) != 1 {
            return;
        }
        let mut next = match self.rc.try_borrow_mut() {
            Ok(mut inner) => match &mut *inner {
                SchemyValue::Pair(cons) => cons.take_cdr(),
                _ => return,
            },
            Err(_) => return,
        };
        while Rc::strong_count(&next.rc) == 1 {
            let following = match next.rc.try_borrow_mut() {
                Ok(mut inner) => match &mut *inner {
                    SchemyValue::Pair(cons) => cons.take_cdr(),
                    _ => break,
                },
                Err(_) => break,
            };
            next = following;
        }
    }
}

macro_rules! predicate_fn {
    ($visibility: vis, $name: ident, $pat: pat $(, $doc: literal)?) => {
        $(#[doc=$doc])?
        $visibility fn $name(&self) -> bool {
            matches!(*self.inner_ref(), $pat)
        }
    };
}

macro_rules! extractor_fn_with_err {
    ($retty: ty, $name: ident, $kind: literal, $(#[doc = $doc: literal])? $($pat: pat => $out: expr),+ $(,)?) => {
        $(#[doc=$doc])?
        pub fn $name(&self) -> Result<$retty, Error> {
            match &*self.inner_ref() {
                $($pat => Ok($out),)+
                _ => Err(Error::type_mismatch(format!("{} is not {}", self, $kind))),
            }
        }
    };
}

// pub methods on SchemyObject
impl SchemyObject {
    /// Creates the empty list.
    pub fn nil() -> SchemyObject {
        SchemyObject::new(SchemyValue::Nil)
    }

    /// Makes a pair with the given car and cdr values.
    pub fn cons(car: SchemyObject, cdr: SchemyObject) -> SchemyObject {
        SchemyObject::new(SchemyValue::Pair(Cons::new(car, cdr)))
    }

    /// Makes a vector holding `items`.
    pub fn vector(items: Vec<SchemyObject>) -> SchemyObject {
        SchemyObject::new(SchemyValue::Vector(items))
    }

    /// Returns true if `self` and `other` are the same object. The empty
    /// list, the booleans, symbols and procedures compare by identity of
    /// what they denote.
    pub fn eq(&self, other: &SchemyObject) -> bool {
        if Rc::ptr_eq(&self.rc, &other.rc) {
            return true;
        }
        match (&*self.inner_ref(), &*other.inner_ref()) {
            (SchemyValue::Nil, SchemyValue::Nil) => true,
            (SchemyValue::Bool(a), SchemyValue::Bool(b)) => a == b,
            (SchemyValue::Symbol(a), SchemyValue::Symbol(b)) => Rc::ptr_eq(a, b),
            (SchemyValue::Procedure(a), SchemyValue::Procedure(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Like [`eq`](Self::eq), but numbers and characters compare by value,
    /// and any two empty strings are equivalent.
    pub fn eqv(&self, other: &SchemyObject) -> bool {
        if self.eq(other) {
            return true;
        }
        match (&*self.inner_ref(), &*other.inner_ref()) {
            (SchemyValue::Int(a), SchemyValue::Int(b)) => a == b,
            (SchemyValue::Float(a), SchemyValue::Float(b)) => a == b,
            (SchemyValue::Int(a), SchemyValue::Float(b))
            | (SchemyValue::Float(b), SchemyValue::Int(a)) => *a as f64 == *b,
            (SchemyValue::Char(a), SchemyValue::Char(b)) => a == b,
            (SchemyValue::String(a), SchemyValue::String(b)) => a.is_empty() && b.is_empty(),
            _ => false,
        }
    }

    /// Structural equality over pairs, vectors and strings; `eqv` otherwise.
    pub fn equal(&self, other: &SchemyObject) -> bool {
        let mut lhs = self.clone();
        let mut rhs = other.clone();
        loop {
            if lhs.eqv(&rhs) {
                return true;
            }
            let (next_lhs, next_rhs) = match (&*lhs.inner_ref(), &*rhs.inner_ref()) {
                (SchemyValue::Pair(a), SchemyValue::Pair(b)) => {
                    if !a.car().equal(b.car()) {
                        return false;
                    }
                    (a.cdr().clone(), b.cdr().clone())
                }
                (SchemyValue::String(a), SchemyValue::String(b)) => return a == b,
                (SchemyValue::Vector(a), SchemyValue::Vector(b)) => {
                    return a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equal(y));
                }
                _ => return false,
            };
            lhs = next_lhs;
            rhs = next_rhs;
        }
    }

    /// Returns the `car` of `self` if it is a pair, and an Error otherwise.
    pub fn car(&self) -> Result<SchemyObject, Error> {
        self.as_pair()
            .map(|cons| cons.car().clone())
            .ok_or_else(|| Error::type_mismatch(format!("{} is not a pair", self)))
    }

    /// Returns the `cdr` of `self` if it is a pair, and an Error otherwise.
    pub fn cdr(&self) -> Result<SchemyObject, Error> {
        self.as_pair()
            .map(|cons| cons.cdr().clone())
            .ok_or_else(|| Error::type_mismatch(format!("{} is not a pair", self)))
    }

    /// Replaces the `car` of the pair in place.
    pub fn set_car(&self, car: SchemyObject) -> Result<(), Error> {
        match &mut *self.rc.borrow_mut() {
            SchemyValue::Pair(cons) => {
                cons.set_car(car);
                Ok(())
            }
            other => Err(Error::type_mismatch(format!("{} is not a pair", other))),
        }
    }

    /// Replaces the `cdr` of the pair in place.
    pub fn set_cdr(&self, cdr: SchemyObject) -> Result<(), Error> {
        match &mut *self.rc.borrow_mut() {
            SchemyValue::Pair(cons) => {
                cons.set_cdr(cdr);
                Ok(())
            }
            other => Err(Error::type_mismatch(format!("{} is not a pair", other))),
        }
    }

    /// Returns a copy of the pair cell, if `self` is a pair.
    pub fn as_pair(&self) -> Option<Cons> {
        match &*self.inner_ref() {
            SchemyValue::Pair(cons) => Some(cons.clone()),
            _ => None,
        }
    }

    /// Returns an iterator over the elements of the list in `self`.
    pub fn base_iter(&self) -> cons::BaseIter {
        cons::BaseIter::new(self.clone())
    }

    /// Returns an iterator over the elements of the list in `self`,
    /// converted to `T`.
    ///
    /// ## Example
    /// ```rust
    /// # use schemy::{SchemyContext, Error};
    /// #
    /// # fn main() -> Result<(), Error> {
    /// # let mut ctx = SchemyContext::new();
    /// #
    /// let items = ctx.eval_string("'(10 20 30 40 -5)")?;
    ///
    /// let items_vec: Vec<i64> = items.iter::<i64>().collect::<Result<_, _>>()?;
    ///
    /// assert_eq!(items_vec, vec![10, 20, 30, 40, -5]);
    /// #
    /// # Ok(())
    /// # }
    /// ```
    pub fn iter<T: FromArg>(&self) -> cons::Iter<T> {
        cons::Iter::new(self.base_iter())
    }

    /// Returns the `display` representation of `self`: strings and
    /// characters without quoting.
    pub fn fmt_string(&self) -> String {
        let mut out = String::new();
        // Writing into a String can't fail.
        let _ = write_object(self, &mut out, true, &mut HashSet::new());
        out
    }

    /// Returns true if `self` is a proper list.
    pub fn listp(&self) -> bool {
        let mut slow = self.clone();
        let mut fast = self.clone();
        loop {
            for _ in 0..2 {
                let next = match &*fast.inner_ref() {
                    SchemyValue::Nil => return true,
                    SchemyValue::Pair(cons) => cons.cdr().clone(),
                    _ => return false,
                };
                fast = next;
            }
            let next = match &*slow.inner_ref() {
                SchemyValue::Pair(cons) => cons.cdr().clone(),
                _ => return false,
            };
            slow = next;
            if Rc::ptr_eq(&slow.rc, &fast.rc) {
                return false;
            }
        }
    }

    /// Returns false only for `#f`. Every other value, the empty list
    /// included, counts as true.
    pub fn as_bool(&self) -> bool {
        !matches!(*self.inner_ref(), SchemyValue::Bool(false))
    }

    // extractors begin
    extractor_fn_with_err!(
        i64,
        as_int,
        "an integer",
        #[doc = "Returns an int if `self` holds an int, and an Error otherwise."]
        SchemyValue::Int(vv) => *vv
    );
    extractor_fn_with_err!(
        f64,
        as_float,
        "a float",
        #[doc = "Returns a float if `self` holds a float, and an Error otherwise."]
        SchemyValue::Float(vv) => *vv
    );
    extractor_fn_with_err!(
        f64,
        try_float,
        "a number",
        #[doc = "Returns a float if `self` holds a float or an int, and an Error otherwise."]
        SchemyValue::Float(vv) => *vv,
        SchemyValue::Int(vv) => *vv as f64
    );
    extractor_fn_with_err!(
        String,
        as_string,
        "a string",
        #[doc = "Returns a string if `self` contains a string, and an Error otherwise."]
        SchemyValue::String(vv) => vv.clone()
    );
    extractor_fn_with_err!(
        String,
        as_symbol,
        "a symbol",
        #[doc = "Returns the name of the symbol in `self`, and an Error if `self` is not a symbol."]
        SchemyValue::Symbol(sym) => sym.name().to_string()
    );
    extractor_fn_with_err!(
        char,
        as_char,
        "a character",
        SchemyValue::Char(vv) => *vv
    );
    extractor_fn_with_err!(
        Procedure,
        as_procedure,
        "a procedure",
        #[doc = "Returns the procedure held by `self`, and an Error otherwise."]
        SchemyValue::Procedure(vv) => vv.clone()
    );
    extractor_fn_with_err!(
        Rc<dyn Any>,
        as_any,
        "an object",
        #[doc = r#"Returns a boxed value if `self` contains a boxed value, and an Error otherwise.

Functions exported to _Schemy_ can return arbitrary boxed values, which can be extracted
with `as_any`, and downcast to desired types.

## Example
```rust
# use schemy::{SchemyContext, Error};
# use std::any::Any;
# use std::rc::Rc;
#
# fn main() -> Result<(), Error> {
let mut ctx = SchemyContext::new();

struct TestStruct {
    value: i64,
}

ctx.add_function("make-any", |inp: i64| -> Rc<dyn Any> {
    Rc::new(TestStruct { value: inp })
});

let out = ctx.eval_string("(make-any 25)")?;
let ts = out.as_any()?.downcast::<TestStruct>().unwrap();

assert_eq!(ts.value, 25);
#
# Ok(())
# }
```
"#]
        SchemyValue::Any(vv) => vv.clone()
    );
    // extractors end

    // predicates begin
    predicate_fn!(pub, null, SchemyValue::Nil, "Returns True if `self` is the empty list.");
    predicate_fn!(pub, consp, SchemyValue::Pair(_), "Returns True if `self` is a pair.");
    predicate_fn!(pub, booleanp, SchemyValue::Bool(_), "Returns True if `self` is `#t` or `#f`.");
    predicate_fn!(pub, integerp, SchemyValue::Int(_), "Returns True if `self` is an integer.");
    predicate_fn!(pub, floatp, SchemyValue::Float(_), "Returns True if `self` is a float.");
    predicate_fn!(
        pub,
        numberp,
        SchemyValue::Int(_) | SchemyValue::Float(_),
        "Returns True if `self` is a number. i.e., an integer or a float."
    );
    predicate_fn!(pub, stringp, SchemyValue::String(_), "Returns True if `self` is a string.");
    predicate_fn!(pub, symbolp, SchemyValue::Symbol(_), "Returns True if `self` is a symbol.");
    predicate_fn!(pub, charp, SchemyValue::Char(_), "Returns True if `self` is a character.");
    predicate_fn!(pub, vectorp, SchemyValue::Vector(_), "Returns True if `self` is a vector.");
    predicate_fn!(pub, procedurep, SchemyValue::Procedure(_), "Returns True if `self` can be called.");
    predicate_fn!(pub(crate), is_undefined, SchemyValue::Undefined);
    // predicates end
}

// pub(crate) methods on SchemyObject
impl SchemyObject {
    pub(crate) fn new(vv: SchemyValue) -> SchemyObject {
        Self {
            rc: Rc::new(RefCell::new(vv)),
        }
    }

    pub(crate) fn undefined() -> SchemyObject {
        SchemyObject::new(SchemyValue::Undefined)
    }

    pub(crate) fn inner_ref(&self) -> Ref<'_, SchemyValue> {
        self.rc.borrow()
    }

    /// Identity of the underlying cell.
    pub(crate) fn addr(&self) -> *const () {
        Rc::as_ptr(&self.rc) as *const ()
    }

    pub(crate) fn symbol_rc(&self) -> Option<Rc<Symbol>> {
        match &*self.inner_ref() {
            SchemyValue::Symbol(sym) => Some(sym.clone()),
            _ => None,
        }
    }

    /// Returns true if `self` is the symbol `sym`.
    pub(crate) fn is_symbol(&self, sym: &Rc<Symbol>) -> bool {
        matches!(&*self.inner_ref(), SchemyValue::Symbol(s) if Rc::ptr_eq(s, sym))
    }

    /// Returns the head symbol of a form like `(quote x)`.
    pub(crate) fn head_symbol(&self) -> Option<Rc<Symbol>> {
        self.as_pair().and_then(|cons| cons.car().symbol_rc())
    }

    pub(crate) fn with_vector<T>(&self, f: impl FnOnce(&Vec<SchemyObject>) -> T) -> Option<T> {
        match &*self.inner_ref() {
            SchemyValue::Vector(items) => Some(f(items)),
            _ => None,
        }
    }

    pub(crate) fn with_string_mut<T>(&self, f: impl FnOnce(&mut String) -> T) -> Option<T> {
        match &mut *self.rc.borrow_mut() {
            SchemyValue::String(text) => Some(f(text)),
            _ => None,
        }
    }

    pub(crate) fn with_vector_mut<T>(
        &self,
        f: impl FnOnce(&mut Vec<SchemyObject>) -> T,
    ) -> Option<T> {
        match &mut *self.rc.borrow_mut() {
            SchemyValue::Vector(items) => Some(f(items)),
            _ => None,
        }
    }
}

macro_rules! schemy_object_from {
    ($ty: ty) => {
        impl From<$ty> for SchemyObject {
            fn from(vv: $ty) -> Self {
                SchemyObject::new(SchemyValue::from(vv))
            }
        }
    };
}

schemy_object_from!(i64);
schemy_object_from!(f64);
schemy_object_from!(bool);
schemy_object_from!(char);
schemy_object_from!(&str);
schemy_object_from!(String);
schemy_object_from!(Procedure);
schemy_object_from!(Rc<dyn Any>);

impl From<SchemyValue> for SchemyObject {
    fn from(vv: SchemyValue) -> Self {
        SchemyObject::new(vv)
    }
}

impl From<Rc<Symbol>> for SchemyObject {
    fn from(sym: Rc<Symbol>) -> Self {
        SchemyObject::new(SchemyValue::Symbol(sym))
    }
}
