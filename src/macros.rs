/**
Provides a lisp-like syntax for constructing lists.

## Example

```rust
use schemy::{list, SchemyObject};

// Create a list with 3 values inside.
let list1 = list!(10.into(), "hello".into(), 5.2.into());
assert_eq!(list1.to_string(), r#"(10 "hello" 5.2)"#);

// A dotted list, ending in `list1` instead of `()`.
let list2 = list!(20.into(), "world".into() ; list1);
assert_eq!(list2.to_string(), r#"(20 "world" 10 "hello" 5.2)"#);

assert!(list!().null());
```
*/
#[macro_export]
macro_rules! list {
    () => { $crate::SchemyObject::nil() };
    ($($items:expr),+ ; $tail:expr) => {{
        let items: ::std::vec::Vec<$crate::SchemyObject> = vec![$($items),+];
        items
            .into_iter()
            .rev()
            .fold($tail, |acc, item| $crate::SchemyObject::cons(item, acc))
    }};
    ($($items:expr),+ $(,)?) => {{
        let items: ::std::vec::Vec<$crate::SchemyObject> = vec![$($items),+];
        items.into_iter().collect::<$crate::SchemyObject>()
    }};
}

/// Destructures the operands of a special form, a slice of
/// `SchemyObject`s, and binds the components to separate names. Returns
/// a syntax error from the enclosing function when the shape doesn't
/// match.
///
/// Has a syntax similar to emacs lisp defun parameters: required names
/// are bound to `&SchemyObject`, `&optional` names to
/// `Option<&SchemyObject>` and the `&rest` name to the remaining slice.
///
/// ```ignore
/// destruct_bind!((test then &optional otherwise) = operands, "if");
/// ```
macro_rules! destruct_bind {
    (@reqr $vv:ident, $form:expr,) => {};
    (@reqr $vv:ident, $form:expr, $var:ident $($vars:ident)*) => {
        let Some(($var, $vv)) = $vv.split_first() else {
            return Err($crate::Error::syntax_error(format!(
                "too few operands to {}",
                $form
            ))
            .into());
        };
        destruct_bind!(@reqr $vv, $form, $($vars)*);
    };
    (@optvar $vv:ident,) => {};
    (@optvar $vv:ident, $var:ident $($vars:ident)*) => {
        let ($var, $vv) = match $vv.split_first() {
            Some((first, rest)) => (Some(first), rest),
            None => (None, $vv),
        };
        destruct_bind!(@optvar $vv, $($vars)*);
    };
    (@no-rest $vv:ident, $form:expr) => {
        if !$vv.is_empty() {
            return Err($crate::Error::syntax_error(format!(
                "too many operands to {}",
                $form
            ))
            .into());
        }
    };
    (($($vars:ident)* &optional $($optvars:ident)+ &rest $rest:ident) = $items:expr, $form:expr) => {
        let vv: &[$crate::SchemyObject] = $items;
        destruct_bind!(@reqr vv, $form, $($vars)*);
        destruct_bind!(@optvar vv, $($optvars)+);
        let $rest = vv;
    };
    (($($vars:ident)* &optional $($optvars:ident)+) = $items:expr, $form:expr) => {
        let vv: &[$crate::SchemyObject] = $items;
        destruct_bind!(@reqr vv, $form, $($vars)*);
        destruct_bind!(@optvar vv, $($optvars)+);
        destruct_bind!(@no-rest vv, $form);
    };
    (($($vars:ident)* &rest $rest:ident) = $items:expr, $form:expr) => {
        let vv: &[$crate::SchemyObject] = $items;
        destruct_bind!(@reqr vv, $form, $($vars)*);
        let $rest = vv;
    };
    (($($vars:ident)*) = $items:expr, $form:expr) => {
        let vv: &[$crate::SchemyObject] = $items;
        destruct_bind!(@reqr vv, $form, $($vars)*);
        destruct_bind!(@no-rest vv, $form);
    };
}

pub(crate) use destruct_bind;
