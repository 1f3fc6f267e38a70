use crate::{Error, SchemyObject, primitive::FromArg};

/// A mutable pair cell. The cell lives inside a [`SchemyObject`], so
/// `set-car!` and `set-cdr!` on one handle are seen through every other
/// handle to the same pair.
#[derive(Debug, Clone)]
pub struct Cons {
    car: SchemyObject,
    cdr: SchemyObject,
}

impl Cons {
    pub fn new(car: SchemyObject, cdr: SchemyObject) -> Self {
        Cons { car, cdr }
    }

    pub fn car(&self) -> &SchemyObject {
        &self.car
    }

    pub fn cdr(&self) -> &SchemyObject {
        &self.cdr
    }

    pub(crate) fn set_car(&mut self, car: SchemyObject) {
        self.car = car;
    }

    pub(crate) fn set_cdr(&mut self, cdr: SchemyObject) {
        self.cdr = cdr;
    }

    pub(crate) fn take_cdr(&mut self) -> SchemyObject {
        std::mem::take(&mut self.cdr)
    }
}

/// Iterates over the `car`s of a list. Iteration stops at the first
/// non-pair tail, so the tail of an improper list is not yielded.
#[derive(Clone)]
pub struct BaseIter {
    next: SchemyObject,
}

impl BaseIter {
    pub(crate) fn new(list: SchemyObject) -> Self {
        BaseIter { next: list }
    }
}

impl Iterator for BaseIter {
    type Item = SchemyObject;

    fn next(&mut self) -> Option<Self::Item> {
        let cons = self.next.as_pair()?;
        self.next = cons.cdr().clone();
        Some(cons.car().clone())
    }
}

/// Iterates over a list, converting each element to `T`.
pub struct Iter<T: FromArg> {
    iter: BaseIter,
    _d: std::marker::PhantomData<T>,
}

impl<T: FromArg> Iter<T> {
    pub(crate) fn new(iter: BaseIter) -> Self {
        Self {
            iter,
            _d: Default::default(),
        }
    }
}

impl<T: FromArg> Iterator for Iter<T> {
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|vv| {
            T::from_arg(&vv).ok_or_else(|| {
                Error::type_mismatch(format!("{} is not {}", vv, T::KIND))
            })
        })
    }
}

/// Collects the elements of a proper list. Returns `None` when `list` is
/// improper.
pub(crate) fn list_to_vec(list: &SchemyObject) -> Option<Vec<SchemyObject>> {
    let mut items = vec![];
    let mut rest = list.clone();
    loop {
        let next = match rest.as_pair() {
            Some(cons) => {
                items.push(cons.car().clone());
                cons.cdr().clone()
            }
            None if rest.null() => return Some(items),
            None => return None,
        };
        rest = next;
    }
}

/// Builds a list from `items`, terminated by `tail` instead of `()`.
pub(crate) fn list_with_tail(items: Vec<SchemyObject>, tail: SchemyObject) -> SchemyObject {
    items
        .into_iter()
        .rev()
        .fold(tail, |acc, item| SchemyObject::cons(item, acc))
}

impl FromIterator<SchemyObject> for SchemyObject {
    fn from_iter<T: IntoIterator<Item = SchemyObject>>(iter: T) -> Self {
        list_with_tail(iter.into_iter().collect(), SchemyObject::nil())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_to_vec() {
        let list: SchemyObject = (1..=3).map(|x: i64| SchemyObject::from(x)).collect();
        let items = list_to_vec(&list).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].as_int().unwrap(), 3);

        let improper = list_with_tail(vec![1.into(), 2.into()], 3.into());
        assert!(list_to_vec(&improper).is_none());
        assert_eq!(improper.base_iter().count(), 2);
        assert!(list_to_vec(&SchemyObject::nil()).unwrap().is_empty());
    }

    #[test]
    fn test_typed_iter() {
        let list: SchemyObject = vec![SchemyObject::from(1), SchemyObject::from("x")]
            .into_iter()
            .collect();
        let mut iter = list.iter::<i64>();
        assert_eq!(iter.next().unwrap().unwrap(), 1);
        assert_eq!(
            iter.next().unwrap().unwrap_err().desc(),
            r#""x" is not an integer"#
        );
        assert!(iter.next().is_none());
    }
}
