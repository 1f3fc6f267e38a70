use crate::SchemyObject;

/// The trailing arguments of a function registered with
/// [`add_function`](crate::SchemyContext::add_function), each converted to
/// `T`.
pub struct Rest<T> {
    values: Vec<T>,
}

impl<T> Rest<T> {
    pub(crate) fn new(values: Vec<T>) -> Self {
        Rest { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }
}

impl<T> FromIterator<T> for Rest<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Rest {
            values: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Rest<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<T: Into<SchemyObject>> From<Rest<T>> for SchemyObject {
    fn from(val: Rest<T>) -> Self {
        val.values.into_iter().map(Into::into).collect()
    }
}
