//! Growable container backing repeated fields.

/// Ordered container of decoded values for a repeated field.
///
/// The wire format does not require the elements of a repeated field to be
/// contiguous, e.g. the following is a valid encoding:
///
/// ```text
/// 11: 99
/// 2: "Ada"
/// 11: 91
/// 11: 107
/// ```
///
/// Each occurrence of field 11 is appended in arrival order, so the values
/// above decode to `[99, 91, 107]`.
///
/// Capacity starts at zero and doubles whenever a push finds the container
/// full (1, 2, 4, 8, ...). Existing elements keep their relative order and
/// capacity never shrinks.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Repeated<T> {
    values: Vec<T>,
}

impl<T> Repeated<T> {
    /// Creates an empty container without allocating.
    pub const fn new() -> Self {
        Repeated { values: Vec::new() }
    }

    /// Appends a value, doubling capacity first if the container is full.
    pub fn push(&mut self, value: T) {
        let capacity = self.values.capacity();
        if self.values.len() == capacity {
            self.values.reserve_exact(capacity.max(1));
        }
        self.values.push(value);
    }

    /// Returns the number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of values that fit without growing.
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.values.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<T> {
        self.values
    }
}

impl<T> Default for Repeated<T> {
    fn default() -> Self {
        Repeated::new()
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Repeated<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

impl<T> core::ops::Deref for Repeated<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.values
    }
}

impl<T> From<Vec<T>> for Repeated<T> {
    fn from(values: Vec<T>) -> Self {
        Repeated { values }
    }
}

impl<T> FromIterator<T> for Repeated<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut repeated = Repeated::new();
        repeated.extend(iter);
        repeated
    }
}

impl<T> Extend<T> for Repeated<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T> IntoIterator for Repeated<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Repeated<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
