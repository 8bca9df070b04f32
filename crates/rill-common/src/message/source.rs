use std::ops::{Add, AddAssign};

pub type File = usize;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Span {
    pub file: File,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(file: File, start: usize, end: usize) -> Self {
        Self { file, start, end }
    }
}

impl Add<Span> for Span {
    type Output = Span;

    fn add(self, rhs: Span) -> Self::Output {
        assert_eq!(self.file, rhs.file);
        let start = self.start.min(rhs.start);
        let end = self.end.max(rhs.end);

        Self::new(self.file, start, end)
    }
}

impl AddAssign<Span> for Span {
    fn add_assign(&mut self, rhs: Span) {
        *self = *self + rhs;
    }
}

/// A value together with the place it came from. The span is ignored
/// for equality and hashing, so two `Located` names are the same name
/// no matter where they were written.
#[derive(Clone, Copy, Debug)]
pub struct Located<T> {
    pub span: Span,
    pub value: T,
}

impl<T> Located<T> {
    pub fn new(span: Span, value: T) -> Self {
        Self { span, value }
    }
}

impl<T: PartialEq> PartialEq for Located<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for Located<T> {}

impl<T: std::hash::Hash> std::hash::Hash for Located<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}
