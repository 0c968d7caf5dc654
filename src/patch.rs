//! Tri-state field marker for partial updates.

/// Distinguishes "leave the field alone" from "set it to absent" in a
/// partial update.
///
/// A plain `Option` cannot express both: `None` would be ambiguous between
/// the two. `Patch` is used by [`PageChanges`](crate::page::PageChanges)
/// for nullable fields and is available to application data types for the
/// same purpose in their own copy-with implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the current value untouched.
    Keep,
    /// Set the field to absent.
    Clear,
    /// Replace the field with this value.
    Set(T),
}

// Manual impl: a derive would require `T: Default`.
impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    /// `Some(v)` becomes `Set(v)`, `None` becomes `Clear`.
    ///
    /// Use when the caller has already decided the field must change.
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Set(v),
            None => Patch::Clear,
        }
    }

    /// Resolve against the current value of the field.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Keep => current,
            Patch::Clear => None,
            Patch::Set(v) => Some(v),
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, Patch::Clear)
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Patch::Set(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Keep => Patch::Keep,
            Patch::Clear => Patch::Clear,
            Patch::Set(v) => Patch::Set(f(v)),
        }
    }
}
