use crate::Memo;

/// Common capability of lazily computed cells.
///
/// Lets code that only needs to observe or read a cell stay generic over the single-threaded
/// [`Memo`] and the thread-safe [`crate::sync::Memo`].
pub trait Forceable {
    type Value;
    type Error;

    /// Forces the cell and passes its value to `f`.
    fn try_force_with<R>(&self, f: impl FnOnce(&Self::Value) -> R) -> Result<R, Self::Error>;

    /// Returns true once the cell has been evaluated successfully.
    fn is_forced(&self) -> bool;
}

impl<T, E> Forceable for Memo<T, E> {
    type Value = T;
    type Error = E;

    fn try_force_with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, E> {
        self.try_force().map(|value| f(&value))
    }

    fn is_forced(&self) -> bool {
        Memo::is_forced(self)
    }
}

#[cfg(feature = "sync")]
impl<T: Send + Sync, E> Forceable for crate::sync::Memo<T, E> {
    type Value = T;
    type Error = E;

    fn try_force_with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, E> {
        self.try_force().map(f)
    }

    fn is_forced(&self) -> bool {
        crate::sync::Memo::is_forced(self)
    }
}
