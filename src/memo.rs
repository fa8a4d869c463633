use crate::state::State;
use std::{
    cell::{Ref, RefCell},
    convert::Infallible,
    fmt,
    rc::Rc,
};

type Compute<T, E> = dyn FnMut() -> Result<T, E>;

/// A lazily computed, memoized value.
///
/// The computation runs at most once successfully, on the first force. Cloning a `Memo` is cheap
/// and shares the cache with the original.
///
/// Failures are not cached: if the computation returns `Err` (or panics), the cell stays pending
/// and the next force invokes the computation again.
pub struct Memo<T: 'static, E: 'static = Infallible>(Rc<RefCell<State<T, Compute<T, E>>>>);

/// Custom implementation of Clone to avoid putting a Clone requirement on `T` and `E`.
impl<T, E> Clone for Memo<T, E> {
    fn clone(&self) -> Self {
        Memo(self.0.clone())
    }
}

impl<T> Memo<T> {
    pub fn new(mut compute: impl FnMut() -> T + 'static) -> Self {
        Memo::fallible(move || Ok(compute()))
    }

    /// Forces the value and returns a reference to it.
    ///
    /// Panics if called from inside this cell's own computation.
    pub fn force(&self) -> Ref<'_, T> {
        match self.try_force() {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.force().clone()
    }
}

impl<T, E> Memo<T, E> {
    pub fn fallible(compute: impl FnMut() -> Result<T, E> + 'static) -> Self {
        Memo(Rc::new(RefCell::new(State::Pending(Box::new(compute)))))
    }

    /// A cell that is already evaluated.
    pub fn forced(value: T) -> Self {
        Memo(Rc::new(RefCell::new(State::Forced(value))))
    }

    /// Forces the value. Once forced, any number of references to the value may be held while
    /// the cell (or cells mapped from it) are forced again.
    pub fn try_force(&self) -> Result<Ref<'_, T>, E> {
        if !self.is_forced() {
            // Hold the state exclusively while computing to blow on recursion.
            self.0.borrow_mut().ensure_forced()?;
        }
        Ok(Ref::map(self.0.borrow(), State::forced))
    }

    pub fn try_get(&self) -> Result<T, E>
    where
        T: Clone,
    {
        self.try_force().map(|value| value.clone())
    }

    /// Returns false while the computation is still pending, including while it is running.
    pub fn is_forced(&self) -> bool {
        self.0
            .try_borrow()
            .map_or(false, |state| state.is_forced())
    }

    /// Lazily applies `f` to the value of this cell.
    ///
    /// Neither this cell nor `f` is evaluated until the returned cell is forced.
    pub fn map_ref<R>(&self, mut f: impl FnMut(&T) -> R + 'static) -> Memo<R, E> {
        let source = self.clone();
        Memo::fallible(move || source.try_force().map(|value| f(&value)))
    }

    pub fn map<R>(&self, mut f: impl FnMut(T) -> R + 'static) -> Memo<R, E>
    where
        T: Clone,
    {
        self.map_ref(move |value| f(value.clone()))
    }

    /// Like `map_ref`, but `f` may fail. A failing `f` is retried on the next force, the source
    /// value stays cached.
    pub fn try_map<R>(&self, mut f: impl FnMut(&T) -> Result<R, E> + 'static) -> Memo<R, E> {
        let source = self.clone();
        Memo::fallible(move || source.try_force().and_then(|value| f(&value)))
    }

    #[cfg(test)]
    pub(crate) fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Memo<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(state) => match &*state {
                State::Forced(value) => f.debug_tuple("Memo").field(value).finish(),
                State::Pending(_) => f.write_str("Memo(<pending>)"),
            },
            Err(_) => f.write_str("Memo(<evaluating>)"),
        }
    }
}
