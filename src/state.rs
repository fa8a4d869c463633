use log::trace;

/// The cache slot of a memoized cell.
///
/// `F` is the (possibly unsized) computation type.
pub(crate) enum State<T, F: ?Sized> {
    Pending(Box<F>),
    Forced(T),
}

impl<T, F: ?Sized> State<T, F> {
    pub fn is_forced(&self) -> bool {
        matches!(self, State::Forced(_))
    }

    /// Runs the computation if it did not succeed yet.
    ///
    /// On success the computation is dropped and the value stays cached for the rest of the
    /// state's lifetime. On `Err` (or a panic) the state stays pending and keeps the computation,
    /// so the next call retries.
    pub fn ensure_forced<E>(&mut self) -> Result<(), E>
    where
        F: FnMut() -> Result<T, E>,
    {
        if let State::Pending(compute) = self {
            trace!("evaluating memoized cell");
            match compute() {
                Ok(value) => *self = State::Forced(value),
                Err(e) => {
                    trace!("memoized cell computation failed, staying pending");
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// The cached value. Must only be called after a successful `ensure_forced`.
    pub fn forced(&self) -> &T {
        match self {
            State::Forced(value) => value,
            State::Pending(_) => unreachable!("memoized cell read before it was forced"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    type TestState<T, E> = State<T, dyn FnMut() -> Result<T, E>>;

    #[test]
    fn computation_is_dropped_after_success() {
        let mut count = 0;
        let mut state: TestState<i32, Infallible> = State::Pending(Box::new(move || {
            count += 1;
            Ok(count)
        }));
        assert!(!state.is_forced());
        assert!(state.ensure_forced().is_ok());
        assert!(state.ensure_forced().is_ok());
        assert!(state.is_forced());
        assert_eq!(*state.forced(), 1);
    }

    #[test]
    fn error_leaves_state_pending() {
        let mut attempts = 0;
        let mut state: TestState<&str, u32> = State::Pending(Box::new(move || {
            attempts += 1;
            if attempts < 3 {
                Err(attempts)
            } else {
                Ok("done")
            }
        }));
        assert_eq!(state.ensure_forced(), Err(1));
        assert!(!state.is_forced());
        assert_eq!(state.ensure_forced(), Err(2));
        assert_eq!(state.ensure_forced(), Ok(()));
        assert_eq!(*state.forced(), "done");
    }
}
