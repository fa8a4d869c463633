//! A thread-safe memoized cell.
//!
//! Same semantics as [`crate::Memo`]. When several threads force the same pending cell, exactly
//! one of them runs the computation and the others block until the value is available. Once
//! forced, the value is read without locking.

use log::trace;
use parking_lot::Mutex;
use std::{
    convert::Infallible,
    fmt,
    sync::{Arc, OnceLock},
};

type Compute<T, E> = dyn FnMut() -> Result<T, E> + Send;

/// A lazily computed, memoized value that can be shared between threads.
///
/// Forcing a cell from inside its own computation deadlocks.
pub struct Memo<T: 'static, E: 'static = Infallible>(Arc<MemoInner<T, E>>);

struct MemoInner<T: 'static, E: 'static> {
    value: OnceLock<T>,
    // Taken (set to `None`) once `value` is set. Held while computing, so only one thread runs it.
    compute: Mutex<Option<Box<Compute<T, E>>>>,
}

impl<T, E> Clone for Memo<T, E> {
    fn clone(&self) -> Self {
        Memo(self.0.clone())
    }
}

impl<T: Send + Sync> Memo<T> {
    pub fn new(mut compute: impl FnMut() -> T + Send + 'static) -> Self {
        Memo::fallible(move || Ok(compute()))
    }

    pub fn force(&self) -> &T {
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

impl<T: Send + Sync, E> Memo<T, E> {
    pub fn fallible(compute: impl FnMut() -> Result<T, E> + Send + 'static) -> Self {
        Memo(Arc::new(MemoInner {
            value: OnceLock::new(),
            compute: Mutex::new(Some(Box::new(compute))),
        }))
    }

    pub fn forced(value: T) -> Self {
        Memo(Arc::new(MemoInner {
            value: OnceLock::from(value),
            compute: Mutex::new(None),
        }))
    }

    pub fn try_force(&self) -> Result<&T, E> {
        if let Some(value) = self.0.value.get() {
            return Ok(value);
        }
        let mut compute = self.0.compute.lock();
        // Another thread may have finished while this one waited for the lock.
        if let Some(value) = self.0.value.get() {
            return Ok(value);
        }
        let Some(f) = compute.as_mut() else {
            unreachable!("pending memoized cell without a computation");
        };
        trace!("evaluating shared memoized cell");
        let value = f().map_err(|e| {
            trace!("shared memoized cell computation failed, staying pending");
            e
        })?;
        *compute = None;
        Ok(self.0.value.get_or_init(|| value))
    }

    pub fn try_get(&self) -> Result<T, E>
    where
        T: Clone,
    {
        self.try_force().cloned()
    }

    /// Never blocks: a cell whose computation is running on another thread is not forced yet.
    pub fn is_forced(&self) -> bool {
        self.0.value.get().is_some()
    }

    pub fn map_ref<R: Send + Sync>(
        &self,
        mut f: impl FnMut(&T) -> R + Send + 'static,
    ) -> Memo<R, E> {
        let source = self.clone();
        Memo::fallible(move || source.try_force().map(&mut f))
    }

    pub fn map<R: Send + Sync>(&self, mut f: impl FnMut(T) -> R + Send + 'static) -> Memo<R, E>
    where
        T: Clone,
    {
        self.map_ref(move |value| f(value.clone()))
    }

    pub fn try_map<R: Send + Sync>(
        &self,
        mut f: impl FnMut(&T) -> Result<R, E> + Send + 'static,
    ) -> Memo<R, E> {
        let source = self.clone();
        Memo::fallible(move || source.try_force().and_then(&mut f))
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Memo<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.value.get() {
            Some(value) => f.debug_tuple("Memo").field(value).finish(),
            None => f.write_str("Memo(<pending>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            mpsc, Barrier,
        },
        thread,
        time::Duration,
    };

    #[test]
    fn forced_value_can_be_borrowed_repeatedly() {
        let memo = Memo::new(|| vec![1, 2, 3]);
        let mapped = memo.map_ref(|v| v.len());
        let first = memo.force();
        let second = memo.force();
        assert_eq!(first, second);
        assert_eq!(mapped.get(), 3);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn is_forced_does_not_wait_for_running_computation() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let memo = Memo::new(move || {
            started_tx.send(()).unwrap();
            release_rx.recv().unwrap();
            5
        });
        let handle = {
            let memo = memo.clone();
            thread::spawn(move || memo.get())
        };
        started_rx.recv().unwrap();
        assert!(!memo.is_forced());
        assert_eq!(format!("{memo:?}"), "Memo(<pending>)");
        release_tx.send(()).unwrap();
        assert_eq!(handle.join().unwrap(), 5);
        assert!(memo.is_forced());
        assert_eq!(format!("{memo:?}"), "Memo(5)");
    }

    #[test]
    fn concurrent_force_runs_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let memo = {
            let count = count.clone();
            Memo::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(20));
                String::from("shared")
            })
        };

        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let memo = memo.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    memo.get()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "shared");
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn map_across_threads() {
        let count = Arc::new(AtomicUsize::new(0));
        let memo = {
            let count = count.clone();
            Memo::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
                21
            })
        };
        let doubled = memo.map(|v| v * 2);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        let handle = thread::spawn(move || doubled.get());
        assert_eq!(handle.join().unwrap(), 42);
        assert_eq!(memo.get(), 21);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn errors_are_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let memo = {
            let attempts = attempts.clone();
            Memo::fallible(move || {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("transient")
                } else {
                    Ok(1u8)
                }
            })
        };
        assert_eq!(memo.try_get(), Err("transient"));
        assert!(!memo.is_forced());
        assert_eq!(memo.try_get(), Ok(1));
        assert_eq!(memo.try_get(), Ok(1));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn panicking_computation_does_not_poison() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let memo = {
            let attempts = attempts.clone();
            Memo::new(move || {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("first attempt fails");
                }
                3
            })
        };
        let first = {
            let memo = memo.clone();
            thread::spawn(move || memo.get()).join()
        };
        assert!(first.is_err());
        assert_eq!(memo.get(), 3);
    }
}
