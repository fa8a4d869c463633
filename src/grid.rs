//! A fixed-size two-dimensional grid of lazily computed cells.

use crate::{error::ShapeError, forceable::Forceable, Memo};
use log::debug;
use std::{convert::Infallible, rc::Rc};

/// A `width` x `height` grid of cells addressed by `(column, row)`.
///
/// Every cell is allocated up front, but no value is computed until its cell is forced. The shape
/// never changes after construction.
#[derive(Clone, Debug)]
pub struct Grid<C> {
    width: usize,
    height: usize,
    // Row-major: the cell for `(i, j)` lives at `i + j * width`.
    cells: Vec<C>,
}

impl<C> Grid<C> {
    /// Assembles a grid from cells in row-major order.
    pub fn from_cells(width: usize, height: usize, cells: Vec<C>) -> Result<Self, ShapeError> {
        if cells.len() != cell_count(width, height) {
            return Err(ShapeError {
                width,
                height,
                actual: cells.len(),
            });
        }
        Ok(Grid {
            width,
            height,
            cells,
        })
    }

    fn from_fn(width: usize, height: usize, mut cell: impl FnMut(usize, usize) -> C) -> Self {
        let mut cells = Vec::with_capacity(cell_count(width, height));
        for j in 0..height {
            for i in 0..width {
                cells.push(cell(i, j));
            }
        }
        debug!("built {width}x{height} grid");
        Grid {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells, `width * height`.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the cell at column `i` and row `j`.
    ///
    /// Out-of-range coordinates, including negative ones, return `None`.
    pub fn get<I, J>(&self, i: I, j: J) -> Option<&C>
    where
        I: TryInto<usize>,
        J: TryInto<usize>,
    {
        let i = i.try_into().ok()?;
        let j = j.try_into().ok()?;
        self.offset(i, j).map(|offset| &self.cells[offset])
    }

    /// Number of cells that have been evaluated so far.
    pub fn forced_count(&self) -> usize
    where
        C: Forceable,
    {
        self.cells.iter().filter(|cell| cell.is_forced()).count()
    }

    fn offset(&self, i: usize, j: usize) -> Option<usize> {
        (i < self.width && j < self.height).then(|| i + j * self.width)
    }

    /// Builds a grid of the same shape with `f` applied to every cell.
    fn map_cells<D>(&self, f: impl FnMut(&C) -> D) -> Grid<D> {
        debug!("mapping {}x{} grid", self.width, self.height);
        Grid {
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(f).collect(),
        }
    }
}

fn cell_count(width: usize, height: usize) -> usize {
    width
        .checked_mul(height)
        .unwrap_or_else(|| panic!("{width}x{height} grid is too large"))
}

impl<T> Grid<Memo<T>> {
    /// Creates a grid whose cell `(i, j)` lazily evaluates to `compute(i, j)`.
    ///
    /// `compute` is not called here. Each coordinate calls it at most once, on the first force of
    /// its cell.
    pub fn new(
        width: usize,
        height: usize,
        compute: impl Fn(usize, usize) -> T + 'static,
    ) -> Self {
        Grid::fallible(width, height, move |i, j| Ok::<_, Infallible>(compute(i, j)))
    }
}

impl<T, E> Grid<Memo<T, E>> {
    /// Like [`Grid::new`], but `compute` may fail. Failed cells retry on their next force.
    pub fn fallible(
        width: usize,
        height: usize,
        compute: impl Fn(usize, usize) -> Result<T, E> + 'static,
    ) -> Self {
        let compute = Rc::new(compute);
        Grid::from_fn(width, height, |i, j| {
            let compute = compute.clone();
            Memo::fallible(move || compute(i, j))
        })
    }

    /// Lazily applies `f` to every cell. Nothing is evaluated until a cell of the new grid is
    /// forced, and then only the corresponding source cell.
    pub fn map_ref<R>(&self, f: impl Fn(&T) -> R + 'static) -> Grid<Memo<R, E>> {
        let f = Rc::new(f);
        self.map_cells(|cell| {
            let f = f.clone();
            cell.map_ref(move |value| f(value))
        })
    }

    pub fn map<R>(&self, f: impl Fn(T) -> R + 'static) -> Grid<Memo<R, E>>
    where
        T: Clone,
    {
        self.map_ref(move |value| f(value.clone()))
    }

    pub fn try_map<R>(&self, f: impl Fn(&T) -> Result<R, E> + 'static) -> Grid<Memo<R, E>> {
        let f = Rc::new(f);
        self.map_cells(|cell| {
            let f = f.clone();
            cell.try_map(move |value| f(value))
        })
    }
}

#[cfg(feature = "sync")]
mod shared {
    use super::Grid;
    use crate::sync::Memo;
    use std::{convert::Infallible, sync::Arc};

    impl<T: Send + Sync> Grid<Memo<T>> {
        /// Thread-safe counterpart of [`Grid::new`].
        pub fn new_sync(
            width: usize,
            height: usize,
            compute: impl Fn(usize, usize) -> T + Send + Sync + 'static,
        ) -> Self {
            Grid::fallible_sync(width, height, move |i, j| {
                Ok::<_, Infallible>(compute(i, j))
            })
        }
    }

    impl<T: Send + Sync, E> Grid<Memo<T, E>> {
        /// Thread-safe counterpart of [`Grid::fallible`].
        pub fn fallible_sync(
            width: usize,
            height: usize,
            compute: impl Fn(usize, usize) -> Result<T, E> + Send + Sync + 'static,
        ) -> Self {
            let compute = Arc::new(compute);
            Grid::from_fn(width, height, |i, j| {
                let compute = compute.clone();
                Memo::fallible(move || compute(i, j))
            })
        }

        pub fn map_ref<R: Send + Sync>(
            &self,
            f: impl Fn(&T) -> R + Send + Sync + 'static,
        ) -> Grid<Memo<R, E>> {
            let f = Arc::new(f);
            self.map_cells(|cell| {
                let f = f.clone();
                cell.map_ref(move |value| f(value))
            })
        }

        pub fn map<R: Send + Sync>(&self, f: impl Fn(T) -> R + Send + Sync + 'static) -> Grid<Memo<R, E>>
        where
            T: Clone,
        {
            self.map_ref(move |value| f(value.clone()))
        }

        pub fn try_map<R: Send + Sync>(
            &self,
            f: impl Fn(&T) -> Result<R, E> + Send + Sync + 'static,
        ) -> Grid<Memo<R, E>> {
            let f = Arc::new(f);
            self.map_cells(|cell| {
                let f = f.clone();
                cell.try_map(move |value| f(value))
            })
        }
    }
}
