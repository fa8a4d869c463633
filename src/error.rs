use thiserror::Error;

/// Returned when a grid is assembled from cells that do not fit its dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a {width}x{height} grid needs {} cells, got {actual}", .width * .height)]
pub struct ShapeError {
    pub width: usize,
    pub height: usize,
    pub actual: usize,
}
