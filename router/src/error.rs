use schem_common::db::indices::NodeId;
use schem_common::geom::coord::GridCell;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimension { width: i64, height: i64 },
    #[error("no path from {start} to {goal}")]
    NoPathFound { start: GridCell, goal: GridCell },
    #[error("cell {cell} lies outside the {width}x{height} field")]
    OutOfBounds {
        cell: GridCell,
        width: u32,
        height: u32,
    },
    #[error("route requested before refresh")]
    NotReady,
    #[error("endpoint {0} has no usable position")]
    InvalidEndpoint(NodeId),
    #[error("could not commit wire: {0}")]
    Commit(String),
}
