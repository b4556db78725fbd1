pub mod astar;
pub mod turns;

pub use astar::{AStar, FnSpace, SearchSpace};
pub use turns::PathFinder;
