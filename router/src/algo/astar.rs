//! Informed best-first search over any graph.
//!
//! The graph is described by a [`SearchSpace`]: the neighbours of a node, a
//! cost estimate between two nodes and the cost of one edge. The estimate is
//! not required to be admissible.

use priority_queue::PriorityQueue;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;

pub trait SearchSpace {
    type Node: Copy + Eq + Hash;

    fn neighbors(&self, node: Self::Node) -> impl IntoIterator<Item = Self::Node>;
    fn heuristic(&self, a: Self::Node, b: Self::Node) -> u64;
    fn edge_cost(&self, a: Self::Node, b: Self::Node) -> u64;
}

/// Search space assembled from three closures.
pub struct FnSpace<T, N, H, C> {
    neighbors: N,
    heuristic: H,
    edge_cost: C,
    _node: PhantomData<fn(T) -> T>,
}

impl<T, N, H, C> FnSpace<T, N, H, C> {
    pub fn new(neighbors: N, heuristic: H, edge_cost: C) -> Self {
        Self {
            neighbors,
            heuristic,
            edge_cost,
            _node: PhantomData,
        }
    }
}

impl<T, I, N, H, C> SearchSpace for FnSpace<T, N, H, C>
where
    T: Copy + Eq + Hash,
    I: IntoIterator<Item = T>,
    N: Fn(T) -> I,
    H: Fn(T, T) -> u64,
    C: Fn(T, T) -> u64,
{
    type Node = T;

    fn neighbors(&self, node: T) -> impl IntoIterator<Item = T> {
        (self.neighbors)(node)
    }
    fn heuristic(&self, a: T, b: T) -> u64 {
        (self.heuristic)(a, b)
    }
    fn edge_cost(&self, a: T, b: T) -> u64 {
        (self.edge_cost)(a, b)
    }
}

/// Frontier priority. Lowest estimate first, then the deeper node, then the
/// node discovered first.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct Rank {
    f_score: u64,
    g_score: u64,
    seq: u64,
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Copy, Clone)]
struct Visit<T> {
    g_score: u64,
    parent: Option<T>,
}

/// Reusable search state; buffers are kept between calls.
pub struct AStar<T: Copy + Eq + Hash> {
    open: PriorityQueue<T, Rank>,
    visits: HashMap<T, Visit<T>>,
    expansions: usize,
}

impl<T: Copy + Eq + Hash> AStar<T> {
    pub fn new() -> Self {
        Self {
            open: PriorityQueue::new(),
            visits: HashMap::new(),
            expansions: 0,
        }
    }

    /// Nodes popped from the frontier by the last search.
    pub fn expansions(&self) -> usize {
        self.expansions
    }

    /// Returns the node sequence from `start` to `goal` inclusive, or `None`
    /// once the frontier runs dry.
    pub fn find_path<S>(&mut self, space: &S, start: T, goal: T) -> Option<Vec<T>>
    where
        S: SearchSpace<Node = T> + ?Sized,
    {
        self.open.clear();
        self.visits.clear();
        self.expansions = 0;

        let mut seq = 0;
        self.visits.insert(
            start,
            Visit {
                g_score: 0,
                parent: None,
            },
        );
        self.open.push(
            start,
            Rank {
                f_score: space.heuristic(start, goal),
                g_score: 0,
                seq,
            },
        );

        while let Some((current, rank)) = self.open.pop() {
            if current == goal {
                return Some(self.reconstruct_path(goal));
            }
            self.expansions += 1;

            for next in space.neighbors(current) {
                let tentative_g = rank.g_score.saturating_add(space.edge_cost(current, next));
                if self
                    .visits
                    .get(&next)
                    .is_some_and(|v| tentative_g >= v.g_score)
                {
                    continue;
                }
                self.visits.insert(
                    next,
                    Visit {
                        g_score: tentative_g,
                        parent: Some(current),
                    },
                );
                seq += 1;
                self.open.push(
                    next,
                    Rank {
                        f_score: tentative_g.saturating_add(space.heuristic(next, goal)),
                        g_score: tentative_g,
                        seq,
                    },
                );
            }
        }
        None
    }

    fn reconstruct_path(&self, goal: T) -> Vec<T> {
        let mut path = vec![goal];
        let mut current = goal;
        while let Some(parent) = self.visits.get(&current).and_then(|v| v.parent) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }
}

impl<T: Copy + Eq + Hash> Default for AStar<T> {
    fn default() -> Self {
        Self::new()
    }
}
