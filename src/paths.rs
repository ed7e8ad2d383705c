use std::cmp;
use std::collections::BinaryHeap;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::graph::Graph;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub distance: u64,
    pub nodes: Vec<usize>,
}

impl Path {
    /// Last node, `None` only for a path built without any node.
    pub fn end(&self) -> Option<usize> {
        self.nodes.last().copied()
    }
}

#[derive(Debug, PartialEq, Eq)]
struct _State {
    distance: u64,
    node: usize,
}

// Min-heap on distance, lower node index first on ties
impl Ord for _State {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.node.cmp(&other.node))
            .reverse()
    }
}

impl PartialOrd for _State {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Single-source shortest path table.
///
/// Unreachable nodes keep a distance of `None` and have no predecessor.
#[derive(Clone, Debug)]
pub struct ShortestPaths {
    start: usize,
    distance: Vec<Option<u64>>,
    previous: Vec<Option<usize>>,
}

impl ShortestPaths {
    pub fn from(graph: &Graph, start: usize) -> Self {
        let mut distance = vec![None; graph.len()];
        let mut previous = vec![None; graph.len()];
        let mut settled = vec![false; graph.len()];

        let mut queue = BinaryHeap::new();
        distance[start] = Some(0);
        queue.push(_State { distance: 0, node: start });

        while let Some(_State { distance: d, node }) = queue.pop() {
            // Stale entries stand in for decrease-key
            if settled[node] {
                continue;
            }
            settled[node] = true;

            for (next, weight) in graph.neighbors(node) {
                let alternative = d.saturating_add(weight);
                if distance[next].is_none_or(|current| alternative < current) {
                    distance[next] = Some(alternative);
                    previous[next] = Some(node);
                    queue.push(_State {
                        distance: alternative,
                        node: next,
                    });
                }
            }
        }

        Self {
            start,
            distance,
            previous,
        }
    }

    pub fn distance(&self, end: usize) -> Option<u64> {
        self.distance[end]
    }

    pub fn path_to(&self, end: usize) -> Option<Path> {
        let distance = self.distance[end]?;

        let mut nodes = vec![end];
        let mut current = end;
        while current != self.start {
            current = self.previous[current]?;
            nodes.push(current);
        }
        nodes.reverse();

        Some(Path { distance, nodes })
    }
}

/// Shortest path from `start` to `end`, `None` when `end` is unreachable.
pub fn shortest(graph: &Graph, start: usize, end: usize) -> Option<Path> {
    ShortestPaths::from(graph, start).path_to(end)
}

/// Depth-first search from `start` to `end` that explores neighbors in a random order.
///
/// The returned path is simple but generally not the shortest one.
pub fn random_walk<R>(graph: &Graph, start: usize, end: usize, rng: &mut R) -> Option<Path>
where
    R: Rng + ?Sized,
{
    let mut visited = vec![false; graph.len()];
    let mut stack = vec![vec![start]];

    while let Some(nodes) = stack.pop() {
        let current = nodes[nodes.len() - 1];
        if current == end {
            let distance = graph.length(&nodes)?;
            return Some(Path { distance, nodes });
        }

        if visited[current] {
            continue;
        }
        visited[current] = true;

        let mut neighbors = graph
            .neighbors(current)
            .map(|(n, _)| n)
            .filter(|&n| !visited[n])
            .collect::<Vec<_>>();
        neighbors.shuffle(rng);

        for next in neighbors {
            let mut extended = nodes.clone();
            extended.push(next);
            stack.push(extended);
        }
    }

    None
}
