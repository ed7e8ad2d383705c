use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::errors::Error;

/// Undirected weighted station graph.
///
/// Nodes are interned in lexicographic order, so comparing node indices is the same as
/// comparing station names. Every ordering decision downstream relies on this.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    names: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<BTreeMap<usize, u64>>,
}

impl Graph {
    pub fn new<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = nodes
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect::<Vec<_>>();
        let index = names.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();
        let edges = vec![BTreeMap::new(); names.len()];

        Self { names, index, edges }
    }

    /// Insert (or overwrite) the edge `a -- b` in both directions.
    #[cfg(test)]
    pub fn add_edge(&mut self, a: &str, b: &str, weight: u64) -> Result<(), Error> {
        let a = self.require(a)?;
        let b = self.require(b)?;
        self.connect(a, b, weight);
        Ok(())
    }

    /// Index based [`Graph::add_edge`]. Self-edges are dropped.
    pub fn connect(&mut self, a: usize, b: usize, weight: u64) {
        if a != b {
            self.edges[a].insert(b, weight);
            self.edges[b].insert(a, weight);
        }
    }

    pub fn node(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn require(&self, name: &str) -> Result<usize, Error> {
        self.node(name).ok_or_else(|| Error::UnknownNode(name.to_string()))
    }

    pub fn name(&self, node: usize) -> &str {
        &self.names[node]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.edges[node].iter().map(|(&n, &w)| (n, w))
    }

    pub fn weight(&self, a: usize, b: usize) -> Option<u64> {
        if a == b {
            return Some(0);
        }

        self.edges[a].get(&b).copied()
    }

    /// Total weight along consecutive nodes, `None` if two of them are not adjacent or the
    /// total overflows.
    pub fn length(&self, route: &[usize]) -> Option<u64> {
        route
            .windows(2)
            .try_fold(0u64, |total, pair| total.checked_add(self.weight(pair[0], pair[1])?))
    }

    /// Connected component label of every node. Two nodes are mutually reachable iff
    /// their labels are equal.
    pub fn components(&self) -> Vec<usize> {
        let mut label = vec![usize::MAX; self.len()];
        let mut count = 0;
        for root in 0..self.len() {
            if label[root] != usize::MAX {
                continue;
            }

            label[root] = count;
            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                for (next, _) in self.neighbors(node) {
                    if label[next] == usize::MAX {
                        label[next] = count;
                        stack.push(next);
                    }
                }
            }
            count += 1;
        }

        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_are_sorted() {
        let graph = Graph::new(["C", "A", "B", "A"]);
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.name(0), "A");
        assert_eq!(graph.name(2), "C");
        assert_eq!(graph.node("B"), Some(1));
    }

    #[test]
    fn test_edges_are_symmetric() {
        let mut graph = Graph::new(["A", "B"]);
        graph.add_edge("A", "B", 7).unwrap();
        assert_eq!(graph.weight(0, 1), Some(7));
        assert_eq!(graph.weight(1, 0), Some(7));
        assert_eq!(graph.weight(1, 1), Some(0));
    }

    #[test]
    fn test_self_edge_is_ignored() {
        let mut graph = Graph::new(["A"]);
        graph.add_edge("A", "A", 3).unwrap();
        assert_eq!(graph.neighbors(0).count(), 0);
        assert_eq!(graph.weight(0, 0), Some(0));
    }

    #[test]
    fn test_unknown_node() {
        let mut graph = Graph::new(["A"]);
        assert!(matches!(graph.add_edge("A", "Z", 1), Err(Error::UnknownNode(n)) if n == "Z"));
    }

    #[test]
    fn test_route_length() {
        let mut graph = Graph::new(["A", "B", "C"]);
        graph.add_edge("A", "B", 2).unwrap();
        graph.add_edge("B", "C", 3).unwrap();
        assert_eq!(graph.length(&[0, 1, 2, 1]), Some(8));
        assert_eq!(graph.length(&[0]), Some(0));
        assert_eq!(graph.length(&[0, 2]), None);
    }

    #[test]
    fn test_components() {
        let mut graph = Graph::new(["A", "B", "C", "D", "E"]);
        graph.add_edge("A", "B", 1).unwrap();
        graph.add_edge("D", "C", 1).unwrap();

        let label = graph.components();
        assert_eq!(label[0], label[1]);
        assert_eq!(label[2], label[3]);
        assert_ne!(label[0], label[2]);
        assert_ne!(label[4], label[0]);
        assert_ne!(label[4], label[2]);
    }

    #[test]
    fn test_length_overflow() {
        let mut graph = Graph::new(["A", "B", "C"]);
        graph.add_edge("A", "B", u64::MAX).unwrap();
        graph.add_edge("B", "C", 1).unwrap();
        assert_eq!(graph.length(&[0, 1]), Some(u64::MAX));
        assert_eq!(graph.length(&[0, 1, 2]), None);
    }
}
