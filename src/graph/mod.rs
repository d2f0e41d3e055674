pub mod aggregate;
pub mod bound;

use std::collections::{HashMap, HashSet};

use serde::Serialize;

pub use aggregate::{AggregateOptions, AggregateReport, aggregate, aggregate_partitioned, aggregate_with_report};
pub use bound::bound;

/// Accumulated flow through one address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NodeStats {
    pub total_in: f64,
    pub total_out: f64,
    pub tx_in: u64,
    pub tx_out: u64,
}

impl NodeStats {
    pub fn volume(&self) -> f64 {
        self.total_in + self.total_out
    }

    fn absorb(&mut self, other: &NodeStats) {
        self.total_in += other.total_in;
        self.total_out += other.total_out;
        self.tx_in += other.tx_in;
        self.tx_out += other.tx_out;
    }
}

/// Accumulated flow along one ordered address pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EdgeStats {
    pub total_value: f64,
    pub tx_count: u64,
}

impl EdgeStats {
    fn absorb(&mut self, other: &EdgeStats) {
        self.total_value += other.total_value;
        self.tx_count += other.tx_count;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub address: String,
    #[serde(flatten)]
    pub stats: NodeStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(flatten)]
    pub stats: EdgeStats,
}

/// Directed value-flow graph with parallel transfers collapsed per ordered pair.
///
/// Nodes and edges iterate in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    node_index: HashMap<String, usize>,
    /// (from node idx, to node idx) -> edge idx
    #[serde(skip)]
    edge_index: HashMap<(usize, usize), usize>,
}

/// Headline numbers for a graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("invalid input: no transaction sequence supplied")]
    InvalidInput,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn contains_node(&self, address: &str) -> bool {
        self.node_index.contains_key(address)
    }

    pub fn node(&self, address: &str) -> Option<&NodeStats> {
        self.node_index.get(address).map(|&i| &self.nodes[i].stats)
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&EdgeStats> {
        let key = (*self.node_index.get(from)?, *self.node_index.get(to)?);
        self.edge_index.get(&key).map(|&i| &self.edges[i].stats)
    }

    /// Find the stored address matching `query`: exact match first, then the
    /// first node (in insertion order) equal ignoring ASCII case.
    pub fn resolve_address(&self, query: &str) -> Option<&str> {
        if let Some(&i) = self.node_index.get(query) {
            return Some(&self.nodes[i].address);
        }
        self.nodes
            .iter()
            .find(|n| n.address.eq_ignore_ascii_case(query))
            .map(|n| n.address.as_str())
    }

    /// Sources of edges into `address`, in edge creation order.
    pub fn predecessors<'a>(&'a self, address: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.to == address)
            .map(|e| e.from.as_str())
    }

    /// Targets of edges out of `address`, in edge creation order.
    pub fn successors<'a>(&'a self, address: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.from == address)
            .map(|e| e.to.as_str())
    }

    /// Sum of all edge totals ("total value moved").
    pub fn total_value(&self) -> f64 {
        self.edges.iter().map(|e| e.stats.total_value).sum()
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            total_value: self.total_value(),
        }
    }

    /// Fold one transfer into the graph.
    pub(crate) fn record_transfer(&mut self, from: &str, to: &str, amount: f64) {
        let fi = self.ensure_node(from);
        let ti = self.ensure_node(to);

        let sender = &mut self.nodes[fi].stats;
        sender.total_out += amount;
        sender.tx_out += 1;
        let receiver = &mut self.nodes[ti].stats;
        receiver.total_in += amount;
        receiver.tx_in += 1;

        let ei = self.ensure_edge(fi, ti);
        let edge = &mut self.edges[ei].stats;
        edge.total_value += amount;
        edge.tx_count += 1;
    }

    /// Add another graph's statistics into this one. Nodes and edges new to
    /// `self` are appended in `other`'s order.
    pub fn merge(&mut self, other: Graph) {
        for node in &other.nodes {
            let i = self.ensure_node(&node.address);
            self.nodes[i].stats.absorb(&node.stats);
        }
        for edge in &other.edges {
            let fi = self.ensure_node(&edge.from);
            let ti = self.ensure_node(&edge.to);
            let ei = self.ensure_edge(fi, ti);
            self.edges[ei].stats.absorb(&edge.stats);
        }
    }

    /// Subgraph on `keep` with every edge whose endpoints are both kept.
    /// Statistics are copied as-is.
    pub fn induced_subgraph(&self, keep: &HashSet<&str>) -> Graph {
        let mut sub = Graph::new();
        for node in self.nodes.iter().filter(|n| keep.contains(n.address.as_str())) {
            let i = sub.ensure_node(&node.address);
            sub.nodes[i].stats = node.stats;
        }
        for edge in &self.edges {
            if keep.contains(edge.from.as_str()) && keep.contains(edge.to.as_str()) {
                let fi = sub.node_index[edge.from.as_str()];
                let ti = sub.node_index[edge.to.as_str()];
                let ei = sub.ensure_edge(fi, ti);
                sub.edges[ei].stats = edge.stats;
            }
        }
        sub
    }

    fn ensure_node(&mut self, address: &str) -> usize {
        if let Some(&i) = self.node_index.get(address) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(Node {
            address: address.to_string(),
            stats: NodeStats::default(),
        });
        self.node_index.insert(address.to_string(), i);
        i
    }

    fn ensure_edge(&mut self, fi: usize, ti: usize) -> usize {
        if let Some(&i) = self.edge_index.get(&(fi, ti)) {
            return i;
        }
        let i = self.edges.len();
        self.edges.push(Edge {
            from: self.nodes[fi].address.clone(),
            to: self.nodes[ti].address.clone(),
            stats: EdgeStats::default(),
        });
        self.edge_index.insert((fi, ti), i);
        i
    }
}
