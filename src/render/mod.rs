pub mod dot;

use serde::Serialize;

use crate::config::{RenderConfig, SizeScale};
use crate::graph::Graph;

/// Per-node drawing attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualNode {
    pub id: String,
    pub label: String,
    pub title: String,
    pub size: f64,
    pub highlighted: bool,
}

/// Per-edge drawing attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualEdge {
    pub from: String,
    pub to: String,
    pub width: f64,
    pub title: String,
}

/// A graph translated into what a renderer needs to draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

impl VisualGraph {
    pub fn from_graph(graph: &Graph, focus: Option<&str>, config: &RenderConfig) -> Self {
        let focus = focus.map(str::trim).filter(|f| !f.is_empty());
        let scaled = |v: f64| match config.scale {
            SizeScale::Linear => v,
            SizeScale::Log => v.ln_1p(),
        };

        let max_volume = graph
            .nodes()
            .iter()
            .map(|n| scaled(n.stats.volume()))
            .fold(0.0_f64, f64::max);
        let max_volume = if max_volume > 0.0 { max_volume } else { 1.0 };

        let nodes = graph
            .nodes()
            .iter()
            .map(|n| VisualNode {
                id: n.address.clone(),
                label: short_label(&n.address, config.label_len),
                title: format!("In: {:.6} | Out: {:.6}", n.stats.total_in, n.stats.total_out),
                size: config.min_node_size
                    + config.node_size_range * (scaled(n.stats.volume()) / max_volume),
                highlighted: focus.is_some_and(|f| n.address.eq_ignore_ascii_case(f)),
            })
            .collect();

        let edges = graph
            .edges()
            .iter()
            .map(|e| VisualEdge {
                from: e.from.clone(),
                to: e.to.clone(),
                width: edge_width(e.stats.total_value, config.edge_width_factor),
                title: format!("{:.4} ETH", e.stats.total_value),
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_dot(&self) -> String {
        dot::write_dot(self)
    }
}

/// `1 + ln(1 + (value + 1)) * factor`
pub fn edge_width(total_value: f64, factor: f64) -> f64 {
    1.0 + (total_value + 1.0).ln_1p() * factor
}

/// Address prefix plus "..." when the address is noticeably longer than `len`.
pub fn short_label(address: &str, len: usize) -> String {
    if address.chars().count() > len + 4 {
        let prefix: String = address.chars().take(len).collect();
        format!("{prefix}...")
    } else {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TxRecord;
    use crate::graph::{AggregateOptions, aggregate};

    fn graph() -> Graph {
        let records = vec![
            TxRecord::new("0x1234567890abcdef", "0xBBB", "1000000000000000000"),
            TxRecord::new("0xBBB", "0xCCC", "1000000000000000000"),
        ];
        aggregate(Some(&records), &AggregateOptions::default()).unwrap()
    }

    #[test]
    fn linear_sizes_scale_with_volume() {
        let v = VisualGraph::from_graph(&graph(), None, &RenderConfig::default());
        // 0xBBB moves 2.0, the others 1.0
        assert_eq!(v.nodes[1].size, 60.0);
        assert_eq!(v.nodes[0].size, 35.0);
        assert_eq!(v.nodes[2].size, 35.0);
    }

    #[test]
    fn log_scale_keeps_largest_at_max() {
        let config = RenderConfig {
            scale: SizeScale::Log,
            ..RenderConfig::default()
        };
        let v = VisualGraph::from_graph(&graph(), None, &config);
        assert!((v.nodes[1].size - 60.0).abs() < 1e-9);
        assert!(v.nodes[0].size > 35.0 && v.nodes[0].size < 60.0);
    }

    #[test]
    fn empty_volume_does_not_divide_by_zero() {
        let records = vec![TxRecord::new("a", "b", "junk")];
        let g = aggregate(Some(&records), &AggregateOptions::default()).unwrap();
        let v = VisualGraph::from_graph(&g, None, &RenderConfig::default());
        assert_eq!(v.nodes[0].size, 10.0);
    }

    #[test]
    fn highlight_ignores_case() {
        let v = VisualGraph::from_graph(&graph(), Some("0xbbb"), &RenderConfig::default());
        let lit: Vec<&str> = v.nodes.iter().filter(|n| n.highlighted).map(|n| n.id.as_str()).collect();
        assert_eq!(lit, ["0xBBB"]);
    }

    #[test]
    fn edge_width_formula() {
        assert!((edge_width(0.0, 2.0) - (1.0 + 2.0_f64.ln() * 2.0)).abs() < 1e-12);
        assert!(edge_width(10.0, 2.0) > edge_width(1.0, 2.0));
    }

    #[test]
    fn labels_and_titles() {
        let v = VisualGraph::from_graph(&graph(), None, &RenderConfig::default());
        assert_eq!(v.nodes[0].label, "0x12345678...");
        assert_eq!(v.nodes[1].label, "0xBBB");
        assert_eq!(v.nodes[1].title, "In: 1.000000 | Out: 1.000000");
        assert_eq!(v.edges[0].title, "1.0000 ETH");
    }

    #[test]
    fn short_label_boundary() {
        assert_eq!(short_label("12345678901234", 10), "12345678901234");
        assert_eq!(short_label("123456789012345", 10), "1234567890...");
    }

    #[test]
    fn json_has_nodes_and_edges() {
        let v = VisualGraph::from_graph(&graph(), None, &RenderConfig::default());
        let json: serde_json::Value = serde_json::from_str(&v.to_json().unwrap()).unwrap();
        assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(json["edges"][0]["from"], "0x1234567890abcdef");
    }
}
