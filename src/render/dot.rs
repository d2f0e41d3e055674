use std::fmt::Write;

use super::VisualGraph;

/// Graphviz rendering. Node sizes map to `width` in inches (size / 72).
pub fn write_dot(graph: &VisualGraph) -> String {
    let mut out = String::from("digraph txflow {\n");
    out.push_str("  node [shape=circle, fixedsize=true, fontsize=8];\n");

    for n in &graph.nodes {
        let _ = write!(
            out,
            "  \"{}\" [label=\"{}\", tooltip=\"{}\", width={:.3}",
            escape(&n.id),
            escape(&n.label),
            escape(&n.title),
            n.size / 72.0
        );
        if n.highlighted {
            out.push_str(", style=filled, fillcolor=\"#ffcc00\"");
        }
        out.push_str("];\n");
    }

    for e in &graph.edges {
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [penwidth={:.3}, tooltip=\"{}\"];",
            escape(&e.from),
            escape(&e.to),
            e.width,
            escape(&e.title)
        );
    }

    out.push_str("}\n");
    out
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
