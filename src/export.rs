use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::Writer;

use crate::graph::Graph;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Files written by [`export_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPaths {
    pub nodes_csv: PathBuf,
    pub edges_csv: PathBuf,
    pub graph_json: PathBuf,
}

/// Write `nodes.csv`, `edges.csv` and `graph.json` into `dir`, creating it if needed.
pub fn export_all(graph: &Graph, dir: &Path) -> Result<ExportPaths, ExportError> {
    std::fs::create_dir_all(dir)?;
    let paths = ExportPaths {
        nodes_csv: dir.join("nodes.csv"),
        edges_csv: dir.join("edges.csv"),
        graph_json: dir.join("graph.json"),
    };
    write_nodes_csv(graph, File::create(&paths.nodes_csv)?)?;
    write_edges_csv(graph, File::create(&paths.edges_csv)?)?;
    std::fs::write(&paths.graph_json, serde_json::to_string_pretty(graph)?)?;
    Ok(paths)
}

/// Columns: `address,total_in,total_out,tx_in,tx_out`.
pub fn write_nodes_csv<W: Write>(graph: &Graph, out: W) -> Result<(), ExportError> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["address", "total_in", "total_out", "tx_in", "tx_out"])?;
    for n in graph.nodes() {
        writer.write_record([
            n.address.clone(),
            n.stats.total_in.to_string(),
            n.stats.total_out.to_string(),
            n.stats.tx_in.to_string(),
            n.stats.tx_out.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Columns: `from,to,total_value,tx_count`.
pub fn write_edges_csv<W: Write>(graph: &Graph, out: W) -> Result<(), ExportError> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["from", "to", "total_value", "tx_count"])?;
    for e in graph.edges() {
        writer.write_record([
            e.from.clone(),
            e.to.clone(),
            e.stats.total_value.to_string(),
            e.stats.tx_count.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
