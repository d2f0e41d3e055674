use crate::core::TxRecord;
use crate::core::units::convert;

use super::{Graph, GraphError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateOptions {
    /// Records converting below this amount (major units) are dropped.
    pub minimum_amount: f64,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self { minimum_amount: 0.0 }
    }
}

/// What happened to the input during one aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateReport {
    pub records_seen: usize,
    pub records_folded: usize,
    /// Missing or empty `from`/`to`.
    pub skipped_malformed: usize,
    pub skipped_below_minimum: usize,
}

impl AggregateReport {
    fn absorb(&mut self, other: &AggregateReport) {
        self.records_seen += other.records_seen;
        self.records_folded += other.records_folded;
        self.skipped_malformed += other.skipped_malformed;
        self.skipped_below_minimum += other.skipped_below_minimum;
    }
}

/// Fold a transaction list into a value-flow graph.
///
/// `None` stands for "no sequence at all" and is the only failure; malformed
/// records are skipped silently.
pub fn aggregate(records: Option<&[TxRecord]>, opts: &AggregateOptions) -> Result<Graph, GraphError> {
    aggregate_with_report(records, opts).map(|(graph, _)| graph)
}

/// Like [`aggregate`], also returning per-outcome record counts.
pub fn aggregate_with_report(
    records: Option<&[TxRecord]>,
    opts: &AggregateOptions,
) -> Result<(Graph, AggregateReport), GraphError> {
    let records = records.ok_or(GraphError::InvalidInput)?;
    Ok(fold(records, opts))
}

/// Aggregate in `partitions` contiguous chunks on scoped threads, then merge
/// the partial graphs in chunk order.
///
/// Totals equal the sequential fold up to floating-point rounding, since
/// partial sums are grouped per chunk. Counts and node/edge order match
/// exactly because chunks are merged front to back.
pub fn aggregate_partitioned(
    records: Option<&[TxRecord]>,
    opts: &AggregateOptions,
    partitions: usize,
) -> Result<(Graph, AggregateReport), GraphError> {
    let records = records.ok_or(GraphError::InvalidInput)?;
    let partitions = partitions.max(1);
    if partitions == 1 || records.len() < partitions * 2 {
        return Ok(fold(records, opts));
    }

    let chunk_len = records.len().div_ceil(partitions);
    let partials: Vec<(Graph, AggregateReport)> = std::thread::scope(|s| {
        let handles: Vec<_> = records
            .chunks(chunk_len)
            .map(|chunk| s.spawn(move || fold(chunk, opts)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(partial) => partial,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut graph = Graph::new();
    let mut report = AggregateReport::default();
    for (partial, partial_report) in partials {
        graph.merge(partial);
        report.absorb(&partial_report);
    }
    Ok((graph, report))
}

fn fold(records: &[TxRecord], opts: &AggregateOptions) -> (Graph, AggregateReport) {
    let mut graph = Graph::new();
    let mut report = AggregateReport {
        records_seen: records.len(),
        ..Default::default()
    };

    for record in records {
        let Some((from, to)) = record.endpoints() else {
            report.skipped_malformed += 1;
            continue;
        };

        let amount = convert(record.value.as_ref());
        if amount < opts.minimum_amount {
            report.skipped_below_minimum += 1;
            continue;
        }

        graph.record_transfer(from, to, amount);
        report.records_folded += 1;
    }

    (graph, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RawAmount;

    const HALF: &str = "500000000000000000";
    const QUARTER: &str = "250000000000000000";

    fn rec(from: &str, to: &str, value: &str) -> TxRecord {
        TxRecord::new(from, to, value)
    }

    fn run(records: &[TxRecord]) -> Graph {
        aggregate(Some(records), &AggregateOptions::default()).unwrap()
    }

    #[test]
    fn end_to_end_two_hops() {
        let records = vec![
            rec("A", "B", "500000000000000000"),
            rec("B", "C", "300000000000000000"),
        ];
        let g = run(&records);

        assert_eq!(g.node_count(), 3);
        let a = g.node("A").unwrap();
        assert_eq!((a.total_out, a.total_in), (0.5, 0.0));
        let b = g.node("B").unwrap();
        assert_eq!((b.total_out, b.total_in), (0.3, 0.5));
        let c = g.node("C").unwrap();
        assert_eq!((c.total_out, c.total_in), (0.0, 0.3));

        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edge("A", "B").unwrap().total_value, 0.5);
        assert_eq!(g.edge("B", "C").unwrap().total_value, 0.3);
    }

    #[test]
    fn none_is_invalid_input() {
        assert_eq!(
            aggregate(None, &AggregateOptions::default()),
            Err(GraphError::InvalidInput)
        );
    }

    #[test]
    fn empty_input_is_empty_graph() {
        let g = run(&[]);
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn missing_receiver_is_skipped() {
        let records = vec![
            TxRecord {
                from: Some("A".into()),
                to: None,
                value: Some(RawAmount::from(HALF)),
                ..Default::default()
            },
            rec("", "B", HALF),
            rec("C", "D", HALF),
        ];
        let (g, report) = aggregate_with_report(Some(&records), &AggregateOptions::default()).unwrap();
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert!(!g.contains_node("A"));
        assert!(!g.contains_node("B"));
        assert_eq!(report.skipped_malformed, 2);
        assert_eq!(report.records_folded, 1);
    }

    #[test]
    fn bad_value_still_creates_zero_edge() {
        let g = run(&[rec("A", "B", "not-a-number")]);
        assert_eq!(g.edge("A", "B").unwrap().total_value, 0.0);
        assert_eq!(g.edge("A", "B").unwrap().tx_count, 1);
    }

    #[test]
    fn below_minimum_is_dropped_everywhere() {
        let records = vec![rec("A", "B", HALF), rec("C", "D", "2000000000000000000")];
        let opts = AggregateOptions { minimum_amount: 1.0 };
        let (g, report) = aggregate_with_report(Some(&records), &opts).unwrap();

        assert!(!g.contains_node("A"));
        assert!(!g.contains_node("B"));
        assert!(g.edge("A", "B").is_none());
        assert_eq!(g.edge("C", "D").unwrap().total_value, 2.0);
        assert_eq!(report.skipped_below_minimum, 1);
    }

    #[test]
    fn amount_equal_to_minimum_is_kept() {
        let opts = AggregateOptions { minimum_amount: 0.5 };
        let g = aggregate(Some(&[rec("A", "B", HALF)]), &opts).unwrap();
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn parallel_transfers_collapse() {
        let records = vec![
            rec("A", "B", "200000000000000000"),
            rec("A", "B", "300000000000000000"),
        ];
        let g = run(&records);
        assert_eq!(g.edge_count(), 1);
        let ab = g.edge("A", "B").unwrap();
        assert_eq!(ab.total_value, 0.5);
        assert_eq!(ab.tx_count, 2);
    }

    #[test]
    fn reversed_pair_is_a_separate_edge() {
        let g = run(&[rec("A", "B", HALF), rec("B", "A", QUARTER)]);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edge("B", "A").unwrap().total_value, 0.25);
    }

    #[test]
    fn addresses_keep_their_case() {
        let g = run(&[rec("0xAbC", "0xabc", HALF)]);
        assert_eq!(g.node_count(), 2);
        assert!(g.contains_node("0xAbC"));
    }

    #[test]
    fn order_does_not_change_totals() {
        let records = vec![
            rec("A", "B", HALF),
            rec("B", "C", QUARTER),
            rec("A", "B", QUARTER),
            rec("C", "A", HALF),
            rec("B", "C", HALF),
        ];
        let forward = run(&records);

        let mut reversed = records.clone();
        reversed.reverse();
        let mut rotated = records.clone();
        rotated.rotate_left(2);

        for other in [run(&reversed), run(&rotated)] {
            assert_eq!(other.node_count(), forward.node_count());
            assert_eq!(other.edge_count(), forward.edge_count());
            for node in forward.nodes() {
                assert_eq!(other.node(&node.address), Some(&node.stats));
            }
            for edge in forward.edges() {
                assert_eq!(other.edge(&edge.from, &edge.to), Some(&edge.stats));
            }
        }
    }

    #[test]
    fn partitioned_matches_sequential() {
        let mut records = Vec::new();
        for i in 0..40 {
            let from = format!("n{}", i % 7);
            let to = format!("n{}", (i * 3) % 5);
            let value = if i % 2 == 0 { HALF } else { QUARTER };
            records.push(rec(&from, &to, value));
        }
        records.push(rec("x", "", HALF));

        let opts = AggregateOptions::default();
        let (sequential, seq_report) = aggregate_with_report(Some(&records), &opts).unwrap();
        let (partitioned, par_report) = aggregate_partitioned(Some(&records), &opts, 4).unwrap();

        assert_eq!(partitioned, sequential);
        assert_eq!(par_report, seq_report);
    }

    #[test]
    fn partitioned_totals_agree_within_rounding() {
        let values = ["100000000000000000", "200000000000000000", "300000000000000000"];
        let records: Vec<TxRecord> = (0..60)
            .map(|i| rec(&format!("s{}", i % 3), &format!("r{}", i % 4), values[i % 3]))
            .collect();

        let opts = AggregateOptions::default();
        let sequential = aggregate(Some(&records), &opts).unwrap();
        let (partitioned, _) = aggregate_partitioned(Some(&records), &opts, 4).unwrap();

        assert_eq!(partitioned.node_count(), sequential.node_count());
        for edge in sequential.edges() {
            let other = partitioned.edge(&edge.from, &edge.to).unwrap();
            assert_eq!(other.tx_count, edge.stats.tx_count);
            assert!((other.total_value - edge.stats.total_value).abs() < 1e-9);
        }
    }

    #[test]
    fn partitioned_none_is_invalid_input() {
        assert!(aggregate_partitioned(None, &AggregateOptions::default(), 4).is_err());
    }
}
