//! Reduction of per-flow counters into experiment-level metrics.
//!
//! The flow monitor (external) hands back one `FlowRecord` per
//! (source, destination) stream; this module folds them into throughput,
//! delay, delivery-ratio and loss-ratio figures over the *actual*
//! transmission window (first tx to last rx), not the nominal trial length.
//! Every degenerate input is defined, never an error.

use node::NodeId;
use traffic::WARMUP_OFFSET_S;

/// Aggregate counters for one source→destination packet stream.
///
/// Collected by the external flow monitor; the core only reads them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowRecord {
    pub source: NodeId,
    pub destination: NodeId,
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub lost_packets: u64,
    pub rx_bytes: u64,
    /// Sum of per-packet one-way delays, in seconds.
    pub delay_sum_s: f64,
    /// Timestamp of the first transmitted packet (meaningful iff `tx_packets > 0`).
    pub first_tx_s: f64,
    /// Timestamp of the last received packet (meaningful iff `rx_packets > 0`).
    pub last_rx_s: f64,
}

/// The folded metrics for one trial.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowSummary {
    pub throughput_kbps: f64,
    pub avg_delay_ms: f64,
    pub delivery_ratio_pct: f64,
    pub loss_ratio_pct: f64,
    pub total_tx_packets: u64,
    pub total_rx_packets: u64,
    pub total_lost_packets: u64,
    pub total_rx_bytes: u64,
    /// The transmission window the throughput figure is computed over.
    pub duration_s: f64,
}

/// Fold a trial's flow records.
///
/// The window runs from the earliest first-tx to the latest last-rx. If that
/// window is empty or inverted (no packets flowed, or a clock anomaly), it
/// falls back to `sim_time - 2.0` — the scheduler's warm-up offset — purely so
/// the throughput division stays defined.
pub fn reduce_flows(records: &[FlowRecord], sim_time_s: f64) -> FlowSummary {
    let mut total_tx = 0u64;
    let mut total_rx = 0u64;
    let mut total_lost = 0u64;
    let mut total_rx_bytes = 0u64;
    let mut total_delay_s = 0.0;
    let mut first_tx = sim_time_s;
    let mut last_rx = 0.0f64;

    for record in records {
        total_tx += record.tx_packets;
        total_rx += record.rx_packets;
        total_lost += record.lost_packets;
        total_rx_bytes += record.rx_bytes;
        total_delay_s += record.delay_sum_s;

        if record.tx_packets > 0 {
            first_tx = first_tx.min(record.first_tx_s);
        }
        if record.rx_packets > 0 {
            last_rx = last_rx.max(record.last_rx_s);
        }
    }

    let mut duration_s = last_rx - first_tx;
    if duration_s <= 0.0 {
        duration_s = sim_time_s - WARMUP_OFFSET_S;
    }

    let throughput_kbps = (total_rx_bytes as f64 * 8.0) / (duration_s * 1000.0);
    let avg_delay_ms = if total_rx > 0 {
        total_delay_s / total_rx as f64 * 1000.0
    } else {
        0.0
    };
    let delivery_ratio_pct = if total_tx > 0 {
        total_rx as f64 / total_tx as f64 * 100.0
    } else {
        0.0
    };
    let loss_ratio_pct = if total_tx > 0 {
        total_lost as f64 / total_tx as f64 * 100.0
    } else {
        0.0
    };

    FlowSummary {
        throughput_kbps: throughput_kbps,
        avg_delay_ms: avg_delay_ms,
        delivery_ratio_pct: delivery_ratio_pct,
        loss_ratio_pct: loss_ratio_pct,
        total_tx_packets: total_tx,
        total_rx_packets: total_rx,
        total_lost_packets: total_lost,
        total_rx_bytes: total_rx_bytes,
        duration_s: duration_s,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn no_traffic_yields_all_zero_metrics_and_fallback_window() {
        let summary = reduce_flows(&[], 300.0);
        assert_eq!(summary.throughput_kbps, 0.0);
        assert_eq!(summary.avg_delay_ms, 0.0);
        assert_eq!(summary.delivery_ratio_pct, 0.0);
        assert_eq!(summary.loss_ratio_pct, 0.0);
        assert_eq!(summary.duration_s, 298.0);
    }

    #[test]
    fn all_zero_records_behave_like_no_records() {
        let records = vec![FlowRecord::default(), FlowRecord::default()];
        let summary = reduce_flows(&records, 300.0);
        assert_eq!(summary.total_tx_packets, 0);
        assert_eq!(summary.throughput_kbps, 0.0);
        assert_eq!(summary.duration_s, 298.0);
    }

    #[test]
    fn five_flow_concrete_scenario() {
        // Totals: tx=1000, rx=950, lost=50, bytes=950*512, delay=19s,
        // window [2.0, 298.0] => PDR 95%, PLR 5%, 20ms, ~13.15 kb/s.
        let mut records = Vec::new();
        for i in 0..5 {
            records.push(FlowRecord {
                source: i + 1,
                destination: 0,
                tx_packets: 200,
                rx_packets: 190,
                lost_packets: 10,
                rx_bytes: 190 * 512,
                delay_sum_s: 3.8,
                first_tx_s: if i == 0 { 2.0 } else { 3.0 + i as f64 },
                last_rx_s: if i == 4 { 298.0 } else { 290.0 - i as f64 },
            });
        }
        let summary = reduce_flows(&records, 300.0);
        assert_eq!(summary.total_tx_packets, 1000);
        assert_eq!(summary.total_rx_packets, 950);
        assert_eq!(summary.total_lost_packets, 50);
        assert!(close(summary.delivery_ratio_pct, 95.0, 1e-9));
        assert!(close(summary.loss_ratio_pct, 5.0, 1e-9));
        assert!(close(summary.avg_delay_ms, 20.0, 1e-9));
        assert!(close(summary.duration_s, 296.0, 1e-9));
        let expected_throughput = 950.0 * 512.0 * 8.0 / (296.0 * 1000.0);
        assert!(close(summary.throughput_kbps, expected_throughput, 1e-9));
        assert!(close(summary.throughput_kbps, 13.146, 1e-3));
    }

    #[test]
    fn window_ignores_flows_without_traffic() {
        // A record with zero tx has a meaningless first_tx_s; it must not
        // widen the window.
        let records = vec![
            FlowRecord {
                source: 1,
                destination: 0,
                tx_packets: 10,
                rx_packets: 10,
                rx_bytes: 10 * 512,
                delay_sum_s: 0.5,
                first_tx_s: 5.0,
                last_rx_s: 15.0,
                ..FlowRecord::default()
            },
            FlowRecord { source: 2, destination: 0, first_tx_s: 0.0, ..FlowRecord::default() },
        ];
        let summary = reduce_flows(&records, 300.0);
        assert!(close(summary.duration_s, 10.0, 1e-9));
    }

    #[test]
    fn tx_without_rx_still_counts_losses() {
        let records = vec![
            FlowRecord {
                source: 1,
                destination: 0,
                tx_packets: 40,
                lost_packets: 40,
                first_tx_s: 2.5,
                ..FlowRecord::default()
            },
        ];
        let summary = reduce_flows(&records, 300.0);
        assert_eq!(summary.avg_delay_ms, 0.0);
        assert_eq!(summary.delivery_ratio_pct, 0.0);
        assert!(close(summary.loss_ratio_pct, 100.0, 1e-9));
        // No rx => window inverted => fallback.
        assert_eq!(summary.duration_s, 298.0);
    }
}
