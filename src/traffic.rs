//! Per-sender send schedules.
//!
//! Each sender gets one immutable `SendSchedule`: an interval drawn from its
//! class's exponential distribution, a uniform start jitter so senders come up
//! staggered, and a capped packet count. The sink's receive endpoint is
//! installed separately with a fixed early start so it is listening before the
//! first send.

use classify::{SenderClass, TrafficSplit};
use error::Error;
use node::NodeId;
use random::RandomStream;

/// UDP port the sink listens on.
pub const SINK_PORT: u16 = 9;

/// Floor on drawn send intervals, preventing degenerate zero-interval bursts.
pub const MIN_SEND_INTERVAL_S: f64 = 0.01;

/// Base start time for senders; the first two simulated seconds are warm-up.
pub const WARMUP_OFFSET_S: f64 = 2.0;

/// Start time for the sink's receive endpoint, before any sender can start.
pub const SINK_START_S: f64 = 1.0;

/// One sender's traffic plan. Built once, immutable thereafter, and consumed
/// by the transport layer which owns its execution.
#[derive(Clone, Debug, PartialEq)]
pub struct SendSchedule {
    pub sender: NodeId,
    pub sink: NodeId,
    pub class: SenderClass,
    /// Drawn inter-send interval in seconds (exponential, floored).
    pub interval_s: f64,
    /// Drawn start jitter in `[0, 0.5 * class mean)`.
    pub jitter_s: f64,
    pub start_s: f64,
    pub stop_s: f64,
    pub max_packets: u32,
    pub packet_size: u32,
}

/// Build one schedule per sender, heavy class first, in shuffled order.
pub fn build_schedules(
    split: &TrafficSplit,
    sink: NodeId,
    base_start_s: f64,
    stop_s: f64,
    max_packets: u32,
    packet_size: u32,
    rng: &mut RandomStream,
) -> Result<Vec<SendSchedule>, Error> {
    if split.heavy.contains(&sink) || split.light.contains(&sink) {
        return Err(Error::InvalidTopology(
            format!("sink node {} must not appear in the sender set", sink),
        ));
    }

    let mut schedules = Vec::with_capacity(split.total_senders());
    let groups = [
        (SenderClass::Heavy, &split.heavy),
        (SenderClass::Light, &split.light),
    ];
    for &(class, ids) in groups.iter() {
        let mean = split.mean_interval(class);
        for &sender in ids.iter() {
            let interval = rng.exponential(mean)?.max(MIN_SEND_INTERVAL_S);
            let jitter = rng.uniform(0.0, 0.5 * mean);
            schedules.push(SendSchedule {
                sender: sender,
                sink: sink,
                class: class,
                interval_s: interval,
                jitter_s: jitter,
                start_s: base_start_s + jitter,
                stop_s: stop_s,
                max_packets: max_packets,
                packet_size: packet_size,
            });
            debug!(
                "Node({}): {:?} sender, interval {:.4}s, start {:.4}s",
                sender,
                class,
                interval,
                base_start_s + jitter
            );
        }
    }
    Ok(schedules)
}
