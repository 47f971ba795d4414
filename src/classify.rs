//! Sender classification and rate balancing.
//!
//! Senders are split into a heavy minority and a light majority, then the two
//! per-class mean send intervals are solved so that the heavy group generates
//! the requested share of total traffic *volume* (not sender count). With `H`
//! heavy senders at rate `r_h` and `L` light senders at rate `r_l`, we solve
//!
//! ```text
//! H * r_h / (H * r_h + L * r_l) = share
//! ```
//!
//! which gives `r_h = (share / (1 - share)) * (L / H) * r_l`.

use itertools::Itertools;

use error::Error;
use node::NodeId;
use random::RandomStream;

/// Floor on any per-sender rate, guarding pathological inputs.
pub const MIN_RATE: f64 = 1e-6;

/// The workload class a sender keeps for the whole trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SenderClass {
    Heavy,
    Light,
}

/// Result of classification: who is heavy, who is light, and the solved
/// per-class mean inter-send intervals.
#[derive(Clone, Debug, PartialEq)]
pub struct TrafficSplit {
    pub heavy: Vec<NodeId>,
    pub light: Vec<NodeId>,
    pub mean_heavy_interval_s: f64,
    pub mean_light_interval_s: f64,
}

impl TrafficSplit {
    pub fn mean_interval(&self, class: SenderClass) -> f64 {
        match class {
            SenderClass::Heavy => self.mean_heavy_interval_s,
            SenderClass::Light => self.mean_light_interval_s,
        }
    }

    pub fn total_senders(&self) -> usize {
        self.heavy.len() + self.light.len()
    }
}

/// Split `sender_ids` into heavy/light groups and solve the class rates.
///
/// The shuffle uses a stream forked off `rng`, so class assignment is
/// decorrelated from node id order yet reproducible under the master seed.
pub fn classify_senders(
    sender_ids: &[NodeId],
    heavy_fraction: f64,
    heavy_traffic_share: f64,
    mean_light_interval_s: f64,
    rng: &mut RandomStream,
) -> Result<TrafficSplit, Error> {
    if sender_ids.is_empty() {
        return Err(Error::InvalidTopology("sender set is empty".to_string()));
    }
    if heavy_traffic_share >= 1.0 {
        return Err(Error::InvalidParameter(
            format!("heavyTrafficShare must be < 1, got {}", heavy_traffic_share),
        ));
    }
    if mean_light_interval_s <= 0.0 {
        return Err(Error::InvalidParameter(
            format!("meanLightIntervalSeconds must be > 0, got {}", mean_light_interval_s),
        ));
    }

    let mut shuffled = sender_ids.to_vec();
    let mut shuffle_rng = rng.fork();
    shuffle_rng.shuffle(&mut shuffled);

    let total = shuffled.len();
    let heavy_count = ::std::cmp::max(1, (heavy_fraction * total as f64).floor() as usize);
    let heavy_count = ::std::cmp::min(heavy_count, total);
    let light_count = total - heavy_count;

    let r_l = 1.0 / mean_light_interval_s;
    let r_h = if light_count == 0 {
        // All-heavy degenerate case: no share left to balance against.
        // Historical behaviour, kept as-is for result comparability.
        r_l
    } else {
        let ratio = (heavy_traffic_share / (1.0 - heavy_traffic_share)) *
            (light_count as f64 / heavy_count as f64);
        (ratio * r_l).max(MIN_RATE)
    };
    let mean_heavy_interval_s = 1.0 / r_h;

    let light = shuffled.split_off(heavy_count);
    let heavy = shuffled;

    info!(
        "classified {} senders: {} heavy (mean interval {:.4}s) [{}], {} light (mean interval {:.4}s)",
        total,
        heavy.len(),
        mean_heavy_interval_s,
        heavy.iter().format(", "),
        light.len(),
        mean_light_interval_s
    );

    Ok(TrafficSplit {
        heavy: heavy,
        light: light,
        mean_heavy_interval_s: mean_heavy_interval_s,
        mean_light_interval_s: mean_light_interval_s,
    })
}
