//! Energy depletion bookkeeping and survival-time metrics.
//!
//! One `EnergyLedger` instance is owned by the trial (no process-wide state)
//! and registered as the depletion observer for the run. It latches each
//! node's death time once, counts deaths monotonically, and derives the two
//! network-survival-time metrics:
//!
//! * NST-50: time at which at least half the nodes are depleted.
//! * NST-100: time at which every node is depleted.
//!
//! Either metric left unset when the horizon is reached is a defined outcome
//! ("not reached"), not an error.

use std::collections::BTreeMap;

use engine::Engine;
use node::NodeId;

/// Anything that wants depletion notifications implements this; the ledger is
/// the one registered during a trial, but the seam keeps the energy model
/// decoupled from the bookkeeping.
pub trait DepletionObserver {
    fn notify(&mut self, node: NodeId, at_s: f64);
}

/// One node's energy account: an initial snapshot and a latch-once death time.
#[derive(Clone, Debug, PartialEq)]
pub struct EnergyBalance {
    initial_j: f64,
    depleted_at_s: Option<f64>,
}

impl EnergyBalance {
    fn new(initial_j: f64) -> Self {
        EnergyBalance { initial_j: initial_j, depleted_at_s: None }
    }

    pub fn initial_j(&self) -> f64 {
        self.initial_j
    }

    pub fn depleted_at_s(&self) -> Option<f64> {
        self.depleted_at_s
    }
}

/// Per-node energy state for the final report.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeEnergy {
    pub node: NodeId,
    pub initial_j: f64,
    pub remaining_j: f64,
    /// False when the node's source exposed no recognised accessor; its
    /// contribution to the totals is zero.
    pub known: bool,
}

/// Aggregated energy results for one trial.
#[derive(Clone, Debug, PartialEq)]
pub struct EnergySnapshot {
    pub per_node: Vec<NodeEnergy>,
    pub total_initial_j: f64,
    pub total_remaining_j: f64,
    pub total_consumed_j: f64,
    /// NST-50; `None` = not reached within the trial horizon.
    pub survival_time_50: Option<f64>,
    /// NST-100; `None` = not reached within the trial horizon.
    pub survival_time_all: Option<f64>,
}

/// Tracks depletion events and survival times for one trial's node set.
pub struct EnergyLedger {
    balances: BTreeMap<NodeId, EnergyBalance>,
    depleted_count: usize,
    survival_time_50: Option<f64>,
    survival_time_all: Option<f64>,
}

impl EnergyLedger {
    pub fn new() -> Self {
        EnergyLedger {
            balances: BTreeMap::new(),
            depleted_count: 0,
            survival_time_50: None,
            survival_time_all: None,
        }
    }

    /// Register a node with its initial-energy snapshot. Call once per node,
    /// at trial start, before the run begins.
    pub fn register(&mut self, node: NodeId, initial_j: f64) {
        self.balances.insert(node, EnergyBalance::new(initial_j));
    }

    pub fn node_count(&self) -> usize {
        self.balances.len()
    }

    pub fn depleted_count(&self) -> usize {
        self.depleted_count
    }

    pub fn survival_time_50(&self) -> Option<f64> {
        self.survival_time_50
    }

    pub fn survival_time_all(&self) -> Option<f64> {
        self.survival_time_all
    }

    pub fn balance(&self, node: NodeId) -> Option<&EnergyBalance> {
        self.balances.get(&node)
    }

    /// Record that `node` ran out of energy at `at_s`.
    ///
    /// Idempotent per node: duplicate notifications from the energy model are
    /// no-ops, so the depleted count and the survival times are insensitive to
    /// delivery order among simultaneous events.
    pub fn record_depletion(&mut self, node: NodeId, at_s: f64) {
        let total = self.balances.len();
        match self.balances.get_mut(&node) {
            Some(balance) => {
                if balance.depleted_at_s.is_some() {
                    return;
                }
                balance.depleted_at_s = Some(at_s);
            }
            None => {
                warn!("depletion notification for unregistered node {}", node);
                return;
            }
        }

        self.depleted_count += 1;
        debug!("Node({}): energy depleted at {:.3}s ({}/{} dead)",
               node, at_s, self.depleted_count, total);

        // ceil(total / 2) deaths trip NST-50; all of them trip NST-100.
        if self.depleted_count >= (total + 1) / 2 && self.survival_time_50.is_none() {
            self.survival_time_50 = Some(at_s);
        }
        if self.depleted_count == total && self.survival_time_all.is_none() {
            self.survival_time_all = Some(at_s);
        }
    }

    /// Probe every node's energy source and assemble the trial's energy
    /// results. A source with no recognised accessor contributes zero and is
    /// flagged, but the trial still reports everything else.
    pub fn snapshot(&self, engine: &Engine) -> EnergySnapshot {
        let mut per_node = Vec::with_capacity(self.balances.len());
        let mut total_initial = 0.0;
        let mut total_remaining = 0.0;

        for (&node, balance) in &self.balances {
            let remaining = engine.energy_source(node).and_then(|src| src.remaining_energy());
            match remaining {
                Some(remaining_j) => {
                    total_initial += balance.initial_j;
                    total_remaining += remaining_j;
                    per_node.push(NodeEnergy {
                        node: node,
                        initial_j: balance.initial_j,
                        remaining_j: remaining_j,
                        known: true,
                    });
                }
                None => {
                    warn!("unknown energy source type on node {}; counting zero", node);
                    per_node.push(NodeEnergy {
                        node: node,
                        initial_j: 0.0,
                        remaining_j: 0.0,
                        known: false,
                    });
                }
            }
        }

        EnergySnapshot {
            per_node: per_node,
            total_initial_j: total_initial,
            total_remaining_j: total_remaining,
            total_consumed_j: total_initial - total_remaining,
            survival_time_50: self.survival_time_50,
            survival_time_all: self.survival_time_all,
        }
    }
}

impl DepletionObserver for EnergyLedger {
    fn notify(&mut self, node: NodeId, at_s: f64) {
        self.record_depletion(node, at_s);
    }
}
