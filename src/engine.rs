//! Seams to the host simulation engine.
//!
//! The event kernel, radio/PHY layer, routing protocols, mobility and the
//! flow-level packet accounting all live on the other side of these traits.
//! The core drives them, observes depletion notifications, and folds the flow
//! records they hand back; it never looks inside.

use energy::DepletionObserver;
use flowstats::FlowRecord;
use node::NodeId;
use params::RadioCurrents;
use traffic::SendSchedule;

/// Uniform capability interface over heterogeneous energy-source models.
///
/// A source that does not expose a recognised remaining-energy accessor
/// answers `None`; callers degrade to a zero contribution rather than
/// aborting the trial.
pub trait EnergySource {
    fn remaining_energy(&self) -> Option<f64>;
    fn initial_energy(&self) -> Option<f64>;
}

/// The host engine driving one trial.
///
/// All calls happen from a single thread, in trial order: nodes and energy
/// sources are installed first, then endpoints, then `run` is invoked once,
/// then flow records are collected. Depletion notifications arrive via the
/// observer passed to `run`, at most once meaningfully per node (duplicates
/// are tolerated and ignored by the ledger).
pub trait Engine {
    /// Create the node population `0..count`.
    fn create_nodes(&mut self, count: u32);

    /// Attach an energy source with the given starting balance and radio draws.
    fn install_energy_source(
        &mut self,
        node: NodeId,
        initial_energy_j: f64,
        currents: &RadioCurrents,
        supply_voltage_v: f64,
    );

    /// Access a node's energy source for balance probing.
    fn energy_source(&self, node: NodeId) -> Option<&EnergySource>;

    /// Install the sink's receive endpoint, active over `[start_s, stop_s]`.
    fn install_receive_endpoint(&mut self, node: NodeId, port: u16, start_s: f64, stop_s: f64);

    /// Hand one sender's schedule to the transport layer.
    fn install_send_endpoint(&mut self, schedule: &SendSchedule, port: u16);

    /// Run the event loop up to `until_s` simulated seconds, delivering
    /// depletion notifications to `observer` as they occur.
    fn run(&mut self, until_s: f64, observer: &mut DepletionObserver);

    /// Collect the per-flow counters, once, after the run completes.
    fn collect_flow_records(&self) -> Vec<FlowRecord>;

    /// Current simulated time in seconds.
    fn now_s(&self) -> f64;
}
