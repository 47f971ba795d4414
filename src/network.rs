//! In-memory testbed engine.
//!
//! A single-threaded discrete-event engine implementing the `Engine` seam,
//! used by the binary and the integration tests in place of a full host
//! simulator. Events live in a `BTreeMap` keyed by a microsecond-integer
//! clock and execute in non-decreasing time order.
//!
//! The model is deliberately coarse: datagrams are delivered to the sink with
//! a per-protocol probability and delay band, and energy drains linearly
//! (continuous idle draw plus per-packet tx/rx bursts priced at
//! `current x voltage x airtime`). Only the tx/rx/idle draws enter the model;
//! sleep, CCA-busy and switching currents are part of the host-engine
//! contract and pass through untouched. No propagation, MAC contention or
//! routing convergence is modelled here.

use std::collections::{BTreeMap, BTreeSet};

use energy::DepletionObserver;
use engine::{Engine, EnergySource};
use flowstats::FlowRecord;
use node::NodeId;
use params::{Protocol, RadioCurrents};
use random::RandomStream;
use traffic::SendSchedule;

/// Nominal PHY rate used to price packet airtime.
const PHY_RATE_BPS: f64 = 1.0e6;

/// Interval between idle-drain sweeps over all nodes.
const ENERGY_SWEEP_INTERVAL_US: u64 = 1_000_000;

fn to_us(seconds: f64) -> u64 {
    (seconds * 1e6).round() as u64
}

fn to_s(us: u64) -> f64 {
    us as f64 / 1e6
}

/// A linear-drain energy cell: continuous idle draw plus instantaneous
/// per-packet bursts. Depletes exactly once, at an analytically computed
/// crossing time.
#[derive(Clone, Debug)]
pub struct BasicCell {
    initial_j: f64,
    remaining_j: f64,
    voltage_v: f64,
    currents: RadioCurrents,
    last_update_us: u64,
    depleted: bool,
}

impl BasicCell {
    fn new(initial_j: f64, currents: RadioCurrents, voltage_v: f64) -> Self {
        BasicCell {
            initial_j: initial_j,
            remaining_j: initial_j,
            voltage_v: voltage_v,
            currents: currents,
            last_update_us: 0,
            depleted: false,
        }
    }

    fn is_alive(&self) -> bool {
        !self.depleted
    }

    fn airtime_s(&self, bytes: u32) -> f64 {
        bytes as f64 * 8.0 / PHY_RATE_BPS
    }

    fn tx_energy_j(&self, bytes: u32) -> f64 {
        self.currents.tx_a * self.voltage_v * self.airtime_s(bytes)
    }

    fn rx_energy_j(&self, bytes: u32) -> f64 {
        self.currents.rx_a * self.voltage_v * self.airtime_s(bytes)
    }

    /// Apply idle drain up to `now_us`. Returns the crossing time in seconds
    /// if the balance reached zero during the interval.
    fn drain_idle(&mut self, now_us: u64) -> Option<f64> {
        if now_us <= self.last_update_us {
            return None;
        }
        let start_us = self.last_update_us;
        self.last_update_us = now_us;
        if self.depleted {
            return None;
        }
        let idle_w = self.currents.idle_a * self.voltage_v;
        let spent = idle_w * to_s(now_us - start_us);
        if idle_w > 0.0 && spent >= self.remaining_j {
            let crossing = to_s(start_us) + self.remaining_j / idle_w;
            self.remaining_j = 0.0;
            self.depleted = true;
            return Some(crossing);
        }
        self.remaining_j -= spent;
        None
    }

    /// Apply an instantaneous burst at `at_us`. Returns the depletion time if
    /// the burst emptied the cell.
    fn drain_burst(&mut self, joules: f64, at_us: u64) -> Option<f64> {
        if self.depleted {
            return None;
        }
        if joules >= self.remaining_j {
            self.remaining_j = 0.0;
            self.depleted = true;
            return Some(to_s(at_us));
        }
        self.remaining_j -= joules;
        None
    }
}

/// The heterogeneous energy-source population the testbed can install.
///
/// `Opaque` stands in for a model with no recognised remaining-energy
/// accessor and exists to exercise the degraded reporting path.
#[derive(Clone, Debug)]
pub enum EnergyModel {
    Basic(BasicCell),
    Opaque,
}

impl EnergySource for EnergyModel {
    fn remaining_energy(&self) -> Option<f64> {
        match *self {
            EnergyModel::Basic(ref cell) => Some(cell.remaining_j),
            EnergyModel::Opaque => None,
        }
    }

    fn initial_energy(&self) -> Option<f64> {
        match *self {
            EnergyModel::Basic(ref cell) => Some(cell.initial_j),
            EnergyModel::Opaque => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Receiver {
    port: u16,
    start_us: u64,
    stop_us: u64,
}

#[derive(Clone, Debug)]
enum Event {
    /// Emit one datagram and, if packets remain, schedule the next send.
    Send {
        sender: NodeId,
        sink: NodeId,
        port: u16,
        size: u32,
        remaining: u32,
        interval_us: u64,
        stop_us: u64,
    },
    /// A datagram arriving at its destination.
    Deliver {
        source: NodeId,
        destination: NodeId,
        port: u16,
        size: u32,
        sent_us: u64,
    },
    /// Periodic idle-drain pass over every node.
    EnergySweep,
}

/// Per-protocol delivery probability and mean one-way delay. Routing is not
/// modelled; these coarse profiles just make protocol comparisons non-trivial.
fn delivery_profile(protocol: Protocol) -> (f64, f64) {
    match protocol {
        Protocol::Aodv => (0.95, 0.030),
        Protocol::Dsdv => (0.90, 0.015),
        Protocol::Olsr => (0.93, 0.012),
    }
}

pub struct TestbedEngine {
    protocol: Protocol,
    rng: RandomStream,
    num_nodes: u32,
    sources: BTreeMap<NodeId, EnergyModel>,
    /// Nodes whose sources stay opaque even if an install request arrives.
    opaque_nodes: BTreeSet<NodeId>,
    receivers: BTreeMap<NodeId, Receiver>,
    /// Map from timestamp to the events due then; the engine's whole future.
    queue: BTreeMap<u64, Vec<Event>>,
    flows: BTreeMap<(NodeId, NodeId), FlowRecord>,
    now_us: u64,
}

impl TestbedEngine {
    pub fn new(protocol: Protocol, rng: RandomStream) -> Self {
        TestbedEngine {
            protocol: protocol,
            rng: rng,
            num_nodes: 0,
            sources: BTreeMap::new(),
            opaque_nodes: BTreeSet::new(),
            receivers: BTreeMap::new(),
            queue: BTreeMap::new(),
            flows: BTreeMap::new(),
            now_us: 0,
        }
    }

    /// Give a node a source that exposes no accessor, and keep it that way
    /// for the rest of the trial. For exercising the unknown-energy-source
    /// path.
    pub fn install_opaque_source(&mut self, node: NodeId) {
        self.opaque_nodes.insert(node);
        self.sources.insert(node, EnergyModel::Opaque);
    }

    fn push(&mut self, at_us: u64, event: Event) {
        self.queue.entry(at_us).or_insert_with(Vec::new).push(event);
    }

    fn flow_entry(&mut self, source: NodeId, destination: NodeId) -> &mut FlowRecord {
        self.flows.entry((source, destination)).or_insert_with(|| {
            FlowRecord { source: source, destination: destination, ..FlowRecord::default() }
        })
    }

    fn sweep_energy(&mut self, now_us: u64, observer: &mut DepletionObserver) {
        for (&node, source) in self.sources.iter_mut() {
            if let EnergyModel::Basic(ref mut cell) = *source {
                if let Some(crossing) = cell.drain_idle(now_us) {
                    observer.notify(node, crossing);
                }
            }
        }
    }

    fn handle_send(
        &mut self,
        sender: NodeId,
        sink: NodeId,
        port: u16,
        size: u32,
        remaining: u32,
        interval_us: u64,
        stop_us: u64,
        observer: &mut DepletionObserver,
    ) {
        let now = self.now_us;
        if remaining == 0 || now > stop_us {
            return;
        }

        // Bring the sender's cell up to date, then charge the transmission.
        // A burst that empties the cell still carries its packet out.
        let mut depletion = None;
        let alive = match self.sources.get_mut(&sender) {
            Some(&mut EnergyModel::Basic(ref mut cell)) => {
                if let Some(crossing) = cell.drain_idle(now) {
                    depletion = Some(crossing);
                }
                if cell.is_alive() {
                    let burst = cell.tx_energy_j(size);
                    if let Some(crossing) = cell.drain_burst(burst, now) {
                        depletion = Some(crossing);
                    }
                    true
                } else {
                    false
                }
            }
            // Opaque or missing sources never die.
            Some(&mut EnergyModel::Opaque) | None => true,
        };
        if let Some(crossing) = depletion {
            observer.notify(sender, crossing);
        }
        if !alive {
            trace!("Node({}): dead, send sequence ends", sender);
            return;
        }

        {
            let flow = self.flow_entry(sender, sink);
            if flow.tx_packets == 0 {
                flow.first_tx_s = to_s(now);
            }
            flow.tx_packets += 1;
        }

        let (p_deliver, mean_delay_s) = delivery_profile(self.protocol);
        if self.rng.uniform(0.0, 1.0) < p_deliver {
            let delay_s = self.rng.uniform(0.5 * mean_delay_s, 1.5 * mean_delay_s);
            let at = now + to_us(delay_s).max(1);
            self.push(at, Event::Deliver {
                source: sender,
                destination: sink,
                port: port,
                size: size,
                sent_us: now,
            });
        } else {
            self.flow_entry(sender, sink).lost_packets += 1;
            trace!("Node({}): packet to {} dropped in transit", sender, sink);
        }

        if remaining > 1 {
            let next = now + interval_us.max(1);
            if next <= stop_us {
                self.push(next, Event::Send {
                    sender: sender,
                    sink: sink,
                    port: port,
                    size: size,
                    remaining: remaining - 1,
                    interval_us: interval_us,
                    stop_us: stop_us,
                });
            }
        }
    }

    fn handle_deliver(
        &mut self,
        source: NodeId,
        destination: NodeId,
        port: u16,
        size: u32,
        sent_us: u64,
        observer: &mut DepletionObserver,
    ) {
        let now = self.now_us;
        let listening = match self.receivers.get(&destination) {
            Some(receiver) => {
                receiver.port == port && now >= receiver.start_us && now <= receiver.stop_us
            }
            None => false,
        };
        if !listening {
            trace!("Node({}): not listening, dropping packet from {}", destination, source);
            return;
        }

        let mut depletion = None;
        let alive = match self.sources.get_mut(&destination) {
            Some(&mut EnergyModel::Basic(ref mut cell)) => {
                if let Some(crossing) = cell.drain_idle(now) {
                    depletion = Some(crossing);
                }
                let alive = cell.is_alive();
                if alive {
                    let burst = cell.rx_energy_j(size);
                    if let Some(crossing) = cell.drain_burst(burst, now) {
                        depletion = Some(crossing);
                    }
                }
                alive
            }
            Some(&mut EnergyModel::Opaque) | None => true,
        };
        if let Some(crossing) = depletion {
            observer.notify(destination, crossing);
        }
        if !alive {
            trace!("Node({}): dead, dropping packet from {}", destination, source);
            return;
        }

        let flow = self.flow_entry(source, destination);
        flow.rx_packets += 1;
        flow.rx_bytes += size as u64;
        flow.delay_sum_s += to_s(now - sent_us);
        flow.last_rx_s = to_s(now);
    }

    fn handle_event(&mut self, event: Event, until_us: u64, observer: &mut DepletionObserver) {
        match event {
            Event::Send { sender, sink, port, size, remaining, interval_us, stop_us } => {
                self.handle_send(sender, sink, port, size, remaining, interval_us, stop_us, observer);
            }
            Event::Deliver { source, destination, port, size, sent_us } => {
                self.handle_deliver(source, destination, port, size, sent_us, observer);
            }
            Event::EnergySweep => {
                let now = self.now_us;
                self.sweep_energy(now, observer);
                let next = now + ENERGY_SWEEP_INTERVAL_US;
                if next <= until_us {
                    self.push(next, Event::EnergySweep);
                }
            }
        }
    }
}

impl Engine for TestbedEngine {
    fn create_nodes(&mut self, count: u32) {
        self.num_nodes = count;
    }

    fn install_energy_source(
        &mut self,
        node: NodeId,
        initial_energy_j: f64,
        currents: &RadioCurrents,
        supply_voltage_v: f64,
    ) {
        if self.opaque_nodes.contains(&node) {
            return;
        }
        let cell = BasicCell::new(initial_energy_j, *currents, supply_voltage_v);
        self.sources.insert(node, EnergyModel::Basic(cell));
    }

    fn energy_source(&self, node: NodeId) -> Option<&EnergySource> {
        self.sources.get(&node).map(|source| source as &EnergySource)
    }

    fn install_receive_endpoint(&mut self, node: NodeId, port: u16, start_s: f64, stop_s: f64) {
        let receiver = Receiver {
            port: port,
            start_us: to_us(start_s),
            stop_us: to_us(stop_s),
        };
        self.receivers.insert(node, receiver);
    }

    fn install_send_endpoint(&mut self, schedule: &SendSchedule, port: u16) {
        let event = Event::Send {
            sender: schedule.sender,
            sink: schedule.sink,
            port: port,
            size: schedule.packet_size,
            remaining: schedule.max_packets,
            interval_us: to_us(schedule.interval_s).max(1),
            stop_us: to_us(schedule.stop_s),
        };
        self.push(to_us(schedule.start_s), event);
    }

    fn run(&mut self, until_s: f64, observer: &mut DepletionObserver) {
        let until_us = to_us(until_s);
        let first_sweep = self.now_us + ENERGY_SWEEP_INTERVAL_US;
        if first_sweep <= until_us {
            self.push(first_sweep, Event::EnergySweep);
        }

        loop {
            let at = match self.queue.keys().next() {
                Some(&at) => at,
                None => break,
            };
            if at > until_us {
                break;
            }
            let events = match self.queue.remove(&at) {
                Some(events) => events,
                None => break,
            };
            self.now_us = at;
            for event in events {
                self.handle_event(event, until_us, observer);
            }
        }

        // Land exactly on the horizon and settle idle drain up to it, so the
        // reported remaining energies cover the whole trial.
        self.now_us = until_us;
        self.sweep_energy(until_us, observer);
    }

    fn collect_flow_records(&self) -> Vec<FlowRecord> {
        self.flows
            .values()
            .map(|record| {
                let mut record = record.clone();
                // Packets still in flight at the horizon count as lost, in
                // the manner of a final lost-packet check.
                record.lost_packets = record.tx_packets - record.rx_packets;
                record
            })
            .collect()
    }

    fn now_s(&self) -> f64 {
        to_s(self.now_us)
    }
}
