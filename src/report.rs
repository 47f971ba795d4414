//! The final, immutable trial report and its console rendering.
//!
//! Output is a flat, line-oriented, human-readable summary: one line per
//! metric, one line per node energy state. Field presence is the only stable
//! part of the format.

use std::fmt;

use energy::EnergySnapshot;
use flowstats::FlowSummary;
use params::Protocol;

/// Everything one trial produces. Built once, never mutated.
#[derive(Clone, Debug)]
pub struct TrialReport {
    pub protocol: Protocol,
    pub sim_time_s: f64,
    pub flows: FlowSummary,
    pub energy: EnergySnapshot,
}

impl fmt::Display for TrialReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "--- Simulation Results ({}) ---", self.protocol.name())?;
        writeln!(f, "Total Throughput: {} Kbps", self.flows.throughput_kbps)?;
        writeln!(f, "Average Delay: {} ms", self.flows.avg_delay_ms)?;
        writeln!(f, "Packet Delivery Ratio (PDR): {} %", self.flows.delivery_ratio_pct)?;
        writeln!(f, "Packet Loss Ratio (PLR): {} %", self.flows.loss_ratio_pct)?;
        writeln!(f, "------------------------------------")?;
        writeln!(f, "Total Packets Transmitted: {}", self.flows.total_tx_packets)?;
        writeln!(f, "Total Packets Received: {}", self.flows.total_rx_packets)?;
        writeln!(f, "Total Packets Lost: {}", self.flows.total_lost_packets)?;
        writeln!(f, "------------------------------------")?;

        for node in &self.energy.per_node {
            if node.known {
                writeln!(
                    f,
                    "Node {} Remaining Energy: {} J | Initial: {} J",
                    node.node, node.remaining_j, node.initial_j
                )?;
            } else {
                writeln!(
                    f,
                    "Node {} has unknown energy source type; cannot report remaining energy.",
                    node.node
                )?;
            }
        }
        writeln!(f, "Total Initial Energy: {} J", self.energy.total_initial_j)?;
        writeln!(f, "Total Remaining Energy: {} J", self.energy.total_remaining_j)?;
        writeln!(f, "Total Energy Consumed: {} J", self.energy.total_consumed_j)?;

        write_survival(f, "NST (50% nodes dead)", self.energy.survival_time_50, self.sim_time_s)?;
        write_survival(f, "NST (all nodes dead)", self.energy.survival_time_all, self.sim_time_s)?;
        Ok(())
    }
}

fn write_survival(
    f: &mut fmt::Formatter,
    label: &str,
    at: Option<f64>,
    sim_time_s: f64,
) -> fmt::Result {
    match at {
        Some(seconds) => writeln!(f, "{}: {} s", label, seconds),
        None => writeln!(
            f,
            "{}: not reached within simulation (>= {} s)",
            label, sim_time_s
        ),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use energy::{EnergySnapshot, NodeEnergy};
    use flowstats::reduce_flows;
    use params::Protocol;

    fn report() -> TrialReport {
        TrialReport {
            protocol: Protocol::Dsdv,
            sim_time_s: 300.0,
            flows: reduce_flows(&[], 300.0),
            energy: EnergySnapshot {
                per_node: vec![
                    NodeEnergy { node: 0, initial_j: 500.0, remaining_j: 321.5, known: true },
                    NodeEnergy { node: 1, initial_j: 0.0, remaining_j: 0.0, known: false },
                ],
                total_initial_j: 500.0,
                total_remaining_j: 321.5,
                total_consumed_j: 178.5,
                survival_time_50: Some(120.25),
                survival_time_all: None,
            },
        }
    }

    #[test]
    fn render_covers_every_field() {
        let text = format!("{}", report());
        assert!(text.contains("Simulation Results (DSDV)"));
        assert!(text.contains("Total Throughput: 0 Kbps"));
        assert!(text.contains("Node 0 Remaining Energy: 321.5 J | Initial: 500 J"));
        assert!(text.contains("Node 1 has unknown energy source type"));
        assert!(text.contains("NST (50% nodes dead): 120.25 s"));
        assert!(text.contains("NST (all nodes dead): not reached within simulation (>= 300 s)"));
    }
}
