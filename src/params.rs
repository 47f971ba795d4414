use error::Error;
use node::NodeId;

/// The routing protocol under comparison.
///
/// The core never interprets this beyond reporting; the host engine is the one
/// that actually routes. The numeric choices (1/2/3) match the historical CLI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    Aodv,
    Dsdv,
    Olsr,
}

impl Protocol {
    pub fn from_choice(choice: u32) -> Result<Protocol, Error> {
        match choice {
            1 => Ok(Protocol::Aodv),
            2 => Ok(Protocol::Dsdv),
            3 => Ok(Protocol::Olsr),
            other => Err(Error::InvalidParameter(
                format!("protocol choice must be 1 (AODV), 2 (DSDV) or 3 (OLSR), got {}", other),
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Protocol::Aodv => "AODV",
            Protocol::Dsdv => "DSDV",
            Protocol::Olsr => "OLSR",
        }
    }
}

/// Per-mode radio current draws, in Amperes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadioCurrents {
    pub tx_a: f64,
    pub rx_a: f64,
    pub idle_a: f64,
    pub sleep_a: f64,
    pub cca_busy_a: f64,
    pub switching_a: f64,
}

impl Default for RadioCurrents {
    fn default() -> RadioCurrents {
        RadioCurrents {
            tx_a: 0.800,
            rx_a: 0.250,
            idle_a: 0.080,
            sleep_a: 0.010,
            cca_busy_a: 0.060,
            switching_a: 0.100,
        }
    }
}

impl RadioCurrents {
    fn validate(&self) -> Result<(), Error> {
        let draws = [
            ("txCurrentA", self.tx_a),
            ("rxCurrentA", self.rx_a),
            ("idleCurrentA", self.idle_a),
            ("sleepCurrentA", self.sleep_a),
            ("ccaBusyCurrentA", self.cca_busy_a),
            ("switchingCurrentA", self.switching_a),
        ];
        for &(name, value) in draws.iter() {
            if value < 0.0 {
                return Err(Error::InvalidParameter(
                    format!("{} must be >= 0, got {}", name, value),
                ));
            }
        }
        Ok(())
    }
}

/// Parameters for one trial. Validated once, before any node or schedule
/// is built; a trial never partially runs on bad input.
#[derive(Clone, Debug)]
pub struct TrialConfig {
    /// Number of nodes, including the sink.
    pub num_nodes: u32,
    /// Nominal simulated duration in seconds.
    pub sim_time: f64,
    /// Routing protocol under test.
    pub protocol: Protocol,
    /// Master RNG seed.
    pub rng_seed: u64,
    /// RNG run index; bump to get an independent replication of the same setup.
    pub rng_run: u64,
    /// Fraction of senders assigned to the heavy class, in `[0, 1]`.
    pub heavy_fraction: f64,
    /// Share of total traffic volume the heavy group should generate, in `[0, 1)`.
    pub heavy_traffic_share: f64,
    /// Mean inter-send interval for light senders, in seconds.
    pub mean_light_interval_s: f64,
    /// Cap on the number of packets each sender may emit.
    pub max_packets_per_sender: u32,
    /// Datagram payload size in bytes.
    pub packet_size: u32,
    /// Which node acts as the sink.
    pub sink_node_id: NodeId,
    /// Initial energy per node, in Joules.
    pub initial_energy_j: f64,
    /// Energy source supply voltage, in Volts.
    pub supply_voltage_v: f64,
    /// Radio current draws.
    pub currents: RadioCurrents,
}

impl Default for TrialConfig {
    fn default() -> TrialConfig {
        TrialConfig {
            num_nodes: 10,
            sim_time: 300.0,
            protocol: Protocol::Aodv,
            rng_seed: 12345,
            rng_run: 1,
            heavy_fraction: 0.2,
            heavy_traffic_share: 0.8,
            mean_light_interval_s: 1.0,
            max_packets_per_sender: 320,
            packet_size: 512,
            sink_node_id: 0,
            initial_energy_j: 500.0,
            supply_voltage_v: 3.7,
            currents: RadioCurrents::default(),
        }
    }
}

impl TrialConfig {
    /// Check every documented precondition. Errors here are fatal to the trial.
    pub fn validate(&self) -> Result<(), Error> {
        if self.num_nodes == 0 {
            return Err(Error::InvalidTopology("numNodes must be > 0".to_string()));
        }
        if self.num_nodes < 2 {
            return Err(Error::InvalidTopology(
                "need at least one sender besides the sink".to_string(),
            ));
        }
        if self.sink_node_id >= self.num_nodes {
            return Err(Error::InvalidTopology(
                format!("sinkNodeId {} out of range 0..{}", self.sink_node_id, self.num_nodes),
            ));
        }
        if self.sim_time <= 0.0 {
            return Err(Error::InvalidParameter(
                format!("simTime must be > 0, got {}", self.sim_time),
            ));
        }
        if self.heavy_fraction < 0.0 || self.heavy_fraction > 1.0 {
            return Err(Error::InvalidParameter(
                format!("heavyFraction must be in [0, 1], got {}", self.heavy_fraction),
            ));
        }
        if self.heavy_traffic_share < 0.0 || self.heavy_traffic_share >= 1.0 {
            return Err(Error::InvalidParameter(
                format!("heavyTrafficShare must be in [0, 1), got {}", self.heavy_traffic_share),
            ));
        }
        if self.mean_light_interval_s <= 0.0 {
            return Err(Error::InvalidParameter(
                format!("meanLightIntervalSeconds must be > 0, got {}", self.mean_light_interval_s),
            ));
        }
        if self.max_packets_per_sender == 0 {
            return Err(Error::InvalidParameter(
                "maxPacketsPerSender must be > 0".to_string(),
            ));
        }
        if self.packet_size == 0 {
            return Err(Error::InvalidParameter("packetSize must be > 0".to_string()));
        }
        if self.initial_energy_j < 0.0 {
            return Err(Error::InvalidParameter(
                format!("initialEnergyJ must be >= 0, got {}", self.initial_energy_j),
            ));
        }
        if self.supply_voltage_v <= 0.0 {
            return Err(Error::InvalidParameter(
                format!("supplyVoltageV must be > 0, got {}", self.supply_voltage_v),
            ));
        }
        self.currents.validate()
    }

    /// All node ids except the sink, in id order. The classifier shuffles them.
    pub fn sender_ids(&self) -> Vec<NodeId> {
        (0..self.num_nodes).filter(|&id| id != self.sink_node_id).collect()
    }
}
