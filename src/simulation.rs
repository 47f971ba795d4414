//! Trial orchestration.
//!
//! A `Trial` wires the pieces of one experiment together: it validates the
//! configuration up front, builds the node population and energy sources on
//! the host engine, installs the synthesised traffic, runs the event loop to
//! the horizon with the energy ledger observing depletions, and reduces the
//! collected flow records into a `TrialReport`. All mutable trial state (the
//! ledger, counters, survival times) is owned here and dies with the trial.

use classify::classify_senders;
use energy::EnergyLedger;
use engine::Engine;
use error::Error;
use flowstats::reduce_flows;
use node::Node;
use params::TrialConfig;
use random::RandomStream;
use report::TrialReport;
use traffic::{build_schedules, SINK_PORT, SINK_START_S, WARMUP_OFFSET_S};

pub struct Trial {
    config: TrialConfig,
    ledger: EnergyLedger,
}

impl Trial {
    /// Validate the configuration and set up a trial. Errors here are fatal;
    /// nothing has been installed on the engine yet.
    pub fn new(config: TrialConfig) -> Result<Trial, Error> {
        config.validate()?;
        Ok(Trial { config: config, ledger: EnergyLedger::new() })
    }

    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    /// Run the trial to completion on the given engine.
    pub fn run(&mut self, engine: &mut Engine) -> Result<TrialReport, Error> {
        let config = self.config.clone();
        let mut rng = RandomStream::new(config.rng_seed, config.rng_run);

        info!("trial: {} nodes, {}s horizon, {} routing, seed {} run {}",
              config.num_nodes, config.sim_time, config.protocol.name(),
              config.rng_seed, config.rng_run);

        // Population and energy sources.
        engine.create_nodes(config.num_nodes);
        let nodes: Vec<Node> = (0..config.num_nodes)
            .map(|id| Node::new(id, config.sink_node_id))
            .collect();
        for node in &nodes {
            engine.install_energy_source(
                node.id,
                config.initial_energy_j,
                &config.currents,
                config.supply_voltage_v,
            );
        }

        // Snapshot initial energies before anything drains. A source with no
        // recognised accessor contributes zero but does not fail the trial.
        for node in &nodes {
            let initial = engine
                .energy_source(node.id)
                .and_then(|source| source.remaining_energy());
            match initial {
                Some(joules) => self.ledger.register(node.id, joules),
                None => {
                    warn!("unknown energy source type on node {}; recording 0 J", node.id);
                    self.ledger.register(node.id, 0.0);
                }
            }
        }

        // Traffic synthesis: classify, schedule, install. The sink's receive
        // endpoint starts early so it is listening before the first send.
        let sender_ids = config.sender_ids();
        let split = classify_senders(
            &sender_ids,
            config.heavy_fraction,
            config.heavy_traffic_share,
            config.mean_light_interval_s,
            &mut rng,
        )?;
        let schedules = build_schedules(
            &split,
            config.sink_node_id,
            WARMUP_OFFSET_S,
            config.sim_time,
            config.max_packets_per_sender,
            config.packet_size,
            &mut rng,
        )?;
        engine.install_receive_endpoint(config.sink_node_id, SINK_PORT, SINK_START_S, config.sim_time);
        for schedule in &schedules {
            engine.install_send_endpoint(schedule, SINK_PORT);
        }

        engine.run(config.sim_time, &mut self.ledger);

        let records = engine.collect_flow_records();
        let flows = reduce_flows(&records, config.sim_time);
        let energy = self.ledger.snapshot(engine);

        Ok(TrialReport {
            protocol: config.protocol,
            sim_time_s: config.sim_time,
            flows: flows,
            energy: energy,
        })
    }
}

/// The single entry point: one configuration, one engine, one report.
pub fn run_trial(config: TrialConfig, engine: &mut Engine) -> Result<TrialReport, Error> {
    let mut trial = Trial::new(config)?;
    trial.run(engine)
}
