extern crate manetsim;
extern crate clap;

use std::process;
use std::str::FromStr;

use clap::{App, Arg, ArgMatches};

use manetsim::logging::init_logging;
use manetsim::network::TestbedEngine;
use manetsim::params::{Protocol, RadioCurrents, TrialConfig};
use manetsim::random::RandomStream;
use manetsim::simulation::run_trial;

fn flag<'a>(name: &'a str, help: &'a str) -> Arg<'a, 'a> {
    Arg::with_name(name)
        .long(name)
        .takes_value(true)
        .help(help)
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str, default: T) -> T {
    match matches.value_of(name) {
        Some(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                eprintln!("could not parse --{} value '{}'", name, raw);
                process::exit(2);
            }
        },
        None => default,
    }
}

fn main() {
    init_logging();

    let matches = App::new("manetsim")
        .about("Runs one ad-hoc network trial: synthesises a heavy/light traffic \
               workload towards a single sink, tracks per-node energy depletion, and \
               reports throughput, delay, delivery and survival-time metrics.")
        .arg(flag("num-nodes", "Number of nodes, including the sink"))
        .arg(flag("sim-time", "Simulated duration in seconds"))
        .arg(flag("protocol", "Routing protocol (1=AODV, 2=DSDV, 3=OLSR)"))
        .arg(flag("rng-seed", "Master RNG seed"))
        .arg(flag("rng-run", "RNG run index"))
        .arg(flag("heavy-fraction", "Fraction of heavy senders [0-1]"))
        .arg(flag("heavy-traffic-share", "Share of traffic from the heavy group [0-1)"))
        .arg(flag("mean-light-interval", "Mean inter-packet interval for light senders (s)"))
        .arg(flag("max-packets", "Max packets per sender"))
        .arg(flag("packet-size", "Packet size in bytes"))
        .arg(flag("sink-node", "Node id acting as sink"))
        .arg(flag("initial-energy", "Initial energy per node (J)"))
        .arg(flag("supply-voltage", "Energy source supply voltage (V)"))
        .arg(flag("tx-current", "Radio Tx current (A)"))
        .arg(flag("rx-current", "Radio Rx current (A)"))
        .arg(flag("idle-current", "Radio idle current (A)"))
        .arg(flag("sleep-current", "Radio sleep current (A)"))
        .arg(flag("cca-busy-current", "Radio CCA-busy current (A)"))
        .arg(flag("switching-current", "Radio state-switching current (A)"))
        .get_matches();

    let defaults = TrialConfig::default();
    let default_currents = RadioCurrents::default();

    let protocol = match Protocol::from_choice(value(&matches, "protocol", 1)) {
        Ok(protocol) => protocol,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(2);
        }
    };

    let config = TrialConfig {
        num_nodes: value(&matches, "num-nodes", defaults.num_nodes),
        sim_time: value(&matches, "sim-time", defaults.sim_time),
        protocol: protocol,
        rng_seed: value(&matches, "rng-seed", defaults.rng_seed),
        rng_run: value(&matches, "rng-run", defaults.rng_run),
        heavy_fraction: value(&matches, "heavy-fraction", defaults.heavy_fraction),
        heavy_traffic_share: value(&matches, "heavy-traffic-share", defaults.heavy_traffic_share),
        mean_light_interval_s: value(&matches, "mean-light-interval", defaults.mean_light_interval_s),
        max_packets_per_sender: value(&matches, "max-packets", defaults.max_packets_per_sender),
        packet_size: value(&matches, "packet-size", defaults.packet_size),
        sink_node_id: value(&matches, "sink-node", defaults.sink_node_id),
        initial_energy_j: value(&matches, "initial-energy", defaults.initial_energy_j),
        supply_voltage_v: value(&matches, "supply-voltage", defaults.supply_voltage_v),
        currents: RadioCurrents {
            tx_a: value(&matches, "tx-current", default_currents.tx_a),
            rx_a: value(&matches, "rx-current", default_currents.rx_a),
            idle_a: value(&matches, "idle-current", default_currents.idle_a),
            sleep_a: value(&matches, "sleep-current", default_currents.sleep_a),
            cca_busy_a: value(&matches, "cca-busy-current", default_currents.cca_busy_a),
            switching_a: value(&matches, "switching-current", default_currents.switching_a),
        },
    };

    println!("Using {} routing protocol", config.protocol.name());

    // The engine gets its own stream, offset by one run index, so its delivery
    // randomness doesn't perturb the workload's draws.
    let engine_rng = RandomStream::new(config.rng_seed, config.rng_run.wrapping_add(1));
    let mut engine = TestbedEngine::new(config.protocol, engine_rng);

    match run_trial(config, &mut engine) {
        Ok(report) => print!("{}", report),
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}
