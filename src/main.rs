use std::{
    path::PathBuf,
    process,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use cpufreq_control::{
    Backend, Controller, CpufreqError, OwnedList, Policy, PolicySnapshot, Principal, Stat,
    UnitId, config::Config,
};
use log::info;
use serde::Serialize;

/// Outcome of one query, as shown in a report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum Reading<T> {
    Ok(T),
    Error(String),
}

impl<T> From<cpufreq_control::Result<T>> for Reading<T> {
    fn from(result: cpufreq_control::Result<T>) -> Self {
        match result {
            Ok(v) => Reading::Ok(v),
            Err(e) => Reading::Error(e.to_string()),
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Reading<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reading::Ok(v) => write!(f, "{v}"),
            Reading::Error(e) => write!(f, "<{e}>"),
        }
    }
}

#[derive(Debug, Serialize)]
struct UnitReport {
    unit: UnitId,
    driver: Reading<String>,
    frequency: Reading<u64>,
    transition_latency: Reading<u64>,
    hardware_limits: Reading<(u64, u64)>,
    policy: Reading<PolicySnapshot>,
    available_governors: Reading<Vec<String>>,
    available_frequencies: Reading<Vec<u64>>,
    affected_units: Reading<Vec<UnitId>>,
    related_units: Reading<Vec<UnitId>>,
    stats: Reading<(Vec<Stat>, u64)>,
    transitions: Reading<u64>,
}

impl UnitReport {
    fn collect<B: Backend>(controller: &Controller<B>, id: UnitId) -> Self {
        Self {
            unit: id,
            driver: controller.driver_name(id).into(),
            frequency: controller.frequency(id).into(),
            transition_latency: controller.transition_latency(id).into(),
            hardware_limits: controller.hardware_limits(id).into(),
            policy: controller.policy(id).into(),
            available_governors: controller
                .available_governors(id)
                .map(OwnedList::into_vec)
                .into(),
            available_frequencies: controller
                .available_frequencies(id)
                .map(OwnedList::into_vec)
                .into(),
            affected_units: controller.affected_units(id).map(OwnedList::into_vec).into(),
            related_units: controller.related_units(id).map(OwnedList::into_vec).into(),
            stats: controller
                .stats(id)
                .map(|(stats, total)| (stats.into_vec(), total))
                .into(),
            transitions: controller.transition_count(id).into(),
        }
    }

    fn print(&self) {
        fn join<T: ToString>(items: &Reading<Vec<T>>) -> String {
            match items {
                Reading::Ok(v) => v.iter().map(T::to_string).collect::<Vec<_>>().join(" "),
                Reading::Error(e) => format!("<{e}>"),
            }
        }

        println!("unit {}:", self.unit);
        println!("  driver: {}", self.driver);
        println!("  current frequency: {} kHz", self.frequency);
        println!("  transition latency: {} ns", self.transition_latency);
        match &self.hardware_limits {
            Reading::Ok((min, max)) => println!("  hardware limits: {min} - {max} kHz"),
            Reading::Error(e) => println!("  hardware limits: <{e}>"),
        }
        match &self.policy {
            Reading::Ok(p) => println!(
                "  current policy: {} - {} kHz, governor \"{}\"",
                p.min, p.max, p.governor
            ),
            Reading::Error(e) => println!("  current policy: <{e}>"),
        }
        println!("  available governors: {}", join(&self.available_governors));
        println!("  available frequencies: {}", join(&self.available_frequencies));
        println!("  affected units: {}", join(&self.affected_units));
        println!("  related units: {}", join(&self.related_units));
        match &self.stats {
            Reading::Ok((stats, total)) => {
                for stat in stats {
                    println!("  {stat}");
                }
                println!("  total time: {total}");
            }
            Reading::Error(e) => println!("  stats: <{e}>"),
        }
        println!("  transitions: {}", self.transitions);
    }
}

enum Command {
    Info,
    SetFrequency(UnitId, u64),
    SetGovernor(UnitId, String),
    SetPolicy(UnitId, Policy),
    ModifyMin(UnitId, u64),
    ModifyMax(UnitId, u64),
}

struct Args {
    config: Option<PathBuf>,
    json: bool,
    monitor: Option<Duration>,
    command: Command,
}

fn print_usage() {
    println!("cpufreq-control - inspect and change per-unit frequency scaling state");
    println!();
    println!("Usage:");
    println!("  cpufreq-control [OPTIONS] [COMMAND]");
    println!();
    println!("Options:");
    println!("  --config <path>     Configuration file (default: ~/.config/cpufreq-control/config.toml)");
    println!("  --json              Print reports as JSON");
    println!("  --monitor <ms>      Repeat the report every <ms> milliseconds until Ctrl+C");
    println!("  --help              Show this help");
    println!();
    println!("Commands:");
    println!("  info                              Report every unit (default)");
    println!("  set-frequency <unit> <khz>");
    println!("  set-governor <unit> <name>");
    println!("  set-policy <unit> <min> <max> <governor>");
    println!("  modify-min <unit> <khz>");
    println!("  modify-max <unit> <khz>");
    println!();
    println!("Changes apply to the in-memory registry only and require root.");
}

fn usage_error(msg: &str) -> ! {
    eprintln!("Error: {msg}");
    eprintln!();
    print_usage();
    process::exit(1);
}

fn number<T: std::str::FromStr>(value: Option<&String>, what: &str) -> T {
    value
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| usage_error(&format!("{what} must be a valid number")))
}

fn parse_args(args: &[String]) -> Args {
    let mut config = None;
    let mut json = false;
    let mut monitor = None;
    let mut positional = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--config" => {
                let path = args
                    .get(i + 1)
                    .unwrap_or_else(|| usage_error("--config requires an argument"));
                config = Some(PathBuf::from(path));
                i += 1;
            }
            "--json" => json = true,
            "--monitor" => {
                let ms: u64 = number(args.get(i + 1), "--monitor interval");
                monitor = Some(Duration::from_millis(ms));
                i += 1;
            }
            _ => positional.push(args[i].clone()),
        }
        i += 1;
    }

    let unit = || number::<UnitId>(positional.get(1), "unit");
    let command = match positional.first().map(String::as_str) {
        None | Some("info") => Command::Info,
        Some("set-frequency") => Command::SetFrequency(unit(), number(positional.get(2), "frequency")),
        Some("set-governor") => Command::SetGovernor(
            unit(),
            positional
                .get(2)
                .cloned()
                .unwrap_or_else(|| usage_error("set-governor requires a governor name")),
        ),
        Some("set-policy") => {
            let governor = positional
                .get(4)
                .unwrap_or_else(|| usage_error("set-policy requires <min> <max> <governor>"));
            Command::SetPolicy(
                unit(),
                Policy::new(
                    number(positional.get(2), "min"),
                    number(positional.get(3), "max"),
                    governor,
                ),
            )
        }
        Some("modify-min") => Command::ModifyMin(unit(), number(positional.get(2), "frequency")),
        Some("modify-max") => Command::ModifyMax(unit(), number(positional.get(2), "frequency")),
        Some(other) => usage_error(&format!("unknown command: {other}")),
    };

    let args = Args {
        config,
        json,
        monitor,
        command,
    };
    if let Err(msg) = args.check() {
        usage_error(msg);
    }
    args
}

impl Args {
    /// Reject option combinations that would be silently ignored.
    fn check(&self) -> Result<(), &'static str> {
        if self.monitor.is_some() && !matches!(self.command, Command::Info) {
            return Err("--monitor can only be used with the info command");
        }
        Ok(())
    }
}

fn report<B: Backend>(
    controller: &Controller<B>,
    units: impl Iterator<Item = UnitId>,
    json: bool,
) -> Result<(), serde_json::Error> {
    let reports: Vec<_> = units.map(|id| UnitReport::collect(controller, id)).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for r in &reports {
            r.print();
        }
    }
    Ok(())
}

fn apply<B: Backend>(controller: &mut Controller<B>, command: Command) -> Result<Option<UnitId>, CpufreqError> {
    let id = match command {
        Command::Info => return Ok(None),
        Command::SetFrequency(id, khz) => {
            controller.set_frequency(id, khz)?;
            id
        }
        Command::SetGovernor(id, name) => {
            controller.modify_policy_governor(id, Some(&name))?;
            id
        }
        Command::SetPolicy(id, policy) => {
            controller.set_policy(id, Some(&policy))?;
            id
        }
        Command::ModifyMin(id, khz) => {
            controller.modify_policy_min(id, khz)?;
            id
        }
        Command::ModifyMax(id, khz) => {
            controller.modify_policy_max(id, khz)?;
            id
        }
    };
    Ok(Some(id))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let args = parse_args(&args);

    let config = Config::load(args.config.as_deref())?;
    let principal = Principal::current();
    info!("running as {principal:?}");
    let mut controller = config.build_controller(principal)?;

    match apply(&mut controller, args.command) {
        Ok(Some(id)) => return Ok(report(&controller, std::iter::once(id), args.json)?),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(e.errno());
        }
    }

    let Some(interval) = args.monitor else {
        return Ok(report(&controller, controller.units(), args.json)?);
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        report(&controller, controller.units(), args.json)?;
        std::thread::sleep(interval);
    }
    info!("monitor stopped");
    Ok(())
}
