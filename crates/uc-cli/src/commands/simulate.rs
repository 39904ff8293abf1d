use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use uc_core::CarId;
use uc_simulation::{DriveState, DriveSystem, FireSystem, SimConfig, SimEventKind, Simulation};

/// Flags for one `uc simulate` run.
pub struct Options {
    pub ticks: u64,
    pub seed: u64,
    pub tick_secs: f64,
    pub delay: f64,
    pub edit_ticks: u64,
    pub boost_at: Option<u64>,
    pub ignite: Vec<String>,
    pub verbose: bool,
}

/// Parse `NAME@TICK` into its parts.
fn parse_ignition(spec: &str) -> Result<(String, u64), String> {
    let (name, tick) = spec
        .rsplit_once('@')
        .ok_or_else(|| format!("invalid ignition '{spec}', expected NAME@TICK"))?;
    let tick = tick
        .parse()
        .map_err(|_| format!("invalid tick in ignition '{spec}'"))?;
    Ok((name.to_string(), tick))
}

pub fn run(file: &Path, opts: &Options) -> Result<(), String> {
    let (track, network) = super::load_track(file)?;

    let mut ignitions: Vec<(CarId, u64)> = Vec::new();
    for spec in &opts.ignite {
        let (name, tick) = parse_ignition(spec)?;
        let car = network
            .car_by_name(&name)
            .ok_or_else(|| format!("no car named '{name}'"))?;
        ignitions.push((car.id, tick));
    }

    // Remember names up front: derailed cars are removed from the network.
    let cars: Vec<(CarId, String)> = network.cars().map(|c| (c.id, c.name.clone())).collect();

    let config = SimConfig::default()
        .with_seed(opts.seed)
        .with_seconds_per_tick(opts.tick_secs)
        .with_initial_delay(opts.delay)
        .with_max_events(5_000);

    let mut sim = Simulation::standard(network, config)
        .map_err(|e| format!("simulation init failed: {e}"))?;
    sim.init()
        .map_err(|e| format!("simulation init failed: {e}"))?;
    sim.start_with_configured_delay();

    let mut editing_for = 0;
    for _ in 0..opts.ticks {
        let next = sim.current_tick() + 1;
        if opts.boost_at == Some(next) && !sim.speed_up() {
            log::debug!("boost at tick {next} skipped: already boosted");
        }
        for (car, _) in ignitions.iter().filter(|(_, at)| *at == next) {
            if !sim.ignite(*car) {
                let name = sim.network().car_name(*car);
                log::warn!("ignition of {name} at tick {next} skipped");
            }
        }

        sim.tick().map_err(|e| format!("simulation error: {e}"))?;

        if sim.coordinator().is_editing() {
            editing_for += 1;
            if editing_for >= opts.edit_ticks {
                log::debug!(
                    "auto-continuing checkpoint {} after {editing_for} ticks",
                    sim.coordinator().checkpoint_count()
                );
                sim.continue_from_checkpoint()
                    .map_err(|e| format!("simulation error: {e}"))?;
                editing_for = 0;
            }
        }
        if sim.network().car_count() == 0 {
            break;
        }
    }

    // Header
    println!(
        "  {} '{}' {}",
        "Simulation".bold(),
        track.name,
        format!(
            "({} ticks, {:.1}s, seed={}, {}s/tick)",
            sim.current_tick(),
            sim.clock().elapsed_secs(),
            opts.seed,
            opts.tick_secs
        )
        .dimmed()
    );
    println!(
        "  {} checkpoints reached, {} events logged",
        sim.coordinator().checkpoint_count(),
        sim.events().len()
    );
    println!(
        "  Speed: {}{}",
        uc_simulation::coordinator::speed_text(sim.coordinator().speed()),
        if sim.coordinator().is_boosted() {
            " (boosted)"
        } else {
            ""
        }
    );
    println!();

    // Events
    if opts.verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for event in sim.events().events() {
            let tick_label = format!("[tick {:>5}]", event.tick).dimmed();
            let desc = colorize_event(&event.kind, &event.description);
            println!("  {tick_label} {desc}");
        }
        if sim.events().is_empty() {
            println!("  {}", "(no events)".dimmed());
        }
        println!();
    } else {
        let notable: Vec<_> = sim
            .events()
            .events()
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    SimEventKind::CarDied { .. }
                        | SimEventKind::CheckpointEntered { .. }
                        | SimEventKind::CarIgnited { .. }
                )
            })
            .collect();

        if !notable.is_empty() {
            println!("  {}", "Notable Events".bold().underline());
            for event in &notable {
                let label = match event.kind {
                    SimEventKind::CarDied { .. } => "DERAIL".red().bold(),
                    SimEventKind::CarIgnited { .. } => "  FIRE".yellow().bold(),
                    _ => "  STOP".green().bold(),
                };
                println!("  {label}  {}", event.description);
            }
            println!();
        }
    }

    // Car status table
    println!("  {}", "Car Status".bold().underline());
    println!();

    let drive = sim.get_system::<DriveSystem>();
    let fire = sim.get_system::<FireSystem>();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Car", "Tier", "Segment", "Waypoint", "State", "Fire"]);

    for (id, name) in &cars {
        let Some(car) = sim.network().get_car(*id) else {
            table.add_row(vec![
                name.clone(),
                "--".into(),
                "--".into(),
                "--".into(),
                "removed".red().to_string(),
                "--".into(),
            ]);
            continue;
        };
        let (segment, waypoint) = match car.placement() {
            Some(p) => (sim.network().segment_name(p.segment), p.index.to_string()),
            None => ("--".to_string(), "--".to_string()),
        };
        let state = drive
            .and_then(|d| d.state(*id))
            .map(format_state)
            .unwrap_or_else(|| "--".to_string());
        let burning = fire.is_some_and(|f| f.is_burning(*id));
        table.add_row(vec![
            name.clone(),
            car.tier.to_string(),
            segment,
            waypoint,
            state,
            if burning {
                "burning".red().to_string()
            } else {
                "-".to_string()
            },
        ]);
    }

    println!("{table}");
    println!();

    Ok(())
}

fn format_state(state: DriveState) -> String {
    match state {
        DriveState::Idle => "idle".dimmed().to_string(),
        DriveState::Driving => "driving".green().to_string(),
        DriveState::PausedMidDrive => "paused".yellow().to_string(),
        DriveState::Dead { .. } => "derailed".red().to_string(),
    }
}

fn colorize_event(kind: &SimEventKind, description: &str) -> colored::ColoredString {
    match kind {
        SimEventKind::CarDied { .. } | SimEventKind::CarRemoved { .. } => {
            description.red().bold()
        }
        SimEventKind::CarIgnited { .. } => description.yellow(),
        SimEventKind::CarExtinguished { .. } => description.blue(),
        SimEventKind::CheckpointEntered { .. } | SimEventKind::CheckpointExited { .. } => {
            description.green()
        }
        SimEventKind::SpeedChanged { .. } => description.cyan(),
        SimEventKind::CountdownTick { .. } | SimEventKind::TrainStarted => description.bold(),
        SimEventKind::SegmentEntered { .. } => description.blue(),
        SimEventKind::CarStartedDriving { .. }
        | SimEventKind::CarPausedDriving { .. }
        | SimEventKind::Paused
        | SimEventKind::Resumed
        | SimEventKind::CarPickedUp { .. }
        | SimEventKind::CarPlaced { .. } => description.normal(),
    }
}
