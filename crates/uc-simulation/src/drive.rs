use std::collections::HashMap;

use uc_core::Vec3;
use uc_core::car::{CarId, Placement};
use uc_core::error::RailError;
use uc_core::network::RailNetwork;
use uc_core::rail::Waypoint;
use uc_core::traversal::{self, Step, StepEvent};

use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::system::System;

/// Upper bound on waypoints a car may pass in one tick.
const MAX_STEPS_PER_TICK: usize = 64;

/// Lifecycle of a single car's drive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveState {
    /// Waiting for the train to start, or off the rail.
    Idle,
    /// Moving toward its target waypoint.
    Driving,
    /// Holding still until the pause lifts.
    PausedMidDrive,
    /// Ran off the rail; removed after the grace period.
    Dead {
        /// Tick on which the car died.
        since_tick: u64,
    },
}

/// Per-car drive state.
#[derive(Debug, Clone)]
struct CarMotion {
    state: DriveState,
    /// Facing at the start of the current waypoint span.
    span_start_facing: Vec3,
    /// Distance to the target at the start of the current span.
    span_length: f32,
}

impl CarMotion {
    fn idle() -> Self {
        Self {
            state: DriveState::Idle,
            span_start_facing: Vec3::X,
            span_length: 0.0,
        }
    }
}

/// Moves every car along the rail at the coordinator's speed.
#[derive(Debug)]
pub struct DriveSystem {
    motions: HashMap<CarId, CarMotion>,
    removal_grace_ticks: u64,
}

impl Default for DriveSystem {
    fn default() -> Self {
        Self::new(2)
    }
}

impl DriveSystem {
    /// Create a drive system that removes dead cars after `removal_grace_ticks`.
    pub fn new(removal_grace_ticks: u64) -> Self {
        Self {
            motions: HashMap::new(),
            removal_grace_ticks,
        }
    }

    /// Drive state of a car, if it is tracked.
    pub fn state(&self, car: CarId) -> Option<DriveState> {
        self.motions.get(&car).map(|m| m.state)
    }

    /// Number of cars currently driving.
    pub fn count_driving(&self) -> usize {
        self.motions
            .values()
            .filter(|m| m.state == DriveState::Driving)
            .count()
    }

    fn sync_with_network(&mut self, network: &RailNetwork) {
        self.motions.retain(|id, _| network.get_car(*id).is_some());
        for id in network.car_ids() {
            self.motions.entry(id).or_insert_with(CarMotion::idle);
        }
    }
}

impl System for DriveSystem {
    fn name(&self) -> &str {
        "drive"
    }

    fn init(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        self.sync_with_network(ctx.network);
        Ok(())
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        self.sync_with_network(ctx.network);

        let mut removed = Vec::new();
        for id in ctx.network.car_ids() {
            let Some(motion) = self.motions.get_mut(&id) else {
                continue;
            };
            if let DriveState::Dead { since_tick } = motion.state {
                if ctx.tick().saturating_sub(since_tick) >= self.removal_grace_ticks {
                    removed.push(id);
                }
                continue;
            }

            let on_rail = ctx
                .network
                .get_car(id)
                .is_some_and(|c| c.is_on_rail() && !c.is_wrecked());
            if !on_rail {
                motion.state = DriveState::Idle;
                continue;
            }

            match motion.state {
                DriveState::Idle => {
                    if !ctx.coordinator.has_started() || ctx.is_paused() {
                        continue;
                    }
                    start_driving(ctx, id, motion)?;
                }
                DriveState::Driving => {
                    if ctx.is_paused() {
                        pause_driving(ctx, id, motion);
                        continue;
                    }
                }
                DriveState::PausedMidDrive => {
                    if ctx.is_paused() {
                        continue;
                    }
                    start_driving(ctx, id, motion)?;
                }
                DriveState::Dead { .. } => continue,
            }
            drive(ctx, id, motion)?;
        }

        for id in removed {
            let name = ctx.network.car_name(id);
            ctx.network.remove_car(id)?;
            self.motions.remove(&id);
            log::debug!("removed wrecked car {name}");
            ctx.emit(
                SimEventKind::CarRemoved { car: id },
                format!("{name} was removed"),
            );
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

fn start_driving(ctx: &mut SimContext<'_>, id: CarId, motion: &mut CarMotion) -> SimResult<()> {
    motion.state = DriveState::Driving;
    begin_span(ctx.network, id, motion)?;
    ctx.emit(
        SimEventKind::CarStartedDriving { car: id },
        format!("{} started driving", ctx.network.car_name(id)),
    );
    Ok(())
}

fn pause_driving(ctx: &mut SimContext<'_>, id: CarId, motion: &mut CarMotion) {
    motion.state = DriveState::PausedMidDrive;
    ctx.emit(
        SimEventKind::CarPausedDriving { car: id },
        format!("{} paused", ctx.network.car_name(id)),
    );
}

/// Restart facing interpolation from the car's current pose.
fn begin_span(network: &RailNetwork, id: CarId, motion: &mut CarMotion) -> SimResult<()> {
    let car = network.get_car(id).ok_or(RailError::CarNotFound(id))?;
    let Some(placement) = car.placement() else {
        return Ok(());
    };
    let target = target_of(network, placement)?;
    motion.span_start_facing = car.facing();
    motion.span_length = car.position().distance(target.position);
    Ok(())
}

fn target_of(network: &RailNetwork, placement: Placement) -> SimResult<Waypoint> {
    let waypoint = network
        .get_segment(placement.segment)
        .ok_or(RailError::SegmentNotFound(placement.segment))?
        .waypoint(placement.index)
        .copied()
        .ok_or(RailError::IndexOutOfRange {
            segment: placement.segment,
            index: placement.index,
        })?;
    Ok(waypoint)
}

/// Step past every waypoint the car is sitting on, then move toward the next.
fn drive(ctx: &mut SimContext<'_>, id: CarId, motion: &mut CarMotion) -> SimResult<()> {
    for _ in 0..MAX_STEPS_PER_TICK {
        let car = ctx.network.get_car(id).ok_or(RailError::CarNotFound(id))?;
        let Some(placement) = car.placement() else {
            motion.state = DriveState::Idle;
            return Ok(());
        };
        if car.position() != target_of(ctx.network, placement)?.position {
            break;
        }

        match traversal::advance(ctx.network, placement)? {
            Step::DeadEnd { at } => {
                ctx.network.wreck(id)?;
                motion.state = DriveState::Dead {
                    since_tick: ctx.tick(),
                };
                let name = ctx.network.car_name(id);
                log::info!("{name} ran off the end of {}", ctx.network.segment_name(at));
                ctx.emit(
                    SimEventKind::CarDied {
                        car: id,
                        segment: at,
                    },
                    format!("{name} derailed at {}", ctx.network.segment_name(at)),
                );
                return Ok(());
            }
            Step::Advanced {
                placement: next,
                events,
            } => {
                ctx.network.commit(id, next)?;
                begin_span(ctx.network, id, motion)?;
                for event in events {
                    match event {
                        StepEvent::SegmentChanged { to, .. } => {
                            ctx.emit(
                                SimEventKind::SegmentEntered {
                                    car: id,
                                    segment: to,
                                },
                                format!(
                                    "{} entered {}",
                                    ctx.network.car_name(id),
                                    ctx.network.segment_name(to)
                                ),
                            );
                        }
                        StepEvent::CheckpointReached(segment) => {
                            ctx.reach_checkpoint(segment, id);
                        }
                    }
                }
                if ctx.is_paused() {
                    pause_driving(ctx, id, motion);
                    return Ok(());
                }
            }
        }
    }

    let reach = ctx.coordinator.speed() * ctx.clock.seconds_per_tick() as f32;
    let car = ctx.network.get_car(id).ok_or(RailError::CarNotFound(id))?;
    let Some(placement) = car.placement() else {
        return Ok(());
    };
    let target = target_of(ctx.network, placement)?;
    let position = move_towards(car.position(), target.position, reach);

    let covered = if motion.span_length > 0.0 {
        (1.0 - position.distance(target.position) / motion.span_length).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let goal = placement.direction.sign() * target.forward;
    let facing = motion.span_start_facing.lerp(goal, covered).normalize_or_zero();

    if let Some(car) = ctx.network.get_car_mut(id) {
        car.set_transform(position, facing);
    }
    Ok(())
}

/// Move `current` up to `max_delta` toward `target`, landing exactly on it
/// when within reach.
fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance == 0.0 {
        target
    } else {
        current + delta / distance * max_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::simulation::Simulation;
    use uc_core::car::TrainCar;
    use uc_core::rail::RailSegment;
    use uc_core::track::TrackFile;

    /// A started simulation on a straight line with cars `engine`, `wagon1`, ...
    fn running(segments: usize, cars: usize) -> Simulation {
        let network = TrackFile::straight_line("Line", segments, 5, cars)
            .build()
            .unwrap();
        let config = SimConfig::default().with_initial_delay(0.0);
        let mut sim = Simulation::standard(network, config).unwrap();
        sim.start(0.0);
        sim.run(250).unwrap();
        assert!(sim.coordinator().has_started());
        sim
    }

    fn car(sim: &Simulation, name: &str) -> CarId {
        sim.network().car_by_name(name).unwrap().id
    }

    fn drive_state(sim: &Simulation, name: &str) -> Option<DriveState> {
        sim.get_system::<DriveSystem>()
            .unwrap()
            .state(car(sim, name))
    }

    #[test]
    fn move_towards_snaps_when_within_reach() {
        let p = move_towards(Vec3::ZERO, Vec3::X, 0.25);
        assert!((p.x - 0.25).abs() < 1e-6);
        assert_eq!(move_towards(Vec3::new(0.9, 0.0, 0.0), Vec3::X, 0.25), Vec3::X);
        assert_eq!(move_towards(Vec3::X, Vec3::X, 0.0), Vec3::X);
    }

    #[test]
    fn cars_wait_for_countdown() {
        let network = TrackFile::straight_line("Line", 3, 5, 1).build().unwrap();
        let mut sim = Simulation::standard(network, SimConfig::default()).unwrap();
        let engine = car(&sim, "engine");
        let start = sim.network().get_car(engine).unwrap().position();

        sim.start(8.0);
        sim.run(399).unwrap();
        assert_eq!(sim.network().get_car(engine).unwrap().position(), start);
        assert_eq!(drive_state(&sim, "engine"), Some(DriveState::Idle));

        sim.run(1).unwrap();
        assert_eq!(drive_state(&sim, "engine"), Some(DriveState::Driving));
        assert_ne!(sim.network().get_car(engine).unwrap().position(), start);
    }

    #[test]
    fn car_moves_at_coordinator_speed() {
        let mut sim = running(3, 1);
        let engine = car(&sim, "engine");
        let before = sim.network().get_car(engine).unwrap().position();
        sim.run(10).unwrap();
        let after = sim.network().get_car(engine).unwrap().position();
        // 0.05 units/s for 10 ticks of 0.02s, along a straight line.
        assert!((after.distance(before) - 0.01).abs() < 1e-4);
    }

    #[test]
    fn straight_segment_walks_waypoints_then_hands_off() {
        let mut sim = running(3, 1);
        let engine = car(&sim, "engine");
        let spawn = sim.network().get_car(engine).unwrap().segment().unwrap();

        let mut visited = vec![sim.network().get_car(engine).unwrap().placement().unwrap().index];
        while sim.network().get_car(engine).unwrap().segment() == Some(spawn) {
            sim.tick().unwrap();
            if let Some(p) = sim.network().get_car(engine).unwrap().placement() {
                if p.segment == spawn && visited.last() != Some(&p.index) {
                    visited.push(p.index);
                }
            }
        }
        assert_eq!(visited, vec![2, 3, 4]);

        let entered: Vec<_> = sim
            .events()
            .events_for_car(engine)
            .into_iter()
            .filter(|e| matches!(e.kind, SimEventKind::SegmentEntered { .. }))
            .collect();
        assert_eq!(entered.len(), 1);
        let placement = sim.network().get_car(engine).unwrap().placement().unwrap();
        assert_eq!(placement.index, 0);
    }

    #[test]
    fn pause_freezes_every_car_on_the_next_tick() {
        let mut sim = running(4, 2);
        let frozen: Vec<Vec3> = sim.network().cars().map(|c| c.position()).collect();
        sim.pause();
        sim.tick().unwrap();
        let next: Vec<Vec3> = sim.network().cars().map(|c| c.position()).collect();
        assert_eq!(frozen, next);
        assert_eq!(drive_state(&sim, "engine"), Some(DriveState::PausedMidDrive));
        assert_eq!(drive_state(&sim, "wagon1"), Some(DriveState::PausedMidDrive));

        sim.run(100).unwrap();
        let later: Vec<Vec3> = sim.network().cars().map(|c| c.position()).collect();
        assert_eq!(frozen, later);
    }

    #[test]
    fn checkpoint_pauses_following_car_in_same_tick() {
        // Engine on r1, wagon on r0; only r2 carries the checkpoint.
        let mut sim = running(3, 2);
        let wagon = car(&sim, "wagon1");
        assert!(!sim.coordinator().is_editing());
        assert_eq!(drive_state(&sim, "wagon1"), Some(DriveState::Driving));

        let mut hit = false;
        for _ in 0..5_000 {
            let before = sim.network().get_car(wagon).unwrap().position();
            sim.tick().unwrap();
            if sim.coordinator().is_editing() {
                assert_eq!(sim.network().get_car(wagon).unwrap().position(), before);
                assert_eq!(drive_state(&sim, "wagon1"), Some(DriveState::PausedMidDrive));
                let tick = sim.current_tick();
                let paused_now = sim
                    .events()
                    .events_at_tick(tick)
                    .iter()
                    .any(|e| e.kind == SimEventKind::CarPausedDriving { car: wagon });
                assert!(paused_now);
                hit = true;
                break;
            }
        }
        assert!(hit, "engine never reached the checkpoint");
    }

    #[test]
    fn resume_restarts_and_moves_same_tick() {
        let mut sim = running(3, 1);
        let engine = car(&sim, "engine");
        sim.pause();
        sim.run(5).unwrap();
        let before = sim.network().get_car(engine).unwrap().position();
        sim.resume();
        sim.tick().unwrap();

        let tick = sim.current_tick();
        let restarted = sim
            .events()
            .events_at_tick(tick)
            .iter()
            .any(|e| e.kind == SimEventKind::CarStartedDriving { car: engine });
        assert!(restarted);
        assert_ne!(sim.network().get_car(engine).unwrap().position(), before);
    }

    #[test]
    fn facing_stays_unit_length() {
        let mut sim = running(3, 1);
        let engine = car(&sim, "engine");
        for _ in 0..200 {
            sim.tick().unwrap();
            let facing = sim.network().get_car(engine).unwrap().facing();
            assert!((facing.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn dead_end_wrecks_then_removes() {
        let network = TrackFile::straight_line("Short", 1, 5, 1).build().unwrap();
        let config = SimConfig::default()
            .with_initial_delay(0.0)
            .with_speed(crate::config::SpeedConfig {
                base: 5.0,
                ..Default::default()
            });
        let mut sim = Simulation::standard(network, config).unwrap();
        let engine = car(&sim, "engine");
        // Never reach the checkpoint: it would pause the world.
        let seg = sim.network().get_car(engine).unwrap().segment().unwrap();
        sim.network_mut().get_segment_mut(seg).unwrap().final_checkpoint = false;

        sim.start(0.0);
        let mut died_at = None;
        for _ in 0..400 {
            sim.tick().unwrap();
            if died_at.is_none() && sim.network().get_car(engine).is_some_and(|c| c.is_wrecked()) {
                died_at = Some(sim.current_tick());
                assert!(!sim.network().get_car(engine).unwrap().is_on_rail());
                assert_eq!(sim.network().occupant(seg), None);
            }
            if sim.network().get_car(engine).is_none() {
                break;
            }
        }
        let died_at = died_at.expect("car should have died");
        assert!(sim.network().get_car(engine).is_none());

        let kinds: Vec<_> = sim
            .events()
            .events_for_car(engine)
            .into_iter()
            .map(|e| (e.tick, e.kind.clone()))
            .collect();
        assert!(kinds.contains(&(died_at, SimEventKind::CarDied { car: engine, segment: seg })));
        assert!(kinds.contains(&(died_at + 2, SimEventKind::CarRemoved { car: engine })));
    }

    #[test]
    fn derailment_leaves_other_line_driving() {
        let mut net = RailNetwork::new("Split");
        let spur_start = Vec3::new(0.0, 0.0, 5.0);
        let spur_path = Waypoint::span(spur_start, spur_start + Vec3::X, 5);
        let spur = net.add_segment(RailSegment::straight("spur", spur_path).unwrap()).unwrap();
        let mut main = Vec::new();
        for i in 0..3 {
            let start = Vec3::new(i as f32, 0.0, 0.0);
            let path = Waypoint::span(start, start + Vec3::X, 5);
            let seg = RailSegment::straight(format!("main{i}"), path).unwrap();
            main.push(net.add_segment(seg).unwrap());
        }
        for pair in main.windows(2) {
            net.connect(pair[0], pair[1]).unwrap();
        }
        let doomed = net.add_car(TrainCar::new("doomed")).unwrap();
        let runner = net.add_car(TrainCar::new("runner")).unwrap();
        net.attach(doomed, spur, false).unwrap();
        net.attach(runner, main[0], false).unwrap();

        let config = SimConfig::default().with_speed(crate::config::SpeedConfig {
            base: 0.5,
            ..Default::default()
        });
        let mut sim = Simulation::standard(net, config).unwrap();
        sim.start(0.0);
        sim.run(250).unwrap();
        assert!(sim.coordinator().has_started());

        let mut last = sim.network().get_car(runner).unwrap().position();
        let mut died_at = None;
        let mut removed_at = None;
        for _ in 0..100 {
            sim.tick().unwrap();
            let pos = sim.network().get_car(runner).unwrap().position();
            assert_ne!(pos, last);
            last = pos;
            assert_eq!(drive_state(&sim, "runner"), Some(DriveState::Driving));

            match sim.network().get_car(doomed) {
                Some(c) if c.is_wrecked() && died_at.is_none() => {
                    died_at = Some(sim.current_tick());
                }
                None if removed_at.is_none() => removed_at = Some(sim.current_tick()),
                _ => {}
            }
        }
        let died_at = died_at.expect("spur car should derail");
        assert_eq!(removed_at, Some(died_at + 2));
        assert_eq!(sim.network().occupant(spur), None);
        assert_eq!(sim.get_system::<DriveSystem>().unwrap().count_driving(), 1);
    }

    #[test]
    fn lead_car_counts_checkpoint_every_lap() {
        let mut net = RailNetwork::new("Loop");
        let mut ring = Vec::new();
        for i in 0..3 {
            let start = Vec3::new(i as f32, 0.0, 0.0);
            let path = Waypoint::span(start, start + Vec3::X, 5);
            let seg = RailSegment::straight(format!("loop{i}"), path).unwrap();
            ring.push(net.add_segment(seg).unwrap());
        }
        for i in 0..3 {
            net.connect(ring[i], ring[(i + 1) % 3]).unwrap();
        }
        net.get_segment_mut(ring[2]).unwrap().final_checkpoint = true;
        let engine = net.add_car(TrainCar::new("engine")).unwrap();
        let wagon = net.add_car(TrainCar::new("wagon1")).unwrap();
        net.attach(engine, ring[1], false).unwrap();
        net.attach(wagon, ring[0], false).unwrap();

        let config = SimConfig::default().with_speed(crate::config::SpeedConfig {
            base: 1.0,
            increment: 0.0,
            ..Default::default()
        });
        let mut sim = Simulation::standard(net, config).unwrap();
        sim.start(0.0);
        for _ in 0..3_000 {
            sim.tick().unwrap();
            if sim.coordinator().is_editing() {
                sim.continue_from_checkpoint().unwrap();
            }
        }

        // A lap is 5.6 units, so about ten laps at 1.0/s.
        let count = sim.coordinator().checkpoint_count();
        assert!((5..=12).contains(&count), "count was {count}");
        let entered = sim
            .events()
            .events()
            .iter()
            .filter(|e| matches!(e.kind, SimEventKind::CheckpointEntered { .. }))
            .count();
        assert_eq!(entered, count as usize);
    }

    #[test]
    fn checkpoint_pauses_reaching_car_immediately() {
        // The engine starts on the final segment and crosses its checkpoint.
        let mut sim = running(1, 1);
        let engine = car(&sim, "engine");
        for _ in 0..2_000 {
            sim.tick().unwrap();
            if sim.coordinator().is_editing() {
                break;
            }
        }
        assert!(sim.coordinator().is_editing());
        assert_eq!(sim.coordinator().checkpoint_count(), 1);
        assert_eq!(drive_state(&sim, "engine"), Some(DriveState::PausedMidDrive));

        let p = sim.network().get_car(engine).unwrap().placement().unwrap();
        assert_eq!(p.index, 3);
        let held = sim.network().get_car(engine).unwrap().position();
        sim.run(50).unwrap();
        assert_eq!(sim.network().get_car(engine).unwrap().position(), held);
    }
}
