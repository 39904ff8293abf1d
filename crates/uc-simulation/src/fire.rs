use std::collections::HashMap;

use rand::Rng;
use uc_core::car::CarId;
use uc_core::network::{Heading, RailNetwork};

use crate::config::FireConfig;
use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::interaction::Bucket;
use crate::system::System;

/// Burn progress of a single car.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnState {
    /// Ticks since the car caught fire.
    pub ticks_burning: u64,
    /// Whether this ignition has already spread to the neighbours.
    pub spread: bool,
}

impl BurnState {
    fn new() -> Self {
        Self {
            ticks_burning: 0,
            spread: false,
        }
    }
}

/// Tracks burning cars and spreads fire along the train.
#[derive(Debug)]
pub struct FireSystem {
    config: FireConfig,
    states: HashMap<CarId, BurnState>,
}

impl Default for FireSystem {
    fn default() -> Self {
        Self::new(FireConfig::default())
    }
}

impl FireSystem {
    pub fn new(config: FireConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
        }
    }

    pub fn is_burning(&self, car: CarId) -> bool {
        self.states.contains_key(&car)
    }

    pub fn get_state(&self, car: CarId) -> Option<&BurnState> {
        self.states.get(&car)
    }

    /// IDs of every burning car.
    pub fn burning(&self) -> impl Iterator<Item = CarId> + '_ {
        self.states.keys().copied()
    }

    /// Set a car on fire. Returns `false` if it is already burning, wrecked,
    /// or not in the network.
    pub fn ignite(&mut self, network: &RailNetwork, car: CarId) -> bool {
        let can_burn = network.get_car(car).is_some_and(|c| !c.is_wrecked());
        if !can_burn || self.states.contains_key(&car) {
            return false;
        }
        self.states.insert(car, BurnState::new());
        true
    }

    /// Put out a burning car using one charge from `bucket`.
    ///
    /// A car that is not burning leaves the bucket untouched.
    pub fn extinguish(&mut self, car: CarId, bucket: &mut Bucket) -> bool {
        if !self.states.contains_key(&car) || !bucket.try_use() {
            return false;
        }
        self.states.remove(&car);
        true
    }

    /// Drop a car's burn state without spending water.
    pub fn cancel(&mut self, car: CarId) {
        self.states.remove(&car);
    }
}

impl System for FireSystem {
    fn name(&self) -> &str {
        "fire"
    }

    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let network = &*ctx.network;
        self.states
            .retain(|id, _| network.get_car(*id).is_some_and(|c| !c.is_wrecked()));

        let delay = ctx.ticks_for(self.config.ignite_delay_secs);
        let mut ignitions: Vec<(CarId, Option<CarId>)> = Vec::new();

        for id in ctx.network.car_ids() {
            let Some(state) = self.states.get_mut(&id) else {
                continue;
            };
            state.ticks_burning += 1;
            if state.spread || state.ticks_burning < delay {
                continue;
            }
            state.spread = true;

            let on_rail = ctx.network.get_car(id).is_some_and(|c| c.is_on_rail());
            if !on_rail {
                continue;
            }
            for heading in [Heading::Ahead, Heading::Behind] {
                let Some(neighbour) = ctx.network.adjacent_car(id, heading) else {
                    continue;
                };
                let already = self.states.contains_key(&neighbour)
                    || ignitions.iter().any(|(car, _)| *car == neighbour);
                if !already {
                    ignitions.push((neighbour, Some(id)));
                }
            }
        }

        if self.config.spontaneous_chance > 0.0 {
            for id in ctx.network.car_ids() {
                let eligible = ctx
                    .network
                    .get_car(id)
                    .is_some_and(|c| c.is_on_rail() && !c.is_wrecked());
                let already = self.states.contains_key(&id)
                    || ignitions.iter().any(|(car, _)| *car == id);
                if eligible && !already && ctx.rng.random_bool(self.config.spontaneous_chance) {
                    ignitions.push((id, None));
                }
            }
        }

        for (car, source) in ignitions {
            self.states.insert(car, BurnState::new());
            let name = ctx.network.car_name(car);
            let description = match source {
                Some(from) => format!("{name} caught fire from {}", ctx.network.car_name(from)),
                None => format!("{name} caught fire"),
            };
            log::info!("{description}");
            ctx.emit(SimEventKind::CarIgnited { car, source }, description);
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
