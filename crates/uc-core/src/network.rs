use std::collections::HashMap;

use crate::car::{CarId, CarStatus, Placement, TrainCar};
use crate::error::{RailError, RailResult};
use crate::rail::{RailSegment, SegmentId};

/// Which neighbour of a car an adjacency query looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    /// The car on the segment this car is heading into.
    Ahead,
    /// The car on the segment this car came from.
    Behind,
}

/// The rail network: segments, the cars on them, and who occupies what.
///
/// A car's placement and the occupancy index are only ever changed together,
/// inside [`attach`](Self::attach), [`commit`](Self::commit) and
/// [`detach`](Self::detach).
#[derive(Debug, Clone, Default)]
pub struct RailNetwork {
    pub name: String,
    segments: HashMap<SegmentId, RailSegment>,
    cars: HashMap<CarId, TrainCar>,

    // Indexes
    segment_order: Vec<SegmentId>,
    car_order: Vec<CarId>,
    segment_names: HashMap<String, SegmentId>,
    car_names: HashMap<String, CarId>,
    occupants: HashMap<SegmentId, CarId>,
}

impl RailNetwork {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------------
    // Segments
    // -----------------------------------------------------------------------

    /// Add a segment to the network. Returns the segment's ID.
    pub fn add_segment(&mut self, segment: RailSegment) -> RailResult<SegmentId> {
        let name_lower = segment.name.to_lowercase();
        if self.segment_names.contains_key(&name_lower) {
            return Err(RailError::DuplicateName(segment.name.clone()));
        }
        let id = segment.id;
        self.segment_names.insert(name_lower, id);
        self.segment_order.push(id);
        self.segments.insert(id, segment);
        Ok(id)
    }

    /// Link `from`'s exit to `to`'s entry.
    pub fn connect(&mut self, from: SegmentId, to: SegmentId) -> RailResult<()> {
        if !self.segments.contains_key(&to) {
            return Err(RailError::SegmentNotFound(to));
        }
        self.segments
            .get_mut(&from)
            .ok_or(RailError::SegmentNotFound(from))?
            .next = Some(to);
        if let Some(target) = self.segments.get_mut(&to) {
            target.previous = Some(from);
        }
        Ok(())
    }

    pub fn get_segment(&self, id: SegmentId) -> Option<&RailSegment> {
        self.segments.get(&id)
    }

    /// Mutable access for power and checkpoint flags. Waypoints stay fixed.
    pub fn get_segment_mut(&mut self, id: SegmentId) -> Option<&mut RailSegment> {
        self.segments.get_mut(&id)
    }

    /// Find a segment by name (case-insensitive).
    pub fn segment_by_name(&self, name: &str) -> Option<&RailSegment> {
        self.segment_names
            .get(&name.to_lowercase())
            .and_then(|id| self.segments.get(id))
    }

    /// All segments in insertion order.
    pub fn segments(&self) -> impl Iterator<Item = &RailSegment> {
        self.segment_order
            .iter()
            .filter_map(|id| self.segments.get(id))
    }

    /// The segment after `id`, if it exists and is powered.
    pub fn next_powered(&self, id: SegmentId) -> Option<&RailSegment> {
        self.segments
            .get(&id)?
            .next
            .and_then(|next| self.segments.get(&next))
            .filter(|next| next.powered)
    }

    /// Display name of a segment, or its short ID if unknown.
    pub fn segment_name(&self, id: SegmentId) -> String {
        self.segments
            .get(&id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    // -----------------------------------------------------------------------
    // Cars
    // -----------------------------------------------------------------------

    /// Add an unplaced car. Returns the car's ID.
    pub fn add_car(&mut self, mut car: TrainCar) -> RailResult<CarId> {
        let name_lower = car.name.to_lowercase();
        if self.car_names.contains_key(&name_lower) {
            return Err(RailError::DuplicateName(car.name.clone()));
        }
        car.set_placement(None);
        let id = car.id;
        self.car_names.insert(name_lower, id);
        self.car_order.push(id);
        self.cars.insert(id, car);
        Ok(id)
    }

    pub fn get_car(&self, id: CarId) -> Option<&TrainCar> {
        self.cars.get(&id)
    }

    /// Mutable access to a car's world transform. Placement can only be changed
    /// through the network.
    pub fn get_car_mut(&mut self, id: CarId) -> Option<&mut TrainCar> {
        self.cars.get_mut(&id)
    }

    /// Find a car by name (case-insensitive).
    pub fn car_by_name(&self, name: &str) -> Option<&TrainCar> {
        self.car_names
            .get(&name.to_lowercase())
            .and_then(|id| self.cars.get(id))
    }

    /// All cars in insertion order.
    pub fn cars(&self) -> impl Iterator<Item = &TrainCar> {
        self.car_order.iter().filter_map(|id| self.cars.get(id))
    }

    /// IDs of all cars in insertion order.
    pub fn car_ids(&self) -> Vec<CarId> {
        self.car_order.clone()
    }

    /// Display name of a car, or its short ID if unknown.
    pub fn car_name(&self, id: CarId) -> String {
        self.cars
            .get(&id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Place a car at the middle of `segment`, facing its traversal direction.
    ///
    /// With `connect_check`, the placement fails with [`RailError::Blocked`] if
    /// another blocking car occupies the segment or the one ahead of it. A
    /// failed attach changes nothing.
    pub fn attach(
        &mut self,
        car: CarId,
        segment: SegmentId,
        connect_check: bool,
    ) -> RailResult<Placement> {
        let target = self.cars.get(&car).ok_or(RailError::CarNotFound(car))?;
        if target.is_wrecked() {
            return Err(RailError::CarWrecked(car));
        }
        let seg = self
            .segments
            .get(&segment)
            .ok_or(RailError::SegmentNotFound(segment))?;

        if connect_check {
            let ahead = seg.next.and_then(|next| self.blocking_car_at(next, car));
            if let Some(by) = self.blocking_car_at(segment, car).or(ahead) {
                return Err(RailError::Blocked { car, by });
            }
        }

        let (_, direction) = seg.entry();
        let index = seg.mid_index();
        let waypoint = seg.waypoints()[index];
        let placement = Placement {
            segment,
            index,
            direction,
        };

        self.move_occupant(car, Some(segment));
        if let Some(target) = self.cars.get_mut(&car) {
            target.set_placement(Some(placement));
            target.set_transform(waypoint.position, direction.sign() * waypoint.forward);
        }
        log::debug!("attached car {car} to segment {segment} at waypoint {index}");
        Ok(placement)
    }

    /// Record a traversal step for a car, handing it off to a new segment if
    /// the placement names one.
    pub fn commit(&mut self, car: CarId, placement: Placement) -> RailResult<()> {
        let seg = self
            .segments
            .get(&placement.segment)
            .ok_or(RailError::SegmentNotFound(placement.segment))?;
        if placement.index >= seg.waypoint_count() {
            return Err(RailError::IndexOutOfRange {
                segment: placement.segment,
                index: placement.index,
            });
        }
        let current = self.cars.get(&car).ok_or(RailError::CarNotFound(car))?;
        if current.is_wrecked() {
            return Err(RailError::CarWrecked(car));
        }

        if current.segment() != Some(placement.segment) {
            log::debug!(
                "car {car} handed off from {:?} to {}",
                current.segment().map(|s| s.to_string()),
                placement.segment
            );
            self.move_occupant(car, Some(placement.segment));
        }
        if let Some(current) = self.cars.get_mut(&car) {
            current.set_placement(Some(placement));
        }
        Ok(())
    }

    /// Take a car off the rail. Returns where it was, if anywhere.
    pub fn detach(&mut self, car: CarId) -> RailResult<Option<Placement>> {
        let previous = self
            .cars
            .get(&car)
            .ok_or(RailError::CarNotFound(car))?
            .placement();
        self.move_occupant(car, None);
        if let Some(current) = self.cars.get_mut(&car) {
            current.set_placement(None);
        }
        Ok(previous)
    }

    /// Detach a car and mark it wrecked.
    pub fn wreck(&mut self, car: CarId) -> RailResult<Option<Placement>> {
        let previous = self.detach(car)?;
        if let Some(current) = self.cars.get_mut(&car) {
            current.set_status(CarStatus::Wrecked);
        }
        Ok(previous)
    }

    /// Remove a car from the network entirely.
    pub fn remove_car(&mut self, car: CarId) -> RailResult<TrainCar> {
        self.detach(car)?;
        let removed = self.cars.remove(&car).ok_or(RailError::CarNotFound(car))?;
        self.car_names.remove(&removed.name.to_lowercase());
        self.car_order.retain(|id| *id != car);
        Ok(removed)
    }

    fn move_occupant(&mut self, car: CarId, to: Option<SegmentId>) {
        let from = self.cars.get(&car).and_then(|c| c.segment());
        if let Some(from) = from {
            if self.occupants.get(&from) == Some(&car) {
                self.occupants.remove(&from);
            }
        }
        if let Some(to) = to {
            self.occupants.insert(to, car);
        }
    }

    // -----------------------------------------------------------------------
    // Occupancy queries
    // -----------------------------------------------------------------------

    /// The last car to enter `segment`, if it is still there.
    pub fn occupant(&self, segment: SegmentId) -> Option<CarId> {
        self.occupants
            .get(&segment)
            .copied()
            .filter(|car| {
                self.cars
                    .get(car)
                    .is_some_and(|c| c.segment() == Some(segment))
            })
    }

    /// A car occupying `segment` that would block `except` from being there.
    pub fn blocking_car_at(&self, segment: SegmentId, except: CarId) -> Option<CarId> {
        self.occupant(segment)
            .filter(|car| *car != except)
            .filter(|car| self.cars.get(car).is_some_and(TrainCar::blocks))
    }

    /// The car directly ahead of or behind `car` along the rail.
    pub fn adjacent_car(&self, car: CarId, heading: Heading) -> Option<CarId> {
        let segment = self.cars.get(&car)?.segment()?;
        let seg = self.segments.get(&segment)?;
        let neighbour = match heading {
            Heading::Ahead => seg.next,
            Heading::Behind => seg.previous,
        }?;
        self.blocking_car_at(neighbour, car)
    }

    // -----------------------------------------------------------------------
    // Validation and statistics
    // -----------------------------------------------------------------------

    /// Check that every link and placement refers to an existing segment.
    pub fn validate(&self) -> RailResult<()> {
        for seg in self.segments() {
            for link in [seg.previous, seg.next].into_iter().flatten() {
                if !self.segments.contains_key(&link) {
                    return Err(RailError::SegmentNotFound(link));
                }
            }
            if seg.waypoint_count() == 0 {
                return Err(RailError::EmptySegment(seg.name.clone()));
            }
        }
        for car in self.cars() {
            if let Some(p) = car.placement() {
                let seg = self
                    .segments
                    .get(&p.segment)
                    .ok_or(RailError::SegmentNotFound(p.segment))?;
                if p.index >= seg.waypoint_count() {
                    return Err(RailError::IndexOutOfRange {
                        segment: p.segment,
                        index: p.index,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn car_count(&self) -> usize {
        self.cars.len()
    }
}
