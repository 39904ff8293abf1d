//! Authored track files: a JSON description of segments and cars that builds
//! into a [`RailNetwork`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::car::TrainCar;
use crate::error::{RailError, RailResult};
use crate::network::RailNetwork;
use crate::rail::{Orientation, RailSegment, Waypoint};

/// A whole track: the rail layout and the cars that start on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFile {
    /// Name of the track.
    pub name: String,
    /// Segments, in authoring order. Links refer to segments by name.
    #[serde(default)]
    pub segments: Vec<SegmentSpec>,
    /// Cars, in the order they are processed each tick.
    #[serde(default)]
    pub cars: Vec<CarSpec>,
}

/// One authored rail segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    /// Unique segment name.
    pub name: String,
    /// Segment shape.
    #[serde(default)]
    pub orientation: Orientation,
    /// Whether cars may enter. Defaults to `true`.
    #[serde(default = "default_powered")]
    pub powered: bool,
    /// Whether this segment holds the final checkpoint.
    #[serde(default)]
    pub final_checkpoint: bool,
    /// The segment's internal path.
    pub waypoints: Vec<Waypoint>,
    /// Name of the segment this one leads into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Name of the segment this one is entered from, when it differs from
    /// what `next` links imply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

/// One authored train car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarSpec {
    /// Unique car name.
    pub name: String,
    /// Upgrade tier. Defaults to 1.
    #[serde(default = "default_tier")]
    pub tier: u32,
    /// Whether the car is permeable.
    #[serde(default)]
    pub permeable: bool,
    /// Name of the segment the car starts on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rail: Option<String>,
}

fn default_powered() -> bool {
    true
}

fn default_tier() -> u32 {
    1
}

impl TrackFile {
    /// Parse a track file from JSON text.
    pub fn from_json(text: &str) -> RailResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize the track file as pretty-printed JSON.
    pub fn to_json(&self) -> RailResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolve names and build the network. Cars with a start rail are
    /// attached without a connectivity check.
    pub fn build(&self) -> RailResult<RailNetwork> {
        let mut network = RailNetwork::new(&self.name);

        for spec in &self.segments {
            let segment = RailSegment::new(&spec.name, spec.orientation, spec.waypoints.clone())?
                .with_powered(spec.powered)
                .with_final_checkpoint(spec.final_checkpoint);
            network.add_segment(segment)?;
        }

        let resolve = |network: &RailNetwork, name: &str| {
            network
                .segment_by_name(name)
                .map(|s| s.id)
                .ok_or_else(|| RailError::UnknownReference {
                    kind: "segment",
                    name: name.to_string(),
                })
        };

        for spec in &self.segments {
            if let Some(next) = &spec.next {
                let from = resolve(&network, &spec.name)?;
                let to = resolve(&network, next)?;
                network.connect(from, to)?;
            }
        }
        for spec in &self.segments {
            if let Some(previous) = &spec.previous {
                let id = resolve(&network, &spec.name)?;
                let previous = resolve(&network, previous)?;
                if let Some(segment) = network.get_segment_mut(id) {
                    segment.previous = Some(previous);
                }
            }
        }

        for spec in &self.cars {
            let car = TrainCar::new(&spec.name)
                .with_tier(spec.tier)
                .with_permeable(spec.permeable);
            let id = network.add_car(car)?;
            if let Some(rail) = &spec.rail {
                let segment = resolve(&network, rail)?;
                network.attach(id, segment, false)?;
            }
        }

        network.validate()?;
        Ok(network)
    }

    /// A straight track of `segments` unit-length pieces running along +X,
    /// ending in a final checkpoint. The engine starts on segment
    /// `cars - 1` with each wagon one segment behind it.
    pub fn straight_line(
        name: impl Into<String>,
        segments: usize,
        waypoints_per_segment: usize,
        cars: usize,
    ) -> Self {
        let segments = segments.max(1);
        let names: Vec<String> = (0..segments).map(|i| format!("r{i}")).collect();
        let segment_specs = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let start = Vec3::new(i as f32, 0.0, 0.0);
                SegmentSpec {
                    name: name.clone(),
                    orientation: Orientation::Straight,
                    powered: true,
                    final_checkpoint: i + 1 == segments,
                    waypoints: Waypoint::span(start, start + Vec3::X, waypoints_per_segment.max(1)),
                    next: names.get(i + 1).cloned(),
                    previous: None,
                }
            })
            .collect();

        let cars = cars.min(segments);
        let car_specs = (0..cars)
            .map(|k| CarSpec {
                name: if k == 0 {
                    "engine".to_string()
                } else {
                    format!("wagon{k}")
                },
                tier: 1,
                permeable: false,
                rail: Some(names[cars - 1 - k].clone()),
            })
            .collect();

        Self {
            name: name.into(),
            segments: segment_specs,
            cars: car_specs,
        }
    }
}
