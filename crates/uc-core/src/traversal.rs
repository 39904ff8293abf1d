//! The rail traversal step: one waypoint at a time, with handoff between
//! segments. Pure functions over the network; committing a step is up to the
//! caller.

use crate::car::Placement;
use crate::error::{RailError, RailResult};
use crate::network::RailNetwork;
use crate::rail::{RailSegment, SegmentId};

/// Something noteworthy that happened during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// The car arrived at a final-checkpoint segment's trigger waypoint.
    CheckpointReached(SegmentId),
    /// The car left one segment and entered the next.
    SegmentChanged {
        /// The segment the car left.
        from: SegmentId,
        /// The segment the car entered.
        to: SegmentId,
    },
}

/// Result of advancing a placement by one waypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The car has a new placement to move toward.
    Advanced {
        /// Where the car is now headed.
        placement: Placement,
        /// Events produced by this step, in order.
        events: Vec<StepEvent>,
    },
    /// The car ran off the end of `at` with no powered segment to enter.
    DeadEnd {
        /// The last segment the car was on.
        at: SegmentId,
    },
}

/// Placement of a car handed onto `segment`.
pub fn enter(segment: &RailSegment) -> Placement {
    let (index, direction) = segment.entry();
    Placement {
        segment: segment.id,
        index,
        direction,
    }
}

/// Advance `placement` by one waypoint in its direction.
pub fn advance(network: &RailNetwork, placement: Placement) -> RailResult<Step> {
    let segment = network
        .get_segment(placement.segment)
        .ok_or(RailError::SegmentNotFound(placement.segment))?;

    let next_index = placement.index as isize + placement.direction.step();
    if (0..segment.waypoint_count() as isize).contains(&next_index) {
        let index = next_index as usize;
        let mut events = Vec::new();
        if segment.triggers_checkpoint(index, placement.direction) {
            events.push(StepEvent::CheckpointReached(segment.id));
        }
        return Ok(Step::Advanced {
            placement: Placement {
                index,
                ..placement
            },
            events,
        });
    }

    let Some(next) = network.next_powered(segment.id) else {
        return Ok(Step::DeadEnd { at: segment.id });
    };
    let entered = enter(next);
    let mut events = vec![StepEvent::SegmentChanged {
        from: segment.id,
        to: next.id,
    }];
    if next.triggers_checkpoint(entered.index, entered.direction) {
        events.push(StepEvent::CheckpointReached(next.id));
    }
    Ok(Step::Advanced {
        placement: entered,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::TrainCar;
    use crate::rail::{Direction, Orientation, Waypoint};
    use glam::Vec3;
    use proptest::prelude::*;

    fn network(orientations: &[Orientation], waypoints: usize) -> (RailNetwork, Vec<SegmentId>) {
        let mut net = RailNetwork::new("Test");
        let mut ids = Vec::new();
        for (i, orientation) in orientations.iter().enumerate() {
            let start = Vec3::new(i as f32, 0.0, 0.0);
            let seg = RailSegment::new(
                format!("r{i}"),
                *orientation,
                Waypoint::span(start, start + Vec3::X, waypoints),
            )
            .unwrap();
            ids.push(net.add_segment(seg).unwrap());
        }
        for pair in ids.windows(2) {
            net.connect(pair[0], pair[1]).unwrap();
        }
        (net, ids)
    }

    fn at(segment: SegmentId, index: usize, direction: Direction) -> Placement {
        Placement {
            segment,
            index,
            direction,
        }
    }

    #[test]
    fn straight_segment_walks_to_end_then_hands_off() {
        let (net, ids) = network(&[Orientation::Straight, Orientation::Straight], 5);
        let mut p = enter(net.get_segment(ids[0]).unwrap());
        assert_eq!(p, at(ids[0], 0, Direction::Forward));

        for expected in 1..5 {
            match advance(&net, p).unwrap() {
                Step::Advanced { placement, events } => {
                    assert_eq!(placement.index, expected);
                    assert!(events.is_empty());
                    p = placement;
                }
                Step::DeadEnd { .. } => panic!("unexpected dead end"),
            }
        }

        let step = advance(&net, p).unwrap();
        assert_eq!(
            step,
            Step::Advanced {
                placement: at(ids[1], 0, Direction::Forward),
                events: vec![StepEvent::SegmentChanged {
                    from: ids[0],
                    to: ids[1]
                }],
            }
        );
    }

    #[test]
    fn end_of_network_is_dead_end() {
        let (net, ids) = network(&[Orientation::Straight], 5);
        let step = advance(&net, at(ids[0], 4, Direction::Forward)).unwrap();
        assert_eq!(step, Step::DeadEnd { at: ids[0] });
    }

    #[test]
    fn unpowered_next_is_dead_end() {
        let (mut net, ids) = network(&[Orientation::Straight, Orientation::Straight], 5);
        net.get_segment_mut(ids[1]).unwrap().powered = false;
        let step = advance(&net, at(ids[0], 4, Direction::Forward)).unwrap();
        assert_eq!(step, Step::DeadEnd { at: ids[0] });
    }

    #[test]
    fn bent_right_entered_from_last_waypoint() {
        let (net, ids) = network(&[Orientation::Straight, Orientation::BentRight], 5);
        match advance(&net, at(ids[0], 4, Direction::Forward)).unwrap() {
            Step::Advanced { placement, .. } => {
                assert_eq!(placement, at(ids[1], 4, Direction::Backward));
            }
            Step::DeadEnd { .. } => panic!("unexpected dead end"),
        }
    }

    #[test]
    fn bent_right_exits_below_zero() {
        let (net, ids) = network(&[Orientation::BentRight, Orientation::BentLeft], 5);
        match advance(&net, at(ids[0], 0, Direction::Backward)).unwrap() {
            Step::Advanced { placement, .. } => {
                assert_eq!(placement, at(ids[1], 0, Direction::Forward));
            }
            Step::DeadEnd { .. } => panic!("unexpected dead end"),
        }
    }

    #[test]
    fn checkpoint_fires_at_trigger_index_only() {
        let (mut net, ids) = network(&[Orientation::Straight], 5);
        net.get_segment_mut(ids[0]).unwrap().final_checkpoint = true;

        let mut fired = Vec::new();
        let mut p = at(ids[0], 0, Direction::Forward);
        while let Step::Advanced { placement, events } = advance(&net, p).unwrap() {
            if events.contains(&StepEvent::CheckpointReached(ids[0])) {
                fired.push(placement.index);
            }
            p = placement;
        }
        assert_eq!(fired, vec![3]);
    }

    #[test]
    fn backward_pass_does_not_trigger_checkpoint() {
        let (mut net, ids) = network(&[Orientation::Straight], 5);
        net.get_segment_mut(ids[0]).unwrap().final_checkpoint = true;
        match advance(&net, at(ids[0], 4, Direction::Backward)).unwrap() {
            Step::Advanced { placement, events } => {
                assert_eq!(placement.index, 3);
                assert!(events.is_empty());
            }
            Step::DeadEnd { .. } => panic!("unexpected dead end"),
        }
    }

    #[test]
    fn entering_on_trigger_waypoint_fires_checkpoint() {
        // A 3-waypoint bent-right segment is entered at index 2, its trigger.
        let (mut net, ids) = network(&[Orientation::Straight, Orientation::BentRight], 3);
        net.get_segment_mut(ids[1]).unwrap().final_checkpoint = true;
        match advance(&net, at(ids[0], 2, Direction::Forward)).unwrap() {
            Step::Advanced { events, .. } => {
                assert!(events.contains(&StepEvent::CheckpointReached(ids[1])));
            }
            Step::DeadEnd { .. } => panic!("unexpected dead end"),
        }
    }

    #[test]
    fn unknown_segment_is_error() {
        let (net, _) = network(&[Orientation::Straight], 5);
        let err = advance(&net, at(SegmentId::new(), 0, Direction::Forward)).unwrap_err();
        assert!(matches!(err, RailError::SegmentNotFound(_)));
    }

    #[test]
    fn advance_does_not_touch_occupancy() {
        let (mut net, ids) = network(&[Orientation::Straight, Orientation::Straight], 5);
        let car = net.add_car(TrainCar::new("engine")).unwrap();
        net.attach(car, ids[0], false).unwrap();
        let p = at(ids[0], 4, Direction::Forward);
        let _ = advance(&net, p).unwrap();
        assert_eq!(net.occupant(ids[0]), Some(car));
        assert_eq!(net.occupant(ids[1]), None);
    }

    fn orientation() -> impl Strategy<Value = Orientation> {
        prop_oneof![
            Just(Orientation::Straight),
            Just(Orientation::BentLeft),
            Just(Orientation::BentRight),
        ]
    }

    proptest! {
        #[test]
        fn index_moves_by_direction_until_handoff(
            shapes in prop::collection::vec(orientation(), 1..6),
            waypoints in 1usize..8,
        ) {
            let (net, ids) = network(&shapes, waypoints);
            let mut p = enter(net.get_segment(ids[0]).unwrap());
            let mut handoffs = 0;
            loop {
                match advance(&net, p).unwrap() {
                    Step::Advanced { placement, events } => {
                        let changed = events
                            .iter()
                            .any(|e| matches!(e, StepEvent::SegmentChanged { .. }));
                        if changed {
                            handoffs += 1;
                            let seg = net.get_segment(placement.segment).unwrap();
                            let (index, direction) = seg.entry();
                            prop_assert_eq!(placement.index, index);
                            prop_assert_eq!(placement.direction, direction);
                        } else {
                            prop_assert_eq!(placement.segment, p.segment);
                            prop_assert_eq!(
                                placement.index as isize,
                                p.index as isize + p.direction.step()
                            );
                            prop_assert_eq!(placement.direction, p.direction);
                        }
                        p = placement;
                    }
                    Step::DeadEnd { at } => {
                        prop_assert_eq!(at, *ids.last().unwrap());
                        break;
                    }
                }
            }
            prop_assert_eq!(handoffs, shapes.len() - 1);
        }

        #[test]
        fn each_checkpoint_fires_once_per_run(
            shapes in prop::collection::vec(orientation(), 1..6),
            waypoints in 1usize..8,
            flagged in prop::collection::vec(any::<bool>(), 6),
        ) {
            let (mut net, ids) = network(&shapes, waypoints);
            for (id, flag) in ids.iter().zip(&flagged) {
                net.get_segment_mut(*id).unwrap().final_checkpoint = *flag;
            }
            let mut fired: Vec<SegmentId> = Vec::new();
            let first = net.get_segment(ids[0]).unwrap();
            let mut p = enter(first);
            if first.triggers_checkpoint(p.index, p.direction) {
                fired.push(first.id);
            }
            while let Step::Advanced { placement, events } = advance(&net, p).unwrap() {
                for e in events {
                    if let StepEvent::CheckpointReached(seg) = e {
                        fired.push(seg);
                    }
                }
                p = placement;
            }
            let expected: Vec<SegmentId> = ids
                .iter()
                .zip(&flagged)
                .filter(|(_, f)| **f)
                .map(|(id, _)| *id)
                .collect();
            prop_assert_eq!(fired, expected);
        }
    }
}
