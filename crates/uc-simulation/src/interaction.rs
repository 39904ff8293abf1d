//! Held items, interaction targets, and what happens when one meets the other.

use uc_core::car::CarId;
use uc_core::terrain::{BreakableTile, HitOutcome};

/// A water bucket used to put out fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Charges of water left.
    pub charges: u32,
    /// Charges held when full.
    pub capacity: u32,
}

impl Bucket {
    /// A full bucket holding `capacity` charges.
    pub fn full(capacity: u32) -> Self {
        Self {
            charges: capacity,
            capacity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.charges == 0
    }

    /// Spend one charge. Returns `false` if the bucket is empty.
    pub fn try_use(&mut self) -> bool {
        if self.charges == 0 {
            return false;
        }
        self.charges -= 1;
        true
    }

    pub fn refill(&mut self) {
        self.charges = self.capacity;
    }
}

/// A tool that breaks terrain tiles carrying a matching code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakTool {
    /// Tile code this tool works on.
    pub code: String,
    /// Levels of damage per hit.
    pub tier: usize,
}

impl BreakTool {
    pub fn new(code: impl Into<String>, tier: usize) -> Self {
        Self {
            code: code.into(),
            tier: tier.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    Bucket(Bucket),
    Breaker(BreakTool),
}

/// A pile of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupStack {
    pub resource: String,
    pub amount: u32,
}

impl PickupStack {
    pub fn new(resource: impl Into<String>, amount: u32) -> Self {
        Self {
            resource: resource.into(),
            amount,
        }
    }
}

/// Everything a player can hold or aim at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Tool(Tool),
    PickupStack(PickupStack),
    Car(CarId),
    Terrain(BreakableTile),
}

/// What an item can do, resolved once from its kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Can be picked up with an empty hand.
    pub pick_up: bool,
    /// Needs both hands to carry.
    pub two_handed: bool,
    /// Acts on targets when held.
    pub tool: bool,
    /// Merges with stacks of the same resource.
    pub stackable: bool,
    /// Can be aimed at.
    pub target: bool,
}

impl Capabilities {
    pub fn of(kind: &ItemKind) -> Self {
        match kind {
            ItemKind::Tool(_) => Self {
                pick_up: true,
                tool: true,
                ..Self::default()
            },
            ItemKind::PickupStack(_) => Self {
                pick_up: true,
                stackable: true,
                target: true,
                ..Self::default()
            },
            ItemKind::Car(_) => Self {
                pick_up: true,
                two_handed: true,
                target: true,
                ..Self::default()
            },
            ItemKind::Terrain(_) => Self {
                target: true,
                ..Self::default()
            },
        }
    }
}

/// An item together with its resolved capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub(crate) kind: ItemKind,
    caps: Capabilities,
}

impl Item {
    pub fn new(kind: ItemKind) -> Self {
        let caps = Capabilities::of(&kind);
        Self { kind, caps }
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }
}

/// Outcome of [`Simulation::interact`](crate::Simulation::interact).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// The target was picked up.
    PickedUp {
        /// Whether it occupies both hands.
        two_handed: bool,
    },
    /// A burning car was put out.
    Extinguished(CarId),
    /// A terrain tile took a hit.
    Hit(HitOutcome),
    /// The held stack was merged into the target.
    Stacked {
        /// Amount in the target stack afterwards.
        amount: u32,
    },
    /// Nothing happened.
    Rejected,
}

/// Strike a tile with a break tool, if the tool fits it.
pub(crate) fn strike(tool: &BreakTool, tile: &mut BreakableTile) -> Option<HitOutcome> {
    if !tile.accepts(&tool.code) {
        return None;
    }
    Some(tile.take_hit(tool.tier))
}

/// Pour `held` onto `target` when both hold the same resource.
pub(crate) fn merge(held: &mut PickupStack, target: &mut PickupStack) -> Option<u32> {
    if held.resource != target.resource {
        return None;
    }
    target.amount = target.amount.saturating_add(held.amount);
    held.amount = 0;
    Some(target.amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rock() -> BreakableTile {
        BreakableTile::new(
            "stone",
            vec!["boulder".into(), "rock".into(), "rubble".into()],
        )
    }

    #[test]
    fn bucket_charges() {
        let mut bucket = Bucket::full(2);
        assert!(bucket.try_use());
        assert!(bucket.try_use());
        assert!(!bucket.try_use());
        assert!(bucket.is_empty());
        bucket.refill();
        assert_eq!(bucket.charges, 2);
    }

    #[test]
    fn capabilities_by_kind() {
        let car = Item::new(ItemKind::Car(CarId::new()));
        assert!(car.capabilities().pick_up);
        assert!(car.capabilities().two_handed);

        let tile = Item::new(ItemKind::Terrain(rock()));
        assert!(!tile.capabilities().pick_up);
        assert!(tile.capabilities().target);

        let bucket = Item::new(ItemKind::Tool(Tool::Bucket(Bucket::full(1))));
        assert!(bucket.capabilities().tool);
        assert!(!bucket.capabilities().target);
    }

    #[test]
    fn strike_requires_matching_code() {
        let mut tile = rock();
        assert!(strike(&BreakTool::new("wood", 1), &mut tile).is_none());
        assert_eq!(tile.form(), "boulder");

        let outcome = strike(&BreakTool::new("stone", 1), &mut tile).unwrap();
        assert_eq!(outcome.form, "rock");
    }

    #[test]
    fn merge_same_resource_only() {
        let mut held = PickupStack::new("coal", 3);
        let mut other = PickupStack::new("wood", 1);
        assert_eq!(merge(&mut held, &mut other), None);
        assert_eq!(held.amount, 3);

        let mut pile = PickupStack::new("coal", 2);
        assert_eq!(merge(&mut held, &mut pile), Some(5));
        assert_eq!(held.amount, 0);
    }

    #[test]
    fn merge_saturates_at_capacity() {
        let mut held = PickupStack::new("coal", 10);
        let mut pile = PickupStack::new("coal", u32::MAX - 1);
        assert_eq!(merge(&mut held, &mut pile), Some(u32::MAX));
        assert_eq!(held.amount, 0);
    }
}
