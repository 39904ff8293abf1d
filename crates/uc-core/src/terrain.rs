use serde::{Deserialize, Serialize};

/// Result of hitting a breakable tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitOutcome {
    /// How many tiers the tile dropped.
    pub degraded_by: usize,
    /// The tile's form after the hit.
    pub form: String,
}

impl HitOutcome {
    /// Whether the hit changed anything.
    pub fn changed(&self) -> bool {
        self.degraded_by > 0
    }
}

/// A terrain tile that can be broken down tier by tier (tree → logs, rock →
/// ore). Destruction effects are left to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakableTile {
    /// Tool code that can break this tile, e.g. `"rock"` for a pickaxe.
    pub code: String,
    /// Current form followed by each lower tier. The last form cannot be
    /// broken further.
    pub forms: Vec<String>,
    /// Index of the current form.
    #[serde(default)]
    pub level: usize,
    /// Unmineable tiles reject every hit.
    #[serde(default)]
    pub unmineable: bool,
}

impl BreakableTile {
    pub fn new(code: impl Into<String>, forms: Vec<String>) -> Self {
        Self {
            code: code.into(),
            forms,
            level: 0,
            unmineable: false,
        }
    }

    pub fn with_unmineable(mut self, unmineable: bool) -> Self {
        self.unmineable = unmineable;
        self
    }

    /// Current form name, empty if the tile has no forms.
    pub fn form(&self) -> &str {
        self.forms.get(self.level).map(String::as_str).unwrap_or("")
    }

    /// Whether the tile can still be degraded.
    pub fn is_breakable(&self) -> bool {
        !self.unmineable && self.level + 1 < self.forms.len()
    }

    /// Whether a tool with `code` is the right tool for this tile.
    pub fn accepts(&self, code: &str) -> bool {
        !self.unmineable && self.code == code
    }

    /// Degrade the tile by up to `hits` tiers, stopping at the lowest. A tile at
    /// its lowest tier is left unchanged.
    pub fn take_hit(&mut self, hits: usize) -> HitOutcome {
        let lowest = self.forms.len().saturating_sub(1);
        let target = if self.unmineable {
            self.level
        } else {
            self.level.saturating_add(hits).min(lowest).max(self.level)
        };
        let degraded_by = target - self.level;
        self.level = target;
        HitOutcome {
            degraded_by,
            form: self.form().to_string(),
        }
    }
}
