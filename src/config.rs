//! Runtime configuration
//!
//! Endpoints come from the environment (`TOWER_API_URL`,
//! `TOWER_API_TIMEOUT_SECS`, `HOST`, `PORT`); scene styling and group layouts
//! are plain structs with sensible defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::geometry::{ElementGroup, GroupClass};
use crate::input::CrossSection;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Base URL of the calculator service
    pub api_url: String,
    pub timeout_secs: u64,
    /// Bind address of the demo calculator server
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub style: SceneStyle,
    #[serde(default)]
    pub layouts: LayoutTable,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            host: "0.0.0.0".to_string(),
            port: 5000,
            style: SceneStyle::default(),
            layouts: LayoutTable::default(),
        }
    }
}

impl ViewerConfig {
    /// Defaults overridden by whatever is set in the environment.
    /// Unparseable numbers fall back to the default with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("TOWER_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup("TOWER_API_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout_secs = secs,
                _ => log::warn!("Ignoring TOWER_API_TIMEOUT_SECS={}, using {}s", raw, config.timeout_secs),
            }
        }
        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(raw) = lookup("PORT") {
            match raw.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => log::warn!("Ignoring PORT={}, using {}", raw, config.port),
            }
        }
        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// How members are drawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MemberShape {
    Line,
    Cylinder { radius: f64 },
}

/// Colours and sizes used by the scene composer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneStyle {
    /// Two-colour cycle indexed by section parity (even, odd)
    pub section_colors: [String; 2],
    pub node_color: String,
    pub highlight_color: String,
    pub node_radius: f64,
    pub member_shape: MemberShape,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            section_colors: ["#ff0000".to_string(), "#ffffff".to_string()],
            node_color: "#ff0000".to_string(),
            highlight_color: "#ffd400".to_string(),
            node_radius: 0.06,
            member_shape: MemberShape::Cylinder { radius: 0.02 },
        }
    }
}

/// Number of assignable slots per group class.
///
/// A count of 1 gives a single unindexed slot (`M`); a larger count gives
/// indexed slots (`M1..Mn`) filled round-robin by member order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLayout {
    pub legs: u8,
    pub diagonals: u8,
    pub horizontals: u8,
}

impl GroupLayout {
    pub fn new(legs: u8, diagonals: u8, horizontals: u8) -> Self {
        Self {
            legs,
            diagonals,
            horizontals,
        }
    }

    /// One slot per member of a square panel: M1-M4, D1-D4, C1-C2
    pub fn indexed_square() -> Self {
        Self::new(4, 4, 2)
    }

    /// One slot per class: M, D, C
    pub fn by_class() -> Self {
        Self::new(1, 1, 1)
    }

    pub fn slots(&self, class: GroupClass) -> u8 {
        match class {
            GroupClass::Leg => self.legs,
            GroupClass::Diagonal => self.diagonals,
            GroupClass::Horizontal => self.horizontals,
        }
    }

    /// Slot for the `ordinal`-th (0-based) member of `class` in a section
    pub fn slot(&self, class: GroupClass, ordinal: usize) -> ElementGroup {
        match self.slots(class) {
            0 | 1 => ElementGroup::whole(class),
            n => ElementGroup::new(class, (ordinal % n as usize) as u8 + 1),
        }
    }
}

/// Group layout per cross-section type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutTable {
    pub square: GroupLayout,
    pub triangular: GroupLayout,
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self {
            square: GroupLayout::indexed_square(),
            triangular: GroupLayout::by_class(),
        }
    }
}

impl LayoutTable {
    pub fn for_cross_section(&self, cross_section: CrossSection) -> GroupLayout {
        match cross_section {
            CrossSection::Square => self.square,
            CrossSection::Triangular => self.triangular,
        }
    }
}
