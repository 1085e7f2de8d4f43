//! Element groups - the structural role of a member within its section

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Structural role classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupClass {
    /// Leg member (M)
    Leg,
    /// Diagonal bracing (D)
    Diagonal,
    /// Horizontal strut (C)
    Horizontal,
}

impl GroupClass {
    pub fn letter(&self) -> char {
        match self {
            GroupClass::Leg => 'M',
            GroupClass::Diagonal => 'D',
            GroupClass::Horizontal => 'C',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'M' => Some(GroupClass::Leg),
            'D' => Some(GroupClass::Diagonal),
            'C' => Some(GroupClass::Horizontal),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GroupClass::Leg => "Leg",
            GroupClass::Diagonal => "Diagonal",
            GroupClass::Horizontal => "Horizontal",
        }
    }
}

/// One assignable slot: a class plus an optional sub-index (`M`, `M1`, `D3`).
///
/// Serialized as its label string so it can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementGroup {
    pub class: GroupClass,
    pub index: Option<u8>,
}

impl ElementGroup {
    pub fn new(class: GroupClass, index: u8) -> Self {
        Self {
            class,
            index: Some(index),
        }
    }

    /// A single-slot group without a sub-index
    pub fn whole(class: GroupClass) -> Self {
        Self { class, index: None }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ElementGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}{}", self.class.letter(), i),
            None => write!(f, "{}", self.class.letter()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not an element group label")]
pub struct UnknownGroup(pub String);

impl FromStr for ElementGroup {
    type Err = UnknownGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let class = chars
            .next()
            .and_then(GroupClass::from_letter)
            .ok_or_else(|| UnknownGroup(s.to_string()))?;
        let rest = chars.as_str();
        if rest.is_empty() {
            return Ok(Self::whole(class));
        }
        // Only canonical indices: "M01" must not collapse onto "M1"
        if !rest.bytes().all(|b| b.is_ascii_digit()) || rest.starts_with('0') {
            return Err(UnknownGroup(s.to_string()));
        }
        let index = rest.parse::<u8>().map_err(|_| UnknownGroup(s.to_string()))?;
        Ok(Self::new(class, index))
    }
}

impl Serialize for ElementGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ElementGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
