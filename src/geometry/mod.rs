//! Tower geometry module

mod group;
mod model;
mod position;

pub use group::{ElementGroup, GroupClass, UnknownGroup};
pub use model::{Element, ElementKey, GeometryModel, Node, Section};
pub use position::{Bounds, Position, PositionKey};
