// Domain layer: models, color mapping, map primitives and ports. No I/O here.

pub mod color;
pub mod map;
pub mod model;
pub mod ports;
