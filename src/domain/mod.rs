// Domain layer: core models and ports (capability traits).

pub mod model;
pub mod ports;
