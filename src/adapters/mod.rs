// Adapters layer: concrete implementations of the domain ports (HTTP backend, console map/display).

pub mod console;
pub mod http;
