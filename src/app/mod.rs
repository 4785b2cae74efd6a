// Application layer: wires configuration to concrete adapters.

pub mod runner;
