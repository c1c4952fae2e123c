// Application and presentation layers
// Wires domain services to infrastructure adapters

pub mod application;
pub mod presentation;

pub use presentation::state::AppState;
