// Domain layer - Pure business logic
// No dependencies on infrastructure or presentation layers

pub mod forecast;
pub mod notification;
pub mod shared;
pub mod user;

// Re-exports for convenience
pub use shared::{Clock, DomainError, SystemClock, UserId};
