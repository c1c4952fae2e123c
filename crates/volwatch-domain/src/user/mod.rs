mod aggregate;
mod repository;
mod value_objects;


pub use aggregate::UserRecord;
pub use repository::UserRepository;
pub use value_objects::{BreachKind, ThresholdBreach};
