mod calculator;
mod provider;
mod value_objects;

pub use calculator::{minutes_elapsed_equivalent, project, MINUTES_PER_DAY};
pub use provider::IndicatorProvider;
pub use value_objects::ForecastResult;
