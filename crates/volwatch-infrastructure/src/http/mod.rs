mod blockchair;

pub use blockchair::{BlockchairProvider, IndicatorError, SATOSHI_PER_BTC};
