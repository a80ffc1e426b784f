mod snapshot;
mod token_record;
mod window;

pub use snapshot::{AnalyticsSnapshot, MarketSnapshot, PriceChanges};
pub use token_record::TokenRecord;
pub use window::{PerWindow, TimeWindow};
