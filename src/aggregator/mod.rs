pub mod aggregator;
pub mod reconcile;

pub use aggregator::{AggregatorOptions, TokenAggregator};
pub use reconcile::reconcile;
