mod profile;

pub use profile::{ChainKind, ChainProfile, ChainTable, DEFAULT_CHAIN};
