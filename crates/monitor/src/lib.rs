pub mod catalog;
pub mod funding;
pub mod liquidations;
pub mod scheduler;
pub mod supervisor;
pub mod variation;

pub use catalog::{MarketCatalog, SymbolUniverse, QUOTE_CURRENCY};
pub use funding::FundingChecker;
pub use liquidations::{
    ConnectionState, LiquidationStream, Side, StreamStats, TradeTick, MAX_CHANNELS_PER_SUBSCRIBE,
};
pub use scheduler::PollingScheduler;
pub use supervisor::{ReconnectSupervisor, StreamSession};
pub use variation::VariationChecker;
