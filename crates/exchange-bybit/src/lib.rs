pub mod client;
pub mod websocket;

pub use client::{BybitClient, BybitError, FundingRateEntry, Instrument, InstrumentCategory};
pub use websocket::{BybitWebSocket, StreamError};
