pub mod alert;
pub mod config;
pub mod config_loader;
pub mod dispatch;
pub mod traits;

pub use alert::Alert;
pub use config::{AlertConfig, AppConfig, BybitConfig, CoinGeckoConfig, PushbulletConfig};
pub use config_loader::ConfigLoader;
pub use dispatch::AlertDispatcher;
pub use traits::AlertSink;
