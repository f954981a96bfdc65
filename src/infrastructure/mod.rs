pub mod screener_client;
pub mod yahoo_client;

pub use screener_client::ScreenerClient;
pub use yahoo_client::{YahooConfig, YahooFinanceClient};
