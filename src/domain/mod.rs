// Domain types and value objects
mod candle;
mod session;
mod side;
mod timeframe;

// Re-export commonly used types
pub use candle::Candle;
pub use session::{TradingSession, VolatilityLevel};
pub use side::{OrderSide, SignalAction};
pub use timeframe::Timeframe;
