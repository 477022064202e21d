// Collaborator interfaces and the value types that cross them
mod broker;
mod provider;
mod sim;
mod types;

pub use broker::BrokerGateway;
pub use provider::MarketDataSource;
pub use sim::{PaperBroker, SimMarket};
pub use types::{
    AccountInfo, Exposure, OpenPosition, OrderReceipt, OrderRequest, Quote, SymbolInfo,
};
