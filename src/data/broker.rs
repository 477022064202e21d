use anyhow::Result;
use async_trait::async_trait;

use crate::data::{AccountInfo, OpenPosition, OrderReceipt, OrderRequest, SymbolInfo};

/// Abstract interface to the broker. The concrete transport (REST, HMAC
/// signing, session handling) lives entirely behind this trait.
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    async fn get_account(&self) -> Result<AccountInfo>;

    async fn get_open_positions(&self) -> Result<Vec<OpenPosition>>;

    /// Lot constraints and pip size for a symbol.
    async fn get_symbol_info(&self, symbol: &str) -> Result<SymbolInfo>;

    async fn place_order(&self, order: OrderRequest) -> Result<OrderReceipt>;

    /// Flattens everything. Returns the positions that were closed.
    async fn close_all_positions(&self) -> Result<Vec<OpenPosition>>;
}
