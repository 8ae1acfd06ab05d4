use async_trait::async_trait;

use crate::error::ProxyError;
use crate::token_info::TokenInfo;

#[async_trait]
pub trait TokenRetriever: Send + Sync {
    async fn retrieve(&self) -> Result<TokenInfo, ProxyError>;
}
