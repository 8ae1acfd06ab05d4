pub mod refresh_token_retriever;
pub mod token_retriever;
