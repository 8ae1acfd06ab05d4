use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use oauth2::AccessToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::error::ProxyError;
use crate::retrievers::token_retriever::TokenRetriever;
use crate::token_info::CachedToken;

/// Lead time subtracted from the provider-reported lifetime so a token is
/// never handed out right before it expires.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

type RefreshFuture = Shared<BoxFuture<'static, Result<CachedToken, ProxyError>>>;

#[derive(Default)]
struct TokenState {
    cached: Option<CachedToken>,
    in_flight: Option<RefreshFuture>,
}

/// Hands out a valid bearer token, refreshing it when absent or expired.
///
/// At most one refresh runs at a time, on a spawned task that finishes even
/// when its callers are dropped. Callers arriving while it is in flight wait
/// on the same shared result. A failed refresh leaves the previously cached
/// token in place.
///
/// Clones share the cache.
#[derive(Clone)]
pub struct TokenManager {
    state: Arc<Mutex<TokenState>>,
    retriever: Arc<dyn TokenRetriever>,
    clock: Arc<dyn Clock>,
    refresh_margin: Duration,
}

impl TokenManager {
    pub fn new(retriever: Arc<dyn TokenRetriever>) -> TokenManager {
        TokenManager::with_clock(retriever, Arc::new(SystemClock))
    }

    pub fn with_clock(retriever: Arc<dyn TokenRetriever>, clock: Arc<dyn Clock>) -> TokenManager {
        TokenManager {
            state: Arc::new(Mutex::new(TokenState::default())),
            retriever,
            clock,
            refresh_margin: DEFAULT_REFRESH_MARGIN,
        }
    }

    pub fn with_refresh_margin(mut self, refresh_margin: Duration) -> TokenManager {
        self.refresh_margin = refresh_margin;
        self
    }

    pub async fn get_valid_token(&self) -> Result<AccessToken, ProxyError> {
        let refresh = {
            let mut state = self.state.lock().await;

            if let Some(token) = &state.cached
                && token.is_fresh_at(self.clock.now())
            {
                log::debug!("Using existing valid token");
                return Ok(token.value.clone());
            }

            match &state.in_flight {
                Some(refresh) => {
                    log::debug!("Token refresh already in progress, waiting for it");
                    refresh.clone()
                }
                None => {
                    log::info!("Token expired or not available, refreshing...");
                    let refresh = self.start_refresh();
                    state.in_flight = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await.map(|token| token.value)
    }

    /// Copy of the currently cached token, fresh or not.
    pub async fn cached(&self) -> Option<CachedToken> {
        self.state.lock().await.cached.clone()
    }

    fn start_refresh(&self) -> RefreshFuture {
        let state = self.state.clone();
        let retriever = self.retriever.clone();
        let clock = self.clock.clone();
        let refresh_margin = self.refresh_margin;

        // Runs to completion on its own task even if every caller goes away.
        let task = tokio::spawn(async move {
            let result = retriever.retrieve().await;

            // Cache and in-flight handle change together.
            let mut state = state.lock().await;
            state.in_flight = None;

            match result {
                Ok(token_info) => {
                    let token = CachedToken::issue(token_info, clock.now(), refresh_margin);
                    state.cached = Some(token.clone());
                    log::info!("Access token refreshed successfully");
                    Ok(token)
                }
                Err(e) => {
                    log::error!("Error refreshing access token: {}", e);
                    Err(e)
                }
            }
        });

        async move {
            task.await.unwrap_or_else(|e| {
                log::error!("Token refresh task failed: {}", e);
                Err(ProxyError::UpstreamAuth {
                    status: None,
                    message: format!("refresh task failed: {e}"),
                })
            })
        }
        .boxed()
        .shared()
    }
}
