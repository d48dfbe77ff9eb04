//! Authenticated client cache.
//!
//! Credentials are re-read on every tool call. The platform client is only
//! rebuilt, and the new session verified, when they differ from the ones the
//! cached client was built with.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{
    client::{GraphqlApiClient, PlatformClient},
    config::TwitterConfig,
    credentials::Credentials,
    error::{TwitterError, TwitterResult},
};

/// Builds platform clients for a pair of session cookies.
pub trait ClientFactory: Send + Sync {
    /// Create an unverified client.
    fn build(&self, credentials: &Credentials) -> TwitterResult<Arc<dyn PlatformClient>>;
}

/// Factory for [`GraphqlApiClient`].
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    config: TwitterConfig,
}

impl HttpClientFactory {
    #[must_use]
    pub fn new(config: TwitterConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for HttpClientFactory {
    fn build(&self, credentials: &Credentials) -> TwitterResult<Arc<dyn PlatformClient>> {
        Ok(Arc::new(GraphqlApiClient::new(&self.config, credentials)?))
    }
}

struct CachedSession {
    credentials: Credentials,
    client: Arc<dyn PlatformClient>,
}

/// Holds at most one verified client, keyed by the credentials it was built with.
pub struct SessionCache {
    factory: Box<dyn ClientFactory>,
    current: Mutex<Option<CachedSession>>,
}

impl SessionCache {
    #[must_use]
    pub fn new(factory: Box<dyn ClientFactory>) -> Self {
        Self {
            factory,
            current: Mutex::new(None),
        }
    }

    /// Return a verified client for `credentials`.
    ///
    /// A failed verification leaves the previously cached client in place.
    #[instrument(skip_all)]
    pub async fn client(&self, credentials: &Credentials) -> TwitterResult<Arc<dyn PlatformClient>> {
        let mut current = self.current.lock().await;

        if let Some(session) = current.as_ref()
            && session.credentials == *credentials
        {
            debug!("Reusing cached client");
            return Ok(Arc::clone(&session.client));
        }

        info!("Credentials changed, creating new client");
        let client = self.factory.build(credentials)?;
        if let Err(e) = client.verify_session().await {
            warn!(error = %e, "Session verification failed");
            return Err(TwitterError::AuthenticationFailed(e.to_string()));
        }

        *current = Some(CachedSession {
            credentials: credentials.clone(),
            client: Arc::clone(&client),
        });
        Ok(client)
    }
}
