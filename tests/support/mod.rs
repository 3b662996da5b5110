pub mod fake_api;

use std::{sync::Arc, time::Duration};

use jobtrack::{
    config::ClientConfig,
    gateway::GatewayClient,
    session::{Credential, SessionContext},
};

pub use fake_api::FakeApi;

pub const TOKEN: &str = "test-token-123";
pub const WAIT: Duration = Duration::from_secs(5);

pub fn signed_in() -> Arc<SessionContext> {
    Arc::new(SessionContext::with_credential(
        Credential::new(TOKEN).unwrap(),
    ))
}

pub fn gateway(api: &FakeApi, session: Arc<SessionContext>) -> GatewayClient {
    let config = ClientConfig::new(api.base_url(), Duration::from_secs(2)).unwrap();
    GatewayClient::new(&config, session)
}
