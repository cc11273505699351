//! Configuration Module
//!
//! Configuration loading and dependency injection for the trade session.

mod settings;

use std::sync::Arc;

pub use settings::{
    ApiSecret, ConfigError, DEFAULT_GRPC_ADDR, GatewaySettings, SecretSource, SessionConfig,
    TOKEN_ENV_VAR, find_token, save_api_token, save_api_token_to_user_home,
};

use crate::application::services::{ClientError, TradeSessionClient};
use crate::infrastructure::grpc::GrpcGateway;

/// Connect to the configured gateway and start an authenticated session.
///
/// # Errors
///
/// Returns [`ClientError::Connection`] if the channel cannot be established
/// and [`ClientError::Auth`] if the secret is rejected.
pub async fn connect(config: &SessionConfig) -> Result<TradeSessionClient, ClientError> {
    let gateway = GrpcGateway::connect(&config.gateway.grpc_addr, config.gateway.connect_timeout)
        .await
        .map_err(ClientError::Connection)?;

    TradeSessionClient::start(
        Arc::new(gateway),
        config.api_secret.expose(),
        config.session,
    )
    .await
}
