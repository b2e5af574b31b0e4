//! Wiring: configuration in, a ready [`Dispatcher`] or [`Server`] out.

use crate::biz::{SocialUsecase, UserUsecase};
use crate::password::PasswordHasher;
use crate::routes;
use crate::service::RealWorldService;
use crate::store::Repositories;
use conduit_config::{AuthSettings, ConduitConfig, ServerSettings};
use conduit_middleware::{AuthGate, Chain, TokenCodec};
use conduit_server::{Dispatcher, OperationRegistry, RegistryError, Server, ServerConfig};
use std::sync::Arc;

/// Builds the token codec described by `auth`.
pub fn token_codec(auth: &AuthSettings) -> TokenCodec {
    let codec = TokenCodec::new(&auth.jwt_secret).require_expiry(auth.require_expiry);
    match auth.token_ttl() {
        Some(ttl) => codec.with_ttl(ttl),
        None => codec,
    }
}

/// Transport settings for [`Server`].
pub fn server_config(settings: &ServerSettings) -> ServerConfig {
    ServerConfig::builder()
        .http_addr(settings.http_addr.clone())
        .shutdown_timeout(settings.shutdown_timeout())
        .request_timeout(settings.request_timeout())
        .cors_enabled(settings.cors_enabled)
        .max_body_bytes(usize::try_from(settings.max_body_bytes).unwrap_or(usize::MAX))
        .build()
}

/// Assembles the RealWorld service.
///
/// ```
/// use conduit::AppBuilder;
/// use conduit_config::AuthSettings;
///
/// let dispatcher = AppBuilder::new(AuthSettings::default()).build().unwrap();
/// assert_eq!(dispatcher.registry().len(), 19);
/// ```
#[derive(Debug, Clone)]
pub struct AppBuilder {
    auth: AuthSettings,
    repos: Option<Repositories>,
    hasher: PasswordHasher,
}

impl AppBuilder {
    /// Starts from token settings, in-memory storage and the default bcrypt cost.
    pub fn new(auth: AuthSettings) -> Self {
        Self {
            auth,
            repos: None,
            hasher: PasswordHasher::default(),
        }
    }

    /// Uses `repos` instead of a fresh in-memory store.
    pub fn repositories(mut self, repos: Repositories) -> Self {
        self.repos = Some(repos);
        self
    }

    /// Uses `hasher` for passwords.
    pub fn password_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Registers every operation and builds the dispatcher.
    pub fn build(self) -> Result<Dispatcher, RegistryError> {
        let codec = Arc::new(token_codec(&self.auth));
        let repos = self.repos.unwrap_or_else(Repositories::in_memory);

        let users = UserUsecase::new(repos.users.clone(), self.hasher, Arc::clone(&codec));
        let social = SocialUsecase::new(repos);
        let service = Arc::new(RealWorldService::new(users, social));

        let mut registry = OperationRegistry::new();
        service.register_all(&mut registry)?;

        let chain = Chain::standard(AuthGate::new(codec, routes::bypass_set()));
        Ok(Dispatcher::new(registry, chain))
    }
}

/// A server for `config`, backed by in-memory storage.
pub fn server(config: &ConduitConfig) -> Result<Server, RegistryError> {
    let dispatcher = AppBuilder::new(config.auth.clone()).build()?;
    Ok(Server::new(server_config(&config.server), dispatcher))
}
