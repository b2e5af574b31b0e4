//! Accounts: registration, login and the current user.

use super::{require_non_empty, require_present};
use crate::dto::{LoginUser, RegisterUser, User, UserChanges};
use crate::password::PasswordHasher;
use crate::store::{NewUserRecord, UserRecord, UserRepo, UserUpdate};
use conduit_core::{CallResult, Identity, StandardError};
use conduit_middleware::TokenCodec;
use std::sync::Arc;

/// Account operations.
#[derive(Clone)]
pub struct UserUsecase {
    users: Arc<dyn UserRepo>,
    hasher: PasswordHasher,
    tokens: Arc<TokenCodec>,
}

impl UserUsecase {
    /// Creates the usecase.
    pub fn new(users: Arc<dyn UserRepo>, hasher: PasswordHasher, tokens: Arc<TokenCodec>) -> Self {
        Self { users, hasher, tokens }
    }

    /// Creates an account and signs it in.
    pub async fn register(&self, input: RegisterUser) -> CallResult<User> {
        require_non_empty("username", &input.username)?;
        require_non_empty("email", &input.email)?;
        require_non_empty("password", &input.password)?;

        let password_hash = self.hasher.hash(&input.password).await?;
        let user = self
            .users
            .create_user(NewUserRecord {
                email: input.email,
                username: input.username,
                password_hash,
            })
            .await?;

        tracing::info!(user.id = user.id, user.name = %user.username, "user registered");
        self.signed_in(user)
    }

    /// Checks credentials and returns the account with a fresh token.
    pub async fn login(&self, credentials: LoginUser) -> CallResult<User> {
        require_non_empty("email", &credentials.email)?;

        let user = self
            .users
            .user_by_email(&credentials.email)
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    StandardError::not_found("user", "not found by email")
                } else {
                    err.into()
                }
            })?;

        if !self.hasher.verify(&credentials.password, &user.password_hash).await? {
            tracing::debug!(user.id = user.id, "password mismatch");
            return Err(StandardError::unauthenticated("user", "login failed"));
        }
        self.signed_in(user)
    }

    /// The caller's account.
    pub async fn current_user(&self, identity: &Identity) -> CallResult<User> {
        let user = self.users.user_by_id(identity.user_id).await?;
        self.signed_in(user)
    }

    /// Applies the provided changes to the caller's account.
    pub async fn update_user(&self, identity: &Identity, changes: UserChanges) -> CallResult<User> {
        require_present("email", changes.email.as_deref())?;
        require_present("username", changes.username.as_deref())?;
        require_present("password", changes.password.as_deref())?;

        let password_hash = match changes.password.as_deref() {
            Some(password) => Some(self.hasher.hash(password).await?),
            None => None,
        };
        let user = self
            .users
            .update_user(
                identity.user_id,
                UserUpdate {
                    email: changes.email,
                    username: changes.username,
                    password_hash,
                    bio: changes.bio,
                    image: changes.image,
                },
            )
            .await?;
        self.signed_in(user)
    }

    fn signed_in(&self, user: UserRecord) -> CallResult<User> {
        let token = self.tokens.issue(user.id)?;
        Ok(User {
            email: user.email,
            token,
            username: user.username,
            bio: user.bio,
            image: user.image,
        })
    }
}

impl std::fmt::Debug for UserUsecase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserUsecase")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}
