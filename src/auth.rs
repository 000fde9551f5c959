//! Simulated authentication: users live in the local store and sessions
//! are opaque tokens under a fixed key. There is no server and no password
//! hashing; this exists so auth-gated views have real state to gate on.

use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::User;
use crate::store::{LocalStore, AUTH_TOKEN_KEY, USERS_KEY};

/// An authenticated session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
  pub user: User,
  pub token: String,
}

/// Login, registration and session lookup over the local store.
#[derive(Clone)]
pub struct AuthService {
  store: LocalStore,
  latency: Duration,
}

impl AuthService {
  pub fn new(store: LocalStore, latency: Duration) -> Self {
    Self { store, latency }
  }

  async fn simulate_latency(&self) {
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
  }

  /// Log in with an email. The password is accepted but not verified
  /// against anything - there is no server to check it with.
  pub async fn login(&self, email: &str, _password: &str) -> Result<Session> {
    self.simulate_latency().await;

    let users: Vec<User> = self.store.load(USERS_KEY)?;
    let user = users
      .into_iter()
      .find(|u| u.email == email)
      .ok_or(Error::InvalidCredentials)?;

    self.open_session(user)
  }

  /// Register a new user and log them in.
  pub async fn register(&self, name: &str, email: &str, _password: &str) -> Result<Session> {
    self.simulate_latency().await;

    let mut users: Vec<User> = self.store.load(USERS_KEY)?;
    if users.iter().any(|u| u.email == email) {
      return Err(Error::UserExists(email.to_string()));
    }

    let user = User {
      id: Uuid::new_v4().to_string(),
      name: name.to_string(),
      email: email.to_string(),
    };
    users.push(user.clone());
    self.store.save(USERS_KEY, &users)?;

    debug!(id = %user.id, "registered user");
    self.open_session(user)
  }

  /// Drop the stored session token. Idempotent.
  pub async fn logout(&self) -> Result<()> {
    self.simulate_latency().await;
    self.store.remove(AUTH_TOKEN_KEY)?;
    Ok(())
  }

  /// Resolve the stored token to its user, if a session exists and the
  /// user still does.
  pub async fn current_user(&self) -> Result<Option<User>> {
    self.simulate_latency().await;

    let Some(record) = self.store.get_raw(AUTH_TOKEN_KEY)? else {
      return Ok(None);
    };

    // Token records are "<token>:<user id>"
    let Some((_, user_id)) = record.rsplit_once(':') else {
      return Ok(None);
    };

    let users: Vec<User> = self.store.load(USERS_KEY)?;
    Ok(users.into_iter().find(|u| u.id == user_id))
  }

  fn open_session(&self, user: User) -> Result<Session> {
    let token = format!("token-{}", Uuid::new_v4());
    self
      .store
      .put_raw(AUTH_TOKEN_KEY, &format!("{token}:{}", user.id))?;

    Ok(Session { user, token })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryBackend;

  fn service() -> AuthService {
    AuthService::new(LocalStore::new(MemoryBackend::default()), Duration::ZERO)
  }

  #[tokio::test]
  async fn register_then_login_round_trips() {
    let auth = service();

    let session = auth
      .register("Dana", "dana@example.com", "hunter2")
      .await
      .unwrap();
    assert_eq!(session.user.email, "dana@example.com");
    assert!(!session.token.is_empty());

    let again = auth.login("dana@example.com", "whatever").await.unwrap();
    assert_eq!(again.user.id, session.user.id);
    // Each login issues a fresh token
    assert_ne!(again.token, session.token);
  }

  #[tokio::test]
  async fn login_with_unknown_email_fails() {
    let auth = service();
    let err = auth.login("nobody@example.com", "pw").await.unwrap_err();
    assert!(matches!(err, Error::InvalidCredentials));
  }

  #[tokio::test]
  async fn duplicate_registration_is_rejected() {
    let auth = service();
    auth
      .register("Dana", "dana@example.com", "pw")
      .await
      .unwrap();

    let err = auth
      .register("Other Dana", "dana@example.com", "pw")
      .await
      .unwrap_err();
    assert!(matches!(err, Error::UserExists(_)));
  }

  #[tokio::test]
  async fn current_user_follows_the_session_lifecycle() {
    let auth = service();
    assert_eq!(auth.current_user().await.unwrap(), None);

    let session = auth
      .register("Dana", "dana@example.com", "pw")
      .await
      .unwrap();
    assert_eq!(
      auth.current_user().await.unwrap(),
      Some(session.user.clone())
    );

    auth.logout().await.unwrap();
    assert_eq!(auth.current_user().await.unwrap(), None);
    // Logging out twice is fine
    auth.logout().await.unwrap();
  }
}
