//! JSON REST API for Lineage.
//!
//! Exposes an axum [`Router`] backed by any
//! [`lineage_core::store::MemberStore`]. Reads are public; writes require an
//! editor, as decided by the injected [`AccessPolicy`]. TLS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", lineage_api::api_router(state))
//! ```

pub mod access;
pub mod error;
pub mod members;
pub mod tree;


use std::sync::Arc;

use axum::{Router, routing::get};
use lineage_core::store::MemberStore;

pub use access::{AccessPolicy, EditorAllowlist, UserCredentials};
pub use error::ApiError;

/// State shared by every handler.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  pub access: Arc<AccessPolicy>,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, access: AccessPolicy) -> Self {
    Self { store, access: Arc::new(access) }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      access: Arc::clone(&self.access),
    }
  }
}

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: MemberStore + 'static,
{
  Router::new()
    .route(
      "/family-members",
      get(members::list::<S>).post(members::create::<S>),
    )
    .route(
      "/family-members/{id}",
      get(members::get_one::<S>)
        .put(members::update::<S>)
        .delete(members::delete::<S>),
    )
    .route("/tree", get(tree::handler::<S>))
    .with_state(state)
}
