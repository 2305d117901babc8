//! tokenkeeper-graphql - GraphQL authentication endpoint and data client.
//!
//! [`GraphqlAuth`] implements the `auth_*` mutation family as an
//! [`AuthBackend`](tokenkeeper_core::AuthBackend). [`AuthorizedClient`]
//! sends application requests decorated with the held access credential.

mod auth;
mod client;
mod decorator;
pub mod operations;

pub use auth::GraphqlAuth;
pub use client::{GraphqlClient, ROLE_HEADER};
pub use decorator::AuthorizedClient;
