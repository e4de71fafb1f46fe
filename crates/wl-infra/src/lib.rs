//! Infrastructure adapters for walink: the HTTP instance gateway and the
//! access token source.

pub mod auth;
pub mod gateway;

pub use auth::StaticAccessToken;
pub use gateway::SupabaseInstanceGateway;
