pub mod static_token;

pub use static_token::{StaticAccessToken, ACCESS_TOKEN_ENV};
