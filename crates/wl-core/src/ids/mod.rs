//! ID type wrappers for type safety.

pub mod instance_id;

pub use instance_id::InstanceId;
