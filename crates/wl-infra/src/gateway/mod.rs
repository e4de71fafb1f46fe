//! HTTP binding of the instance gateway (Supabase edge functions).

pub mod qr;
pub mod supabase;

pub use supabase::SupabaseInstanceGateway;
