//! walink: links a WhatsApp account to its backend-managed instance.
//!
//! The binary is a thin shell over [`wl_app::ConnectionOrchestrator`]; this
//! library holds the startup code and the command-line front end.

pub mod bootstrap;
pub mod cli;
