//! Web handlers module
//!
//! HTTP request handlers, one module per endpoint group. Handlers only
//! translate between HTTP and the service layer.

pub mod cache;
pub mod health;
pub mod preview;
