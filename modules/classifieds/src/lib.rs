//! Users and classified ads over HTTP, persisted through SeaORM.

// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::model;

// === INTERNAL MODULES ===
// Exposed for the server binary and for tests; external consumers should
// stick to `contract`.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
