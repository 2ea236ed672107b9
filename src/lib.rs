// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod controller;
pub mod corpus;
pub mod countdown;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod runtime;
pub mod session;
pub mod ui;
