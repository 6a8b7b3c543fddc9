//! configgate holds a service back until its distributed configuration is
//! loaded and accepted.
//!
//! Configuration lives in a shared coordination store and is mirrored into
//! a local cache by a configuration monitor. The
//! [`ConfigurableMicroservice`](configuration::ConfigurableMicroservice)
//! creates and drives that monitor through ordered lifecycle steps, gates
//! change notifications until the first full cache load, and lets startup
//! code block on a bounded readiness wait.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, validate, health).
//! - [`configuration`] -- Readiness state machine, listener gating, the
//!   monitor contract and the microservice orchestrator.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /health` and `GET /ready` handlers.
//! - [`lifecycle`] -- Named, fail-fast startup/shutdown step sequences.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`monitor`] -- Polling configuration monitor over a coordination store.
//! - [`server`] -- Axum server setup, shared state, and graceful shutdown.
//! - [`settings`] -- Settings file loading and validation.
//! - [`store`] -- Coordination-store clients (directory, memory, Redis).
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML settings file support _(enabled by default)_ |
//! | `json` | JSON settings file support |
//! | `toml` | TOML settings file support |
//! | `redis` | Redis coordination store |
//! | `file-backends` | All settings file formats |
//! | `full` | All features |

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod configuration;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod logging;
pub mod monitor;
pub mod server;
pub mod settings;
pub mod store;
