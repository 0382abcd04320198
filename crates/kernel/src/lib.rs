//! langcheck kernel library
//!
//! An HTTP front end for text checking engines: parameter parsing, access
//! control, a per-language engine cache and XML responses. The `langcheck`
//! binary wires these together with the builtin language registry.

pub mod cache;
pub mod check;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod params;
pub mod routes;
pub mod state;
pub mod xml;

pub use cache::EngineCache;
pub use check::CheckRequest;
pub use config::Config;
pub use error::{CheckError, CheckResult, ErrorKind};
pub use params::ParameterMap;
pub use state::AppState;
