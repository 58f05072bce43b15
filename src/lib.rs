pub mod assert;
pub mod capture;
pub mod domain;
pub mod errors;
pub mod http_requester;
pub mod interpolate;
pub mod jsonpath;
pub mod loader;
pub mod orchestrator;
pub mod repository;
pub mod sse;
pub mod step_executor;
pub mod telemetry;
pub mod toposort;
pub mod validation;
