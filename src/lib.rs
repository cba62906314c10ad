//! Location Service Core of a SIP registrar: maintains address-of-record
//! bindings for a REGISTER-handling SIP proxy/registrar, independent of any
//! particular wire parser or transaction layer (§1).

pub mod collaborators;
pub mod config;
pub mod domain;
pub mod error;
pub mod expiration;
pub mod headers;
pub mod orchestrator;
pub mod path;
pub mod query;
pub mod request;
pub mod response;
pub mod store;
pub mod transport;
pub mod updater;
pub mod wildcard;

pub use config::RegistrarConfig;
pub use error::{NotHomedomain, RegistrarError};
pub use orchestrator::RegisterOrchestrator;
pub use request::{RegisterRequest, RoleTag};
pub use response::RegistrarResponse;
