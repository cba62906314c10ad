//! External collaborators (§1, §6): authentication, homedomain, and GRUU
//! factory. This core treats each as an interface only; the reference
//! implementations here make the crate exercisable end to end.

pub mod auth;
pub mod gruu_factory;
pub mod homedomain;

pub use auth::{AuthChallenge, Authenticator, CanRegister, DigestAuthenticator};
pub use gruu_factory::{GruuFactory, InMemoryGruuRegistry};
pub use homedomain::{HomedomainOracle, StaticHomedomainOracle};
