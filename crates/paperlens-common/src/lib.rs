//! paperlens-common: Shared error type and the network sandbox used by
//! every PaperLens crate that talks to the outside world.

pub mod error;
pub mod sandbox;

pub use error::CommonError;
pub use sandbox::SandboxClient;
