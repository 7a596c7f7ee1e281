//! Shared enums and parameter initialization
pub mod enums;
pub mod init;

pub use enums::*;
pub use init::*;
