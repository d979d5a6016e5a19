pub mod initialize_use_case;
pub mod ports;
pub mod session;

pub use initialize_use_case::{FailureKind, InitializeUseCase, Startup, StartupFailure};
pub use session::Session;
