mod engine;
mod request;

pub use engine::{Engine, InstallOutcome, UninstallOutcome};
pub use request::{ErrorPayload, Request, Response};
