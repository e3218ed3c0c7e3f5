use thiserror::Error;

/// Faults that stop the page from wiring its behaviour.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartupError {
    #[error("required element `{0}` is missing from the page")]
    MissingElement(&'static str),
    #[error("browser global `{0}` is unavailable")]
    MissingGlobal(&'static str),
}
