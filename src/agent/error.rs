use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent subprocess timed out after {0} minutes")]
    Timeout(u64),

    #[error("agent produced no code")]
    NoCode,

    #[error("agent subprocess exited with code {0}")]
    NonZeroExit(i32),
}
