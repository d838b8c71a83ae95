use thiserror::Error;

/// Configuration errors raised while translating caller input into core types.
///
/// Data problems (non-numeric values, missing custom bounds) are never errors;
/// they shrink or empty the result instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unknown range selector '{0}'")]
    UnknownRange(String),
    #[error("unknown channel '{0}'")]
    UnknownChannel(String),
}
