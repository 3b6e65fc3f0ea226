use crate::machine::MachineType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown machine type: {0}")]
    UnknownMachineType(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("Floating-point {ty} at {position} is not supported by native calls")]
    FloatNotSupported {
        position: SignaturePosition,
        ty: MachineType,
    },
}

/// Where in a signature a rejected type appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignaturePosition {
    Return(usize),
    Param(usize),
}

impl std::fmt::Display for SignaturePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Return(i) => write!(f, "return {i}"),
            Self::Param(i) => write!(f, "parameter {i}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
