use std::fmt;

#[derive(Debug)]
pub enum AppError {
    // Node / RPC errors
    Transport(String),

    // Malformed RPC response field
    Decode(String),

    // Signature length or field-shape violation
    Format(String),

    // Signing key or signing primitive errors
    Signature(String),

    // Canonical encoding errors
    Encoding(String),

    // Validation errors
    Validation(String),

    // Configuration errors
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Transport(msg) => write!(f, "Transport error: {}", msg),
            AppError::Decode(msg) => write!(f, "Decode error: {}", msg),
            AppError::Format(msg) => write!(f, "Format error: {}", msg),
            AppError::Signature(msg) => write!(f, "Signature error: {}", msg),
            AppError::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// A required response field was absent
    pub fn missing(field: &str) -> Self {
        AppError::Decode(format!("{} not found", field))
    }

    /// A response field was present but could not be decoded
    pub fn malformed(field: &str, reason: impl fmt::Display) -> Self {
        AppError::Decode(format!("invalid {}: {}", field, reason))
    }
}

impl From<ethers::providers::ProviderError> for AppError {
    fn from(err: ethers::providers::ProviderError) -> Self {
        tracing::error!("Node provider error: {:?}", err);
        AppError::Transport(err.to_string())
    }
}

impl From<ethers::utils::rlp::DecoderError> for AppError {
    fn from(err: ethers::utils::rlp::DecoderError) -> Self {
        AppError::Encoding(err.to_string())
    }
}

impl From<secp256k1::Error> for AppError {
    fn from(err: secp256k1::Error) -> Self {
        tracing::error!("secp256k1 error: {:?}", err);
        AppError::Signature(err.to_string())
    }
}

impl From<ethers::signers::WalletError> for AppError {
    fn from(err: ethers::signers::WalletError) -> Self {
        tracing::error!("Wallet error: {:?}", err);
        AppError::Signature(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
