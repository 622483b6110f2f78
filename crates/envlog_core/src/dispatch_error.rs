/// Errors raised while decoding a message payload into an operation name.
#[derive(Debug)]
pub enum DecodeError {
    Base64(base64::DecodeError),
    Utf8(std::string::FromUtf8Error),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base64(error) => write!(f, "payload is not valid base64: {error}"),
            Self::Utf8(error) => write!(f, "payload is not valid UTF-8: {error}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<base64::DecodeError> for DecodeError {
    fn from(error: base64::DecodeError) -> Self {
        Self::Base64(error)
    }
}

impl From<std::string::FromUtf8Error> for DecodeError {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Self::Utf8(error)
    }
}

/// Typed outcome of a dispatch attempt. Callers decide logging and
/// acknowledgment policy; nothing in this taxonomy is retried here.
#[derive(Debug)]
pub enum DispatchError {
    /// The payload could not be decoded into an operation name.
    Decode(DecodeError),
    /// The decoded name matched no registered snippet.
    UnknownOperation { name: String },
    /// The selected snippet ran but the logging sink rejected the write.
    SinkUnavailable { operation: String, message: String },
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(error) => write!(f, "{error}"),
            Self::UnknownOperation { name } => {
                write!(f, "no snippet registered for operation '{name}'")
            }
            Self::SinkUnavailable { operation, message } => {
                write!(f, "snippet '{operation}' failed to write log entry: {message}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<DecodeError> for DispatchError {
    fn from(error: DecodeError) -> Self {
        Self::Decode(error)
    }
}
