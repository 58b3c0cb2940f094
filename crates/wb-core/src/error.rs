use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("Failed to fetch \"{location}\": {reason}")]
    Fetch { location: String, reason: String },
    #[error("Failed to parse \"{location}\": {message}")]
    Parse { location: String, message: String },
    #[error("Invalid location \"{raw}\": {reason}")]
    InvalidLocation { raw: String, reason: String },
    #[error("Schema discovery exceeded depth {limit} at \"{location}\".")]
    DepthExceeded { location: String, limit: usize },
    #[error("No symbol table for namespace \"{namespace}\" (while resolving \"{reference}\").")]
    UnresolvedNamespace {
        namespace: String,
        reference: String,
    },
    #[error("Type \"{name}\" is not declared in namespace \"{namespace}\".")]
    UnresolvedType { namespace: String, name: String },
    #[error("Message \"{message}\" has {parts} parts; only single-part wrapped messages are bound.")]
    UnsupportedMessageShape { message: String, parts: usize },
    #[error("Namespace \"{namespace}\" is not registered.")]
    UnknownNamespace { namespace: String },
    #[error("Invalid configuration: {message}")]
    Config { message: String },
    #[error("Failed to write \"{path}\": {reason}")]
    Output { path: String, reason: String },
}

impl BindError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "FETCH_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::InvalidLocation { .. } => "LOCATION_INVALID",
            Self::DepthExceeded { .. } => "DEPTH_EXCEEDED",
            Self::UnresolvedNamespace { .. } => "UNRESOLVED_NAMESPACE",
            Self::UnresolvedType { .. } => "UNRESOLVED_TYPE",
            Self::UnsupportedMessageShape { .. } => "UNSUPPORTED_MESSAGE_SHAPE",
            Self::UnknownNamespace { .. } => "NAMESPACE_NOT_REGISTERED",
            Self::Config { .. } => "CONFIG_INVALID",
            Self::Output { .. } => "OUTPUT_ERROR",
        }
    }

    /// Resolution misses and unsupported message shapes may be degraded to a
    /// skip by the caller; everything else aborts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::UnresolvedNamespace { .. }
                | Self::UnresolvedType { .. }
                | Self::UnsupportedMessageShape { .. }
        )
    }

    pub fn fetch(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn parse(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            location: location.into(),
            message: message.into(),
        }
    }
}
