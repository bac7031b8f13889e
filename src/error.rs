// Error taxonomy surfaced by the generation and search adapters

use thiserror::Error;

use crate::llm::ModelError;

/// Errors returned to callers of the adapters.
///
/// Each variant carries the fixed, user-facing message for the operation
/// that failed. Raw model errors are logged at the boundary, not carried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Quota(String),

    #[error("{0}")]
    SafetyBlock(String),

    #[error("{0}")]
    Data(String),

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    InvalidRequest(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Quota,
    SafetyBlock,
    Data,
    Transport,
    InvalidRequest,
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::Configuration(_) => ErrorKind::Configuration,
            GenerationError::Quota(_) => ErrorKind::Quota,
            GenerationError::SafetyBlock(_) => ErrorKind::SafetyBlock,
            GenerationError::Data(_) => ErrorKind::Data,
            GenerationError::Transport(_) => ErrorKind::Transport,
            GenerationError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    pub fn user_message(&self) -> &str {
        match self {
            GenerationError::Configuration(msg)
            | GenerationError::Quota(msg)
            | GenerationError::SafetyBlock(msg)
            | GenerationError::Data(msg)
            | GenerationError::Transport(msg)
            | GenerationError::InvalidRequest(msg) => msg,
        }
    }
}

const CONFIGURATION_MESSAGE: &str = "AI service configuration error. Please check API key setup.";
const QUOTA_MESSAGE: &str =
    "AI service temporarily unavailable due to usage limits. Please try again later.";

/// The adapter operation an error originated from. Selects the wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Itinerary,
    Search,
    Markdown,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Itinerary => "itinerary",
            Operation::Search => "search",
            Operation::Markdown => "markdown",
        }
    }

    pub fn configuration(&self) -> GenerationError {
        GenerationError::Configuration(CONFIGURATION_MESSAGE.to_string())
    }

    pub fn quota(&self) -> GenerationError {
        GenerationError::Quota(QUOTA_MESSAGE.to_string())
    }

    pub fn safety_block(&self) -> GenerationError {
        let msg = match self {
            Operation::Itinerary => {
                "The request was blocked due to safety settings. Please adjust your input."
            }
            Operation::Search => {
                "The search request was blocked due to safety settings. Please adjust your query."
            }
            Operation::Markdown => {
                "Unable to generate itinerary for this request. Please try modifying your travel details."
            }
        };
        GenerationError::SafetyBlock(msg.to_string())
    }

    pub fn data(&self) -> GenerationError {
        let msg = match self {
            Operation::Itinerary => {
                "AI returned incomplete data. The response is missing required fields."
            }
            Operation::Search => "AI returned malformed search data.",
            Operation::Markdown => "AI returned an unusable itinerary. Please try again.",
        };
        GenerationError::Data(msg.to_string())
    }

    pub fn transport(&self) -> GenerationError {
        let msg = match self {
            Operation::Itinerary => {
                "Failed to generate itinerary. The AI service may be temporarily unavailable or the input is invalid."
            }
            Operation::Search => {
                "Failed to get search results. The AI service may be temporarily unavailable."
            }
            Operation::Markdown => {
                "Failed to generate travel itinerary. Please try again with different details."
            }
        };
        GenerationError::Transport(msg.to_string())
    }

    pub fn invalid_request(&self, detail: impl Into<String>) -> GenerationError {
        GenerationError::InvalidRequest(detail.into())
    }

    /// Maps a wire-level model failure onto the user-facing taxonomy.
    pub fn classify(&self, err: &ModelError) -> GenerationError {
        match err {
            ModelError::MissingCredential | ModelError::InvalidCredential(_) => {
                self.configuration()
            }
            ModelError::QuotaExceeded(_) => self.quota(),
            ModelError::Blocked(_) => self.safety_block(),
            ModelError::EmptyResponse
            | ModelError::Timeout(_)
            | ModelError::Network(_)
            | ModelError::Status { .. }
            | ModelError::Decode(_) => self.transport(),
        }
    }
}
