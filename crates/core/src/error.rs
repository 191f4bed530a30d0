use thiserror::Error;

pub type ValidationResult<T> = Result<T, ValidationError>;

/// A record failed one of its field rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A string-typed tool argument could not be converted.
///
/// The display text is shown to the agent as-is, so it always names the
/// field and carries an example of a valid value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("{field} must be a numeric string. Example: '{example}'")]
    NotNumeric { field: String, example: String },

    #[error("{field} must be a positive integer. Example: '{example}'")]
    NotPositive { field: String, example: String },

    #[error("{field} must be a valid UUID string. Example: '{example}'")]
    InvalidUuid { field: String, example: String },

    #[error("{field} must be in {expected} format. Example: '{example}'")]
    BadFormat {
        field: String,
        expected: String,
        example: String,
    },

    #[error("{field} contains invalid values. Hours (0-23), minutes (0-59), seconds (0-59). Example: '{example}'")]
    TimeOutOfRange { field: String, example: String },

    #[error("Invalid {field} format. Expected format: HH:MM, HH:MM:SS, or ISO datetime. Examples: '14:30', '14:30:00', '2025-01-15T14:30:00Z'")]
    InvalidTime { field: String },

    #[error("Invalid {field} format. Expected formats: HH:MM, HH:MM:SS, or seconds as integer. Examples: '01:30', '01:30:00', '5400'")]
    InvalidDuration { field: String },

    #[error("Invalid {field} format. Expected formats: string address or location object. Example: '123 Main St, City' or {{ 'value': '123 Main St, City' }}")]
    InvalidLocation { field: String },

    #[error("{field} must be a list of participant objects with person_id. Example: [{{ 'person_id': 123, 'primary_flag': true }}]")]
    ParticipantsNotList { field: String },

    #[error("Each participant must be an object. Invalid participant at position {index}")]
    ParticipantNotObject { index: usize },

    #[error("Each participant must have a 'person_id' field. Missing in participant at position {index}")]
    ParticipantMissingPersonId { index: usize },

    #[error("person_id must be a numeric value in participant at position {index}")]
    ParticipantNotNumeric { index: usize },

    #[error("person_id must be a positive integer in participant at position {index}")]
    ParticipantNotPositive { index: usize },

    /// Free-form message, used for rules that live next to a single tool.
    #[error("{0}")]
    Invalid(String),
}

/// Feature registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("Feature '{0}' is not registered")]
    UnknownFeature(String),

    #[error("Failed to read feature config: {0}")]
    Io(String),

    #[error("Failed to parse feature config: {0}")]
    Parse(String),
}
