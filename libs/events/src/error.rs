use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Not one of the names in [`crate::event_types`].
    #[error("'{0}' is not a circulation event type")]
    UnknownEventType(String),

    /// The envelope builder was finished before this field was set.
    #[error("envelope field '{0}' was never set")]
    MissingField(&'static str),

    #[error("could not encode event: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::Serialization(err.to_string())
    }
}
