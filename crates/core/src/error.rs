use thiserror::Error;
use valve_menu_protocol::ProtocolError;

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("form field {0:?} is missing")]
    MissingField(&'static str),
    #[error("popup duration {0:?} is not a positive number of minutes")]
    InvalidDuration(String),
    #[error("unknown menu kind: {0}")]
    UnknownKind(String),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
