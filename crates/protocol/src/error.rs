use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("time window start {start} is after end {end}")]
    InvertedWindow { start: f64, end: f64 },
    #[error("time {0} cannot be represented as a calendar date")]
    TimeOutOfRange(f64),
    #[error("malformed time string: {0:?}")]
    MalformedTimeString(String),
    #[error("plot request has no components")]
    EmptyRequest,
    #[error("malformed XML: {0}")]
    Xml(String),
    #[error("missing <{0}> element")]
    MissingElement(&'static str),
}
