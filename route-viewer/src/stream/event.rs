//! Events carried by the solve stream.

use serde::Deserialize;

use crate::solution::Solution;

/// One decoded frame.
///
/// Frames whose `type` is none of the known kinds decode to
/// [`StreamEvent::Unknown`] instead of failing the stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Solver progress line.
    Log { message: String },

    /// The computed solution.
    Result { data: Box<Solution> },

    /// Solver-reported failure.
    Error { message: String },

    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Short name of the event kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Log { .. } => "log",
            StreamEvent::Result { .. } => "result",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_kind() {
        let log: StreamEvent =
            serde_json::from_str(r#"{"type":"log","message":"starting"}"#).unwrap();
        assert_eq!(
            log,
            StreamEvent::Log {
                message: "starting".into()
            }
        );

        let err: StreamEvent =
            serde_json::from_str(r#"{"type":"error","message":"infeasible"}"#).unwrap();
        assert_eq!(err.kind(), "error");

        let result: StreamEvent =
            serde_json::from_str(r#"{"type":"result","data":{"routes":[]}}"#).unwrap();
        match result {
            StreamEvent::Result { data } => assert!(data.routes.is_empty()),
            other => panic!("expected result, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"heartbeat","at":12}"#).unwrap();
        assert_eq!(event, StreamEvent::Unknown);
    }

    #[test]
    fn missing_required_field_is_an_error() {
        assert!(serde_json::from_str::<StreamEvent>(r#"{"type":"log"}"#).is_err());
        assert!(serde_json::from_str::<StreamEvent>(r#"{"message":"x"}"#).is_err());
    }
}
