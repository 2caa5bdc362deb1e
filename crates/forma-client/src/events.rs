//! Wire event parsing: SSE framing and typed client events.

use serde::{Deserialize, Serialize};

use forma_core::error::AppError;
use forma_core::result::AppResult;
use forma_core::types::id::{CorrelationId, NotificationId, SessionId};
use forma_entity::notification::model::{Notification, NotificationCounts};

/// Terminal status carried by a correlation resolution event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// The action completed.
    Success,
    /// The engine reported a business failure.
    Error,
}

/// One typed event received on the push connection.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Connection established; counts re-synchronization follows.
    Welcome {
        /// The session the connection serves.
        session_id: SessionId,
    },
    /// Aggregate snapshot; replaces local counts wholesale.
    Counts(NotificationCounts),
    /// A new notification, full record.
    Notification(Box<Notification>),
    /// A notification's required action was performed (possibly elsewhere).
    ActionCompleted {
        /// The notification concerned.
        notification_id: NotificationId,
    },
    /// An in-flight action resolved.
    CorrelationResolved {
        /// The token the action was registered under.
        correlation_id: CorrelationId,
        /// Terminal outcome.
        status: ResolutionStatus,
    },
    /// Keep-alive frame.
    Heartbeat,
}

impl ClientEvent {
    /// Parses one framed event from its wire name and JSON data.
    pub fn parse(event_name: &str, data: &str) -> AppResult<Self> {
        let value: serde_json::Value = serde_json::from_str(data)
            .map_err(|e| AppError::validation(format!("Malformed event payload: {e}")))?;

        match event_name {
            "welcome" => {
                let session_id = serde_json::from_value(value["session_id"].clone())
                    .map_err(|e| AppError::validation(format!("Malformed welcome: {e}")))?;
                Ok(Self::Welcome { session_id })
            }
            "counts" => {
                let counts = serde_json::from_value(value)
                    .map_err(|e| AppError::validation(format!("Malformed counts: {e}")))?;
                Ok(Self::Counts(counts))
            }
            "notification" => {
                let notification = serde_json::from_value(value)
                    .map_err(|e| AppError::validation(format!("Malformed notification: {e}")))?;
                Ok(Self::Notification(Box::new(notification)))
            }
            "action_completed" => {
                let notification_id = serde_json::from_value(value["notification_id"].clone())
                    .map_err(|e| AppError::validation(format!("Malformed action_completed: {e}")))?;
                Ok(Self::ActionCompleted { notification_id })
            }
            "correlation_resolved" => {
                let correlation_id = serde_json::from_value(value["correlationId"].clone())
                    .map_err(|e| AppError::validation(format!("Malformed resolution: {e}")))?;
                let status = serde_json::from_value(value["status"].clone())
                    .map_err(|e| AppError::validation(format!("Malformed resolution: {e}")))?;
                Ok(Self::CorrelationResolved {
                    correlation_id,
                    status,
                })
            }
            "heartbeat" => Ok(Self::Heartbeat),
            other => Err(AppError::validation(format!("Unknown event: {other}"))),
        }
    }
}

/// Incremental parser for the Server-Sent Events wire format.
///
/// Feed raw chunks as they arrive; complete frames come out as
/// `(event_name, data)` pairs. Partial frames stay buffered across chunk
/// boundaries.
#[derive(Debug, Default)]
pub struct SseFrameParser {
    buffer: String,
    event_name: Option<String>,
    data_lines: Vec<String>,
}

impl SseFrameParser {
    /// Creates an empty parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one chunk and returns every frame it completed.
    pub fn feed(&mut self, chunk: &str) -> Vec<(String, String)> {
        self.buffer.push_str(chunk);
        let mut frames = Vec::new();

        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(frame) = self.finish_frame() {
                    frames.push(frame);
                }
            } else if let Some(rest) = line.strip_prefix("event:") {
                self.event_name = Some(rest.trim_start().to_string());
            } else if let Some(rest) = line.strip_prefix("data:") {
                self.data_lines.push(rest.trim_start().to_string());
            } else if line.starts_with(':') {
                // Comment line, ignored.
            }
        }

        frames
    }

    /// Terminates the in-progress frame, if it carried any data.
    fn finish_frame(&mut self) -> Option<(String, String)> {
        let data = self.data_lines.join("\n");
        self.data_lines.clear();
        let event_name = self.event_name.take().unwrap_or_else(|| "message".to_string());
        if data.is_empty() {
            return None;
        }
        Some((event_name, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let mut parser = SseFrameParser::new();
        let frames = parser.feed("event: heartbeat\ndata: {\"timestamp\":\"x\"}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, "heartbeat");
        assert_eq!(frames[0].1, "{\"timestamp\":\"x\"}");
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut parser = SseFrameParser::new();
        assert!(parser.feed("event: counts\nda").is_empty());
        let frames = parser.feed("ta: {\"total\":3}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, "counts");
        assert_eq!(frames[0].1, "{\"total\":3}");
    }

    #[test]
    fn test_two_frames_in_one_chunk() {
        let mut parser = SseFrameParser::new();
        let frames =
            parser.feed("event: a\ndata: 1\n\nevent: b\ndata: 2\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], ("a".to_string(), "1".to_string()));
        assert_eq!(frames[1], ("b".to_string(), "2".to_string()));
    }

    #[test]
    fn test_comment_and_blank_ignored() {
        let mut parser = SseFrameParser::new();
        assert!(parser.feed(": keep-alive\n\n").is_empty());
    }

    #[test]
    fn test_crlf_lines() {
        let mut parser = SseFrameParser::new();
        let frames = parser.feed("event: heartbeat\r\ndata: {}\r\n\r\n");
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_parse_resolution_event() {
        let event = ClientEvent::parse(
            "correlation_resolved",
            "{\"correlationId\":\"c1\",\"status\":\"error\"}",
        )
        .unwrap();
        match event {
            ClientEvent::CorrelationResolved {
                correlation_id,
                status,
            } => {
                assert_eq!(correlation_id.as_str(), "c1");
                assert_eq!(status, ResolutionStatus::Error);
            }
            other => panic!("wrong event: {other:?}"),
        }
    }

    #[test]
    fn test_parse_unknown_event_rejected() {
        assert!(ClientEvent::parse("mystery", "{}").is_err());
    }
}
