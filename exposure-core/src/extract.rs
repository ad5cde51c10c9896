//! Session extraction from raw aggregation context
//!
//! The raw context of an aggregation run is a JSON interaction document.
//! An extractor turns it into a [`Session`], or reports that there is
//! nothing to aggregate.

use std::io::BufRead;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ExposureError, Result};
use crate::session::Session;

/// Turns raw aggregation context into a session.
pub trait SessionExtractor: Send + Sync {
    /// `None` means the context holds nothing to aggregate.
    fn extract(&self, context: &serde_json::Value) -> Option<Session>;
}

/// Decodes interactions serialized as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSessionExtractor;

impl SessionExtractor for JsonSessionExtractor {
    fn extract(&self, context: &serde_json::Value) -> Option<Session> {
        if context.is_null() {
            return None;
        }
        let session = match Session::deserialize(context) {
            Ok(session) => session,
            Err(e) => {
                warn!("Skipping undecodable interaction: {}", e);
                return None;
            }
        };
        if session.pages.is_empty() {
            debug!(session = %session.id, "Interaction has no pages");
            return None;
        }
        Some(session)
    }
}

impl JsonSessionExtractor {
    /// Extract sessions from newline-delimited JSON.
    ///
    /// Blank lines are ignored. A line that is not valid JSON is an error;
    /// valid JSON that holds no session is skipped.
    pub fn extract_lines(&self, reader: impl BufRead) -> Result<Vec<Session>> {
        let mut sessions = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let context: serde_json::Value = serde_json::from_str(&line)
                .map_err(|source| ExposureError::SessionLine {
                    line: index + 1,
                    source,
                })?;
            if let Some(session) = self.extract(&context) {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_context_yields_nothing() {
        assert!(JsonSessionExtractor.extract(&serde_json::Value::Null).is_none());
    }

    #[test]
    fn pageless_interaction_yields_nothing() {
        let context = json!({ "id": "empty", "pages": [] });
        assert!(JsonSessionExtractor.extract(&context).is_none());
    }

    #[test]
    fn undecodable_interaction_yields_nothing() {
        let context = json!({ "pages": "not a list" });
        assert!(JsonSessionExtractor.extract(&context).is_none());
    }

    #[test]
    fn interaction_with_pages_is_extracted() {
        let context = json!({
            "id": "visit-1",
            "contact_visit_index": 2,
            "pages": [{ "date_time": "2025-03-01T10:00:00Z", "engagement_value": 5 }]
        });

        let session = JsonSessionExtractor.extract(&context).unwrap();
        assert_eq!(session.id, "visit-1");
        assert_eq!(session.contact_visit_index, 2);
        assert_eq!(session.pages[0].engagement_value, 5);
    }

    #[test]
    fn extract_lines_skips_blank_and_empty_sessions() {
        let input = concat!(
            r#"{"id":"a","pages":[{"date_time":"2025-03-01T10:00:00Z"}]}"#,
            "\n\n",
            "null\n",
            r#"{"id":"b","pages":[{"date_time":"2025-03-01T11:00:00Z"}]}"#,
            "\n",
        );

        let sessions = JsonSessionExtractor.extract_lines(input.as_bytes()).unwrap();
        let ids: Vec<_> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn extract_lines_reports_bad_line() {
        let input = "null\n{not json\n";
        let err = JsonSessionExtractor
            .extract_lines(input.as_bytes())
            .unwrap_err();
        assert!(matches!(err, ExposureError::SessionLine { line: 2, .. }));
    }
}
