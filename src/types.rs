//! Log record types shared across the server
//!
//! The wire shape and the persisted shape are deliberately separate types:
//! a client can only populate the payload fields, while `serverTimestamp`
//! and `clientIp` exist solely on the persisted record and are stamped by
//! the server at receipt time.

use chrono::{DateTime, SecondsFormat};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// A single log submission as read off the wire.
///
/// `level` and `message` must be present; the client timestamp is optional
/// and passed through unvalidated. Anything else a client sends, including
/// attempts to supply its own `clientIp` or `serverTimestamp`, is ignored
/// by the deserializer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSubmission {
    #[serde(default)]
    pub client_timestamp: String,
    pub level: String,
    pub message: String,
}

/// A fully enriched record, stored as one JSON object per line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub client_timestamp: String,
    pub server_timestamp: String,
    pub client_ip: String,
    pub level: String,
    pub message: String,
}

impl LogSubmission {
    /// Enrich this submission into its persisted form.
    ///
    /// The receipt time is rendered as RFC 3339 with the UTC offset of the
    /// configured display timezone.
    pub fn into_record(self, client_ip: IpAddr, received_at: DateTime<Tz>) -> LogRecord {
        LogRecord {
            client_timestamp: self.client_timestamp,
            server_timestamp: received_at.to_rfc3339_opts(SecondsFormat::Micros, false),
            client_ip: client_ip.to_string(),
            level: self.level,
            message: self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::Toronto;
    use std::net::{IpAddr, Ipv4Addr};

    fn received_at() -> DateTime<Tz> {
        Toronto.with_ymd_and_hms(2025, 2, 24, 9, 30, 0).unwrap()
    }

    #[test]
    fn parses_a_complete_submission() {
        let submission: LogSubmission = serde_json::from_str(
            r#"{"clientTimestamp":"2025-02-24T14:30:00Z","level":"Info","message":"hello"}"#,
        )
        .unwrap();

        assert_eq!(submission.client_timestamp, "2025-02-24T14:30:00Z");
        assert_eq!(submission.level, "Info");
        assert_eq!(submission.message, "hello");
    }

    #[test]
    fn client_timestamp_is_optional() {
        let submission: LogSubmission =
            serde_json::from_str(r#"{"level":"Warn","message":"no clock here"}"#).unwrap();

        assert_eq!(submission.client_timestamp, "");
    }

    #[test]
    fn server_authoritative_fields_cannot_come_from_the_wire() {
        // clientIp and serverTimestamp are not part of the wire type at all
        let submission: LogSubmission = serde_json::from_str(
            r#"{"clientIp":"10.0.0.99","serverTimestamp":"1999-01-01T00:00:00Z","level":"Info","message":"spoof"}"#,
        )
        .unwrap();
        let record = submission.into_record(IpAddr::V4(Ipv4Addr::LOCALHOST), received_at());

        assert_eq!(record.client_ip, "127.0.0.1");
        assert_eq!(record.server_timestamp, "2025-02-24T09:30:00.000000-05:00");
    }

    #[test]
    fn submissions_missing_payload_fields_are_rejected() {
        assert!(serde_json::from_str::<LogSubmission>("{}").is_err());
        assert!(serde_json::from_str::<LogSubmission>(r#"{"level":"Info"}"#).is_err());
        assert!(serde_json::from_str::<LogSubmission>(r#"{"message":"no level"}"#).is_err());
        assert!(serde_json::from_str::<LogSubmission>(r#""not an object""#).is_err());
    }

    #[test]
    fn persisted_shape_uses_camel_case_keys_in_order() {
        let submission: LogSubmission = serde_json::from_str(
            r#"{"clientTimestamp":"2025-02-24T14:30:00Z","level":"Info","message":"hello"}"#,
        )
        .unwrap();
        let record = submission.into_record(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)), received_at());

        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"clientTimestamp":"2025-02-24T14:30:00Z","serverTimestamp":"2025-02-24T09:30:00.000000-05:00","clientIp":"203.0.113.7","level":"Info","message":"hello"}"#,
        );
    }
}
