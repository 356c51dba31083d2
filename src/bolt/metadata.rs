//! Extraction of typed values from SUCCESS metadata.
//!
//! The timing keys changed name between protocol generations, so an
//! extractor is built for a specific [`BoltVersion`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::version::{BoltVersion, ServerVersion};
use crate::driver::{
    Bookmark, Counters, DriverError, DriverResult, Notification, Query, QueryType, RecordKeys,
    ResultSummary, ServerInfo, Value,
};

/// Query id used when RUN metadata carries no `qid`.
pub const ABSENT_QUERY_ID: i64 = -1;

/// Timing value used when RUN metadata carries no availability time.
pub const ABSENT_TIMING: i64 = -1;

/// Reads well-known entries out of SUCCESS metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataExtractor {
    result_available_after_key: &'static str,
    result_consumed_after_key: &'static str,
}

impl MetadataExtractor {
    /// Keys used by Bolt 1 and 2.
    pub const V1: MetadataExtractor = MetadataExtractor {
        result_available_after_key: "result_available_after",
        result_consumed_after_key: "result_consumed_after",
    };

    /// Keys used from Bolt 3 onwards.
    pub const V3: MetadataExtractor = MetadataExtractor {
        result_available_after_key: "t_first",
        result_consumed_after_key: "t_last",
    };

    /// Extractor matching a negotiated protocol version.
    pub fn for_version(version: BoltVersion) -> Self {
        if version.uses_hello() {
            Self::V3
        } else {
            Self::V1
        }
    }

    /// Result column names (`fields`). Missing or malformed entries yield no keys.
    pub fn extract_keys(&self, metadata: &HashMap<String, Value>) -> Arc<RecordKeys> {
        let names = metadata
            .get("fields")
            .and_then(Value::as_list)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        RecordKeys::new(names)
    }

    /// Milliseconds until the first record was available, or [`ABSENT_TIMING`].
    pub fn extract_result_available_after(&self, metadata: &HashMap<String, Value>) -> i64 {
        metadata
            .get(self.result_available_after_key)
            .and_then(Value::as_int)
            .unwrap_or(ABSENT_TIMING)
    }

    /// Server-assigned query id, or [`ABSENT_QUERY_ID`].
    pub fn extract_query_id(&self, metadata: &HashMap<String, Value>) -> i64 {
        metadata
            .get("qid")
            .and_then(Value::as_int)
            .unwrap_or(ABSENT_QUERY_ID)
    }

    /// Bookmark produced by an auto-commit query or a COMMIT.
    pub fn extract_bookmark(&self, metadata: &HashMap<String, Value>) -> Option<Bookmark> {
        metadata
            .get("bookmark")
            .and_then(Value::as_str)
            .map(Bookmark::new)
            .filter(|bookmark| !bookmark.is_empty())
    }

    /// Server product version from an initialization SUCCESS.
    pub fn extract_server_version(&self, metadata: &HashMap<String, Value>) -> DriverResult<ServerVersion> {
        let agent = metadata
            .get("server")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::protocol("Server version is missing from initialization metadata"))?;
        ServerVersion::parse(agent)
    }

    /// Connection id from a HELLO SUCCESS.
    pub fn extract_connection_id(&self, metadata: &HashMap<String, Value>) -> DriverResult<String> {
        metadata
            .get("connection_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DriverError::protocol("Connection id is missing from HELLO metadata"))
    }

    /// Build the summary of a finished result stream.
    ///
    /// `metadata` is empty when the stream ended with a failure.
    pub fn extract_summary(
        &self,
        query: &Query,
        server: ServerInfo,
        result_available_after: i64,
        metadata: &HashMap<String, Value>,
    ) -> ResultSummary {
        let counters = metadata
            .get("stats")
            .and_then(Value::as_map)
            .map(Counters::from_stats)
            .unwrap_or_default();

        let notifications = metadata
            .get("notifications")
            .and_then(Value::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_map)
                    .map(Notification::from_map)
                    .collect()
            })
            .unwrap_or_default();

        ResultSummary {
            query: query.clone(),
            query_type: metadata
                .get("type")
                .and_then(Value::as_str)
                .and_then(QueryType::from_code),
            counters,
            result_available_after: millis(result_available_after),
            result_consumed_after: millis(
                metadata
                    .get(self.result_consumed_after_key)
                    .and_then(Value::as_int)
                    .unwrap_or(ABSENT_TIMING),
            ),
            server,
            database: metadata.get("db").and_then(Value::as_str).map(str::to_string),
            notifications,
        }
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::V3
    }
}

fn millis(value: i64) -> Option<Duration> {
    u64::try_from(value).ok().map(Duration::from_millis)
}
