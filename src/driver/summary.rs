//! Result Summary
//!
//! 결과 스트림 종료 후 남는 요약 정보

use std::collections::HashMap;
use std::time::Duration;

use super::config::ServerAddress;
use super::types::Value;
use crate::bolt::ServerVersion;

// ============================================================================
// Query - 쿼리
// ============================================================================

/// 쿼리 텍스트와 파라미터
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// 쿼리 텍스트
    pub text: String,
    /// 파라미터
    pub parameters: HashMap<String, Value>,
}

impl Query {
    /// 새 쿼리 생성
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: HashMap::new(),
        }
    }

    /// 파라미터 추가
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Query::new(text)
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Query::new(text)
    }
}

// ============================================================================
// QueryType - 쿼리 종류
// ============================================================================

/// 쿼리 타입 (`type` 메타데이터)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryType {
    /// 읽기 전용 (`r`)
    #[default]
    ReadOnly,
    /// 읽기/쓰기 (`rw`)
    ReadWrite,
    /// 쓰기 전용 (`w`)
    WriteOnly,
    /// 스키마 변경 (`s`)
    SchemaWrite,
}

impl QueryType {
    /// 메타데이터 코드에서 변환
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "r" => Some(QueryType::ReadOnly),
            "rw" => Some(QueryType::ReadWrite),
            "w" => Some(QueryType::WriteOnly),
            "s" => Some(QueryType::SchemaWrite),
            _ => None,
        }
    }
}

// ============================================================================
// Counters - 변경 통계
// ============================================================================

/// 쿼리 실행 통계 (`stats` 메타데이터)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    /// 생성된 노드
    pub nodes_created: i64,
    /// 삭제된 노드
    pub nodes_deleted: i64,
    /// 생성된 관계
    pub relationships_created: i64,
    /// 삭제된 관계
    pub relationships_deleted: i64,
    /// 설정된 속성
    pub properties_set: i64,
    /// 추가된 레이블
    pub labels_added: i64,
    /// 제거된 레이블
    pub labels_removed: i64,
    /// 추가된 인덱스
    pub indexes_added: i64,
    /// 제거된 인덱스
    pub indexes_removed: i64,
    /// 추가된 제약조건
    pub constraints_added: i64,
    /// 제거된 제약조건
    pub constraints_removed: i64,
}

impl Counters {
    /// 하이픈 키 맵에서 변환 (없는 키는 0)
    pub fn from_stats(stats: &HashMap<String, Value>) -> Self {
        let count = |key: &str| stats.get(key).and_then(Value::as_int).unwrap_or(0);
        Self {
            nodes_created: count("nodes-created"),
            nodes_deleted: count("nodes-deleted"),
            relationships_created: count("relationships-created"),
            relationships_deleted: count("relationships-deleted"),
            properties_set: count("properties-set"),
            labels_added: count("labels-added"),
            labels_removed: count("labels-removed"),
            indexes_added: count("indexes-added"),
            indexes_removed: count("indexes-removed"),
            constraints_added: count("constraints-added"),
            constraints_removed: count("constraints-removed"),
        }
    }

    /// 변경 포함 여부
    pub fn contains_updates(&self) -> bool {
        self.nodes_created > 0
            || self.nodes_deleted > 0
            || self.relationships_created > 0
            || self.relationships_deleted > 0
            || self.properties_set > 0
            || self.labels_added > 0
            || self.labels_removed > 0
            || self.indexes_added > 0
            || self.indexes_removed > 0
            || self.constraints_added > 0
            || self.constraints_removed > 0
    }
}

// ============================================================================
// Notification - 서버 알림
// ============================================================================

/// 서버 알림
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// 코드
    pub code: String,
    /// 제목
    pub title: String,
    /// 설명
    pub description: String,
    /// 심각도
    pub severity: String,
    /// 위치
    pub position: Option<InputPosition>,
}

impl Notification {
    /// 알림 맵에서 변환
    pub fn from_map(map: &HashMap<String, Value>) -> Self {
        let text = |key: &str| map.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
        Self {
            code: text("code"),
            title: text("title"),
            description: text("description"),
            severity: text("severity"),
            position: map.get("position").and_then(Value::as_map).map(InputPosition::from_map),
        }
    }
}

/// 쿼리 텍스트 내 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPosition {
    /// 오프셋
    pub offset: i64,
    /// 줄
    pub line: i64,
    /// 열
    pub column: i64,
}

impl InputPosition {
    fn from_map(map: &HashMap<String, Value>) -> Self {
        let number = |key: &str| map.get(key).and_then(Value::as_int).unwrap_or(0);
        Self {
            offset: number("offset"),
            line: number("line"),
            column: number("column"),
        }
    }
}

// ============================================================================
// ServerInfo - 서버 정보
// ============================================================================

/// 결과를 만든 서버
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// 서버 주소
    pub address: ServerAddress,
    /// 서버 버전 (초기화 응답에서 받은 값)
    pub version: Option<ServerVersion>,
}

// ============================================================================
// ResultSummary - 결과 요약
// ============================================================================

/// 결과 요약
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    /// 쿼리
    pub query: Query,
    /// 쿼리 타입
    pub query_type: Option<QueryType>,
    /// 카운터
    pub counters: Counters,
    /// 첫 레코드까지 걸린 시간
    pub result_available_after: Option<Duration>,
    /// 결과 소비까지 걸린 시간
    pub result_consumed_after: Option<Duration>,
    /// 서버 정보
    pub server: ServerInfo,
    /// 데이터베이스
    pub database: Option<String>,
    /// 알림
    pub notifications: Vec<Notification>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_from_stats() {
        let mut stats = HashMap::new();
        stats.insert("nodes-created".to_string(), Value::Integer(3));
        stats.insert("properties-set".to_string(), Value::Integer(6));

        let counters = Counters::from_stats(&stats);
        assert_eq!(counters.nodes_created, 3);
        assert_eq!(counters.properties_set, 6);
        assert_eq!(counters.labels_added, 0);
        assert!(counters.contains_updates());
        assert!(!Counters::default().contains_updates());
    }

    #[test]
    fn test_query_type_codes() {
        assert_eq!(QueryType::from_code("r"), Some(QueryType::ReadOnly));
        assert_eq!(QueryType::from_code("rw"), Some(QueryType::ReadWrite));
        assert_eq!(QueryType::from_code("s"), Some(QueryType::SchemaWrite));
        assert_eq!(QueryType::from_code("x"), None);
    }

    #[test]
    fn test_notification_from_map() {
        let mut position = HashMap::new();
        position.insert("line".to_string(), Value::Integer(2));
        position.insert("column".to_string(), Value::Integer(7));

        let mut map = HashMap::new();
        map.insert("code".to_string(), Value::from("Neo.ClientNotification.Statement.CartesianProduct"));
        map.insert("severity".to_string(), Value::from("WARNING"));
        map.insert("position".to_string(), Value::Map(position));

        let notification = Notification::from_map(&map);
        assert_eq!(notification.severity, "WARNING");
        assert_eq!(notification.title, "");
        let position = notification.position.unwrap();
        assert_eq!((position.line, position.column, position.offset), (2, 7, 0));
    }

    #[test]
    fn test_query_builder() {
        let query = Query::new("RETURN $x").with_param("x", 1i64);
        assert_eq!(query.parameters.get("x"), Some(&Value::Integer(1)));
        assert_eq!(Query::from("RETURN 1").text, "RETURN 1");
    }
}
