//! Record - 쿼리 결과 레코드
//!
//! 한 결과 스트림의 레코드는 모두 같은 [`RecordKeys`]를 공유한다.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::{DriverError, DriverResult};
use super::types::{Node, Relationship, Value};

// ============================================================================
// RecordKeys - 공유 컬럼 키
// ============================================================================

/// 결과 스트림의 컬럼 키와 키-인덱스 매핑
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecordKeys {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl RecordKeys {
    /// 컬럼 이름으로 생성
    pub fn new(names: Vec<String>) -> Arc<Self> {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        Arc::new(Self { names, index })
    }

    /// 빈 키 목록
    pub fn empty() -> Arc<Self> {
        Self::new(Vec::new())
    }

    /// 컬럼 이름들
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 컬럼 수
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// 컬럼이 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 이름으로 인덱스 찾기
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }
}

// ============================================================================
// Record - 단일 레코드
// ============================================================================

/// 쿼리 결과 레코드. 생성 후에는 변경되지 않는다.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    keys: Arc<RecordKeys>,
    values: Vec<Value>,
}

impl Record {
    /// 공유 키와 필드 값으로 레코드 생성
    pub fn new(keys: Arc<RecordKeys>, values: Vec<Value>) -> Self {
        Self { keys, values }
    }

    /// 키 목록
    pub fn keys(&self) -> &[String] {
        self.keys.names()
    }

    /// 값 목록
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// 레코드 길이
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 빈 레코드 여부
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 키로 값 가져오기
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.keys.index_of(key).and_then(|i| self.values.get(i))
    }

    /// 인덱스로 값 가져오기
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// 키 존재 여부
    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.index_of(key).is_some()
    }

    /// 키로 타입 변환된 값 가져오기
    pub fn get_as<T>(&self, key: &str) -> DriverResult<T>
    where
        T: TryFrom<Value, Error = DriverError>,
    {
        let value = self
            .get(key)
            .cloned()
            .ok_or_else(|| DriverError::no_such_record(format!("Key '{}' not found", key)))?;
        T::try_from(value)
    }

    /// Integer 값 가져오기
    pub fn get_int(&self, key: &str) -> DriverResult<i64> {
        self.get_as(key)
    }

    /// String 값 가져오기
    pub fn get_string(&self, key: &str) -> DriverResult<String> {
        self.get_as(key)
    }

    /// Node 값 가져오기
    pub fn get_node(&self, key: &str) -> DriverResult<Node> {
        self.get_as(key)
    }

    /// Relationship 값 가져오기
    pub fn get_relationship(&self, key: &str) -> DriverResult<Relationship> {
        self.get_as(key)
    }

    /// Map으로 변환
    pub fn to_map(&self) -> HashMap<String, Value> {
        self.keys
            .names()
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::iter::Zip<std::slice::Iter<'a, String>, std::slice::Iter<'a, Value>>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.names().iter().zip(self.values.iter())
    }
}

// ============================================================================
// Tests
// ============================================================================
