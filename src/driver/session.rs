//! Session State
//!
//! 세션이 쿼리 사이에 유지하는 상태: 접근 모드와 마지막 북마크

use std::sync::Arc;

use parking_lot::RwLock;

// ============================================================================
// AccessMode - 접근 모드
// ============================================================================

/// 접근 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// 읽기
    #[default]
    Read,
    /// 쓰기
    Write,
}

// ============================================================================
// Bookmark - 북마크
// ============================================================================

/// 인과적 일관성 북마크
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bookmark {
    value: String,
}

impl Bookmark {
    /// 새 북마크 생성
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// 북마크 값
    pub fn value(&self) -> &str {
        &self.value
    }

    /// 빈 북마크 여부
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl std::fmt::Display for Bookmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<String> for Bookmark {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Bookmark {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ============================================================================
// BookmarkHolder - 세션 북마크 보관소
// ============================================================================

/// 세션의 마지막 북마크. 세션과 응답 핸들러가 복제본을 나눠 가진다.
#[derive(Debug, Clone, Default)]
pub struct BookmarkHolder {
    last: Arc<RwLock<Option<Bookmark>>>,
}

impl BookmarkHolder {
    /// 빈 보관소 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 북마크를 가진 보관소 생성
    pub fn with_bookmark(bookmark: Bookmark) -> Self {
        let holder = Self::new();
        holder.set(Some(bookmark));
        holder
    }

    /// 마지막 북마크
    pub fn get(&self) -> Option<Bookmark> {
        self.last.read().clone()
    }

    /// 북마크 갱신. `None`이나 빈 북마크는 기존 값을 지우지 않는다.
    pub fn set(&self, bookmark: Option<Bookmark>) {
        if let Some(bookmark) = bookmark.filter(|b| !b.is_empty()) {
            *self.last.write() = Some(bookmark);
        }
    }
}
