//! Bolt server error codes.
//!
//! Codes follow `<Product>.<Classification>.<Category>.<Title>`. Servers in
//! the wild report the same condition under different product prefixes
//! (`Neo.` and `Cypher.`), so comparisons go through [`code_suffix`].

/// Strip the product prefix from an error code.
///
/// `Neo.ClientError.Cluster.NotALeader` and `Cypher.ClientError.Cluster.NotALeader`
/// both become `ClientError.Cluster.NotALeader`.
pub fn code_suffix(code: &str) -> &str {
    match code.split_once('.') {
        Some((_, rest)) => rest,
        None => code,
    }
}

/// Bolt 프로토콜 에러 코드 상수
pub struct BoltErrorCode;

impl BoltErrorCode {
    /// Leader-only operation sent to a follower.
    pub const NOT_A_LEADER: &'static str = "Neo.ClientError.Cluster.NotALeader";
    /// Write sent to a read-only database.
    pub const FORBIDDEN_ON_READ_ONLY_DATABASE: &'static str =
        "Neo.ClientError.General.ForbiddenOnReadOnlyDatabase";
    /// Database temporarily unavailable on this member.
    pub const DATABASE_UNAVAILABLE: &'static str =
        "Neo.TransientError.General.DatabaseUnavailable";
    /// Statement syntax error.
    pub const SYNTAX_ERROR: &'static str = "Neo.ClientError.Statement.SyntaxError";
    /// Unclassified server failure.
    pub const GENERAL_ERROR: &'static str = "Neo.DatabaseError.General.UnknownError";

    /// Whether `code` names the same condition as `known`, ignoring the product prefix.
    pub fn matches(code: &str, known: &str) -> bool {
        code_suffix(code) == code_suffix(known)
    }

    /// Whether `code` means the member refused a write.
    pub fn is_failure_to_write(code: &str) -> bool {
        Self::matches(code, Self::NOT_A_LEADER)
            || Self::matches(code, Self::FORBIDDEN_ON_READ_ONLY_DATABASE)
    }

    /// Whether `code` means the database is unavailable on this member.
    pub fn is_database_unavailable(code: &str) -> bool {
        Self::matches(code, Self::DATABASE_UNAVAILABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_suffix() {
        assert_eq!(code_suffix("Neo.ClientError.Cluster.NotALeader"), "ClientError.Cluster.NotALeader");
        assert_eq!(code_suffix("Cypher.ClientError.Cluster.NotALeader"), "ClientError.Cluster.NotALeader");
        assert_eq!(code_suffix("Unqualified"), "Unqualified");
    }

    #[test]
    fn test_failure_to_write_codes() {
        assert!(BoltErrorCode::is_failure_to_write("Neo.ClientError.Cluster.NotALeader"));
        assert!(BoltErrorCode::is_failure_to_write("Cypher.ClientError.Cluster.NotALeader"));
        assert!(BoltErrorCode::is_failure_to_write(
            "Cypher.ClientError.General.ForbiddenOnReadOnlyDatabase"
        ));
        assert!(!BoltErrorCode::is_failure_to_write(BoltErrorCode::SYNTAX_ERROR));
    }

    #[test]
    fn test_database_unavailable_codes() {
        assert!(BoltErrorCode::is_database_unavailable(
            "Cypher.TransientError.General.DatabaseUnavailable"
        ));
        assert!(!BoltErrorCode::is_database_unavailable(
            "Neo.TransientError.Transaction.DeadlockDetected"
        ));
    }
}
