//! Driver Configuration
//!
//! 서버 주소와 응답 처리 설정

use std::fmt;
use std::time::Duration;

use super::error::{DriverError, DriverResult};

/// 기본 Bolt 포트
pub const DEFAULT_PORT: u16 = 7687;

/// 버퍼 상한 기본값. 이 수에 도달하면 소켓 읽기를 멈춘다.
pub const DEFAULT_RECORD_BUFFER_HIGH_WATERMARK: usize = 1000;

/// 버퍼 하한 기본값. 이 수 아래로 내려가면 소켓 읽기를 재개한다.
pub const DEFAULT_RECORD_BUFFER_LOW_WATERMARK: usize = 300;

// ============================================================================
// ServerAddress - 서버 주소
// ============================================================================

/// 서버 주소
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    /// 호스트
    pub host: String,
    /// 포트
    pub port: u16,
}

impl ServerAddress {
    /// 새 서버 주소 생성
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host[:port]` 또는 `scheme://host[:port]` 파싱
    pub fn parse(address: &str) -> DriverResult<Self> {
        let address = match address.split_once("://") {
            Some((_, rest)) => rest,
            None => address,
        };

        match address.rsplit_once(':') {
            None if !address.is_empty() => Ok(Self::new(address, DEFAULT_PORT)),
            Some((host, port)) if !host.is_empty() => {
                let port = port
                    .parse()
                    .map_err(|_| DriverError::configuration(format!("Invalid port in '{}'", address)))?;
                Ok(Self::new(host, port))
            }
            _ => Err(DriverError::configuration(format!("Invalid server address '{}'", address))),
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ============================================================================
// DriverConfig - 드라이버 설정
// ============================================================================

/// 드라이버 설정
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    /// 사용자 에이전트 (HELLO/INIT에 실림)
    pub user_agent: String,
    /// 레코드 버퍼 상한
    pub record_buffer_high_watermark: usize,
    /// 레코드 버퍼 하한
    pub record_buffer_low_watermark: usize,
    /// 풀에 보관할 최대 유휴 연결 수
    pub max_idle_connections: usize,
    /// 유휴 연결 보관 시간
    pub idle_timeout: Duration,
}

impl DriverConfig {
    /// 빌더 생성
    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder {
            config: DriverConfig::default(),
        }
    }

    /// 설정 검증
    pub fn validate(&self) -> DriverResult<()> {
        if self.record_buffer_high_watermark == 0 {
            return Err(DriverError::configuration(
                "Record buffer high watermark must be positive",
            ));
        }
        if self.record_buffer_low_watermark >= self.record_buffer_high_watermark {
            return Err(DriverError::configuration(format!(
                "Record buffer low watermark ({}) must be below the high watermark ({})",
                self.record_buffer_low_watermark, self.record_buffer_high_watermark
            )));
        }
        Ok(())
    }

    /// 흐름 제어에 쓸 `(low, high)` 워터마크
    ///
    /// 필드를 직접 채워 검증을 거치지 않은 설정도 `low < high`가 되도록 맞춘다.
    pub fn record_buffer_watermarks(&self) -> (usize, usize) {
        let high = self.record_buffer_high_watermark.max(1);
        let low = self.record_buffer_low_watermark.min(high - 1);
        (low, high)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("zeta4g-bolt-core/{}", env!("CARGO_PKG_VERSION")),
            record_buffer_high_watermark: DEFAULT_RECORD_BUFFER_HIGH_WATERMARK,
            record_buffer_low_watermark: DEFAULT_RECORD_BUFFER_LOW_WATERMARK,
            max_idle_connections: 100,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

// ============================================================================
// DriverConfigBuilder - 설정 빌더
// ============================================================================

/// 드라이버 설정 빌더
#[derive(Debug, Clone)]
pub struct DriverConfigBuilder {
    config: DriverConfig,
}

impl DriverConfigBuilder {
    /// 사용자 에이전트 설정
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// 레코드 버퍼 상한/하한 설정
    pub fn with_record_buffer_watermarks(mut self, low: usize, high: usize) -> Self {
        self.config.record_buffer_low_watermark = low;
        self.config.record_buffer_high_watermark = high;
        self
    }

    /// 최대 유휴 연결 수 설정
    pub fn with_max_idle_connections(mut self, size: usize) -> Self {
        self.config.max_idle_connections = size;
        self
    }

    /// 유휴 연결 보관 시간 설정
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// 설정 빌드 (검증 포함)
    pub fn build(self) -> DriverResult<DriverConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_address_parse() {
        assert_eq!(ServerAddress::parse("db1:7688").unwrap(), ServerAddress::new("db1", 7688));
        assert_eq!(ServerAddress::parse("bolt://db2").unwrap(), ServerAddress::new("db2", DEFAULT_PORT));
        assert_eq!(ServerAddress::new("db1", 7687).to_string(), "db1:7687");
        assert!(ServerAddress::parse("db1:notaport").is_err());
        assert!(ServerAddress::parse("").is_err());
        assert!(ServerAddress::parse(":7687").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = DriverConfig::default();
        assert_eq!(config.record_buffer_high_watermark, 1000);
        assert_eq!(config.record_buffer_low_watermark, 300);
        assert!(config.user_agent.starts_with("zeta4g-bolt-core/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = DriverConfig::builder()
            .with_user_agent("app/1.0")
            .with_record_buffer_watermarks(10, 50)
            .with_max_idle_connections(4)
            .with_idle_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.user_agent, "app/1.0");
        assert_eq!(config.record_buffer_low_watermark, 10);
        assert_eq!(config.record_buffer_high_watermark, 50);
        assert_eq!(config.max_idle_connections, 4);
    }

    #[test]
    fn test_builder_rejects_inverted_watermarks() {
        let result = DriverConfig::builder().with_record_buffer_watermarks(50, 50).build();
        assert!(matches!(result, Err(DriverError::Configuration(_))));

        let result = DriverConfig::builder().with_record_buffer_watermarks(0, 0).build();
        assert!(matches!(result, Err(DriverError::Configuration(_))));
    }

    #[test]
    fn test_unvalidated_watermarks_are_normalized() {
        assert_eq!(DriverConfig::default().record_buffer_watermarks(), (300, 1000));

        let config = DriverConfig {
            record_buffer_low_watermark: 50,
            record_buffer_high_watermark: 50,
            ..DriverConfig::default()
        };
        assert_eq!(config.record_buffer_watermarks(), (49, 50));

        let config = DriverConfig {
            record_buffer_low_watermark: 7,
            record_buffer_high_watermark: 0,
            ..DriverConfig::default()
        };
        assert_eq!(config.record_buffer_watermarks(), (0, 1));
    }
}
