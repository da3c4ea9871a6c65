//! 릴레이 설정
//!
//! [`RelayConfig`]는 core의 [`RelayConfig`](gridbait_core::config::RelayConfig)를
//! 기반으로 릴레이 내부에서 쓰는 파생 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use gridbait_core::config::GridbaitConfig;
//! use gridbait_relay::config::RelayConfig;
//!
//! let core_config = GridbaitConfig::default();
//! let config = RelayConfig::from_core(&core_config.relay, &core_config.general.device_id);
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// 릴레이 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 이벤트 로그 경로
    pub event_log_path: PathBuf,
    /// 오프셋 저장 파일 경로
    pub offset_path: PathBuf,
    /// 차단 IP 목록 파일 경로
    pub blocklist_path: PathBuf,
    /// 원격 싱크 베이스 URL
    pub sink_url: String,
    /// 알림에 스탬프되는 디바이스 식별자
    pub device_id: String,
    /// 폴링 주기 (초)
    pub poll_interval_secs: u64,
    /// 에러 백오프 대기 시간 (초)
    pub error_backoff_secs: u64,
    /// 싱크 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let core = gridbait_core::config::RelayConfig::default();
        Self {
            enabled: core.enabled,
            event_log_path: PathBuf::from(core.event_log_path),
            offset_path: PathBuf::from(core.offset_path),
            blocklist_path: PathBuf::from(core.blocklist_path),
            sink_url: core.sink_url,
            device_id: gridbait_core::config::GeneralConfig::default().device_id,
            poll_interval_secs: core.poll_interval_secs,
            error_backoff_secs: core.error_backoff_secs,
            request_timeout_secs: core.request_timeout_secs,
        }
    }
}

impl RelayConfig {
    /// core 설정 섹션에서 릴레이 설정을 생성합니다.
    ///
    /// `device_id`는 `[general]` 섹션의 값이므로 별도 인자로 받습니다.
    pub fn from_core(core: &gridbait_core::config::RelayConfig, device_id: &str) -> Self {
        Self {
            enabled: core.enabled,
            event_log_path: PathBuf::from(&core.event_log_path),
            offset_path: PathBuf::from(&core.offset_path),
            blocklist_path: PathBuf::from(&core.blocklist_path),
            sink_url: core.sink_url.clone(),
            device_id: device_id.to_owned(),
            poll_interval_secs: core.poll_interval_secs,
            error_backoff_secs: core.error_backoff_secs,
            request_timeout_secs: core.request_timeout_secs,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), RelayError> {
        const MAX_POLL_INTERVAL_SECS: u64 = 3600; // 1 hour
        const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

        if self.sink_url.is_empty() {
            return Err(RelayError::Config {
                field: "sink_url".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if !self.sink_url.starts_with("http://") && !self.sink_url.starts_with("https://") {
            return Err(RelayError::Config {
                field: "sink_url".to_owned(),
                reason: "must start with http:// or https://".to_owned(),
            });
        }

        if self.device_id.is_empty() {
            return Err(RelayError::Config {
                field: "device_id".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.poll_interval_secs == 0 || self.poll_interval_secs > MAX_POLL_INTERVAL_SECS {
            return Err(RelayError::Config {
                field: "poll_interval_secs".to_owned(),
                reason: format!("must be 1-{MAX_POLL_INTERVAL_SECS}"),
            });
        }

        if self.error_backoff_secs == 0 {
            return Err(RelayError::Config {
                field: "error_backoff_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(RelayError::Config {
                field: "request_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_REQUEST_TIMEOUT_SECS}"),
            });
        }

        Ok(())
    }
}

/// 릴레이 설정 빌더
///
/// 테스트와 데몬에서 경로/URL을 개별 지정할 때 사용합니다.
#[derive(Default)]
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl RelayConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 이벤트 로그 경로를 설정합니다.
    pub fn event_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.event_log_path = path.into();
        self
    }

    /// 오프셋 파일 경로를 설정합니다.
    pub fn offset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.offset_path = path.into();
        self
    }

    /// 차단 목록 파일 경로를 설정합니다.
    pub fn blocklist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.blocklist_path = path.into();
        self
    }

    /// 싱크 URL을 설정합니다.
    pub fn sink_url(mut self, url: impl Into<String>) -> Self {
        self.config.sink_url = url.into();
        self
    }

    /// 디바이스 식별자를 설정합니다.
    pub fn device_id(mut self, id: impl Into<String>) -> Self {
        self.config.device_id = id.into();
        self
    }

    /// 폴링 주기(초)를 설정합니다.
    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.poll_interval_secs = secs;
        self
    }

    /// 에러 백오프(초)를 설정합니다.
    pub fn error_backoff_secs(mut self, secs: u64) -> Self {
        self.config.error_backoff_secs = secs;
        self
    }

    /// 요청 타임아웃(초)을 설정합니다.
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// 설정을 검증하고 `RelayConfig`를 생성합니다.
    pub fn build(self) -> Result<RelayConfig, RelayError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RelayConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_core_preserves_values() {
        let core = gridbait_core::config::RelayConfig {
            sink_url: "http://10.0.0.2:9000".to_owned(),
            poll_interval_secs: 2,
            ..Default::default()
        };
        let config = RelayConfig::from_core(&core, "substation-7");
        assert_eq!(config.sink_url, "http://10.0.0.2:9000");
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.device_id, "substation-7");
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let config = RelayConfig {
            poll_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_sink_url() {
        let config = RelayConfig {
            sink_url: "ftp://monitor.example.com".to_owned(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_timeout() {
        let config = RelayConfig {
            request_timeout_secs: 301,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_creates_valid_config() {
        let config = RelayConfigBuilder::new()
            .sink_url("http://127.0.0.1:9000")
            .device_id("test-node")
            .poll_interval_secs(1)
            .build()
            .unwrap();
        assert_eq!(config.sink_url, "http://127.0.0.1:9000");
        assert_eq!(config.device_id, "test-node");
        assert_eq!(config.poll_interval_secs, 1);
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = RelayConfigBuilder::new().sink_url("").build();
        assert!(result.is_err());
    }
}
