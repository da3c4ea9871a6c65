//! 설정 관리 — gridbait.toml 파싱 및 런타임 설정
//!
//! [`GridbaitConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`GRIDBAIT_RELAY_SINK_URL=...` 형식)
//! 3. 설정 파일 (`gridbait.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), gridbait_core::error::GridbaitError> {
//! use gridbait_core::config::GridbaitConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = GridbaitConfig::load("gridbait.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = GridbaitConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, GridbaitError};

/// Gridbait 통합 설정
///
/// `gridbait.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridbaitConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 릴레이 파이프라인 설정
    #[serde(default)]
    pub relay: RelayConfig,
    /// 디코이 리스너 설정
    #[serde(default)]
    pub decoy: DecoyConfig,
    /// 메트릭 엔드포인트 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl GridbaitConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, GridbaitError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, GridbaitError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GridbaitError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                GridbaitError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, GridbaitError> {
        toml::from_str(toml_str).map_err(|e| {
            GridbaitError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `GRIDBAIT_{SECTION}_{FIELD}`
    /// 예: `GRIDBAIT_RELAY_SINK_URL=https://monitor.example.com`
    ///
    /// 디코이 리스너 목록은 구조가 복잡하여 환경변수 오버라이드를
    /// 지원하지 않습니다 (설정 파일로만 지정).
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "GRIDBAIT_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "GRIDBAIT_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.data_dir, "GRIDBAIT_GENERAL_DATA_DIR");
        override_string(&mut self.general.pid_file, "GRIDBAIT_GENERAL_PID_FILE");
        override_string(&mut self.general.device_id, "GRIDBAIT_GENERAL_DEVICE_ID");

        // Relay
        override_bool(&mut self.relay.enabled, "GRIDBAIT_RELAY_ENABLED");
        override_string(&mut self.relay.event_log_path, "GRIDBAIT_RELAY_EVENT_LOG_PATH");
        override_string(&mut self.relay.offset_path, "GRIDBAIT_RELAY_OFFSET_PATH");
        override_string(
            &mut self.relay.blocklist_path,
            "GRIDBAIT_RELAY_BLOCKLIST_PATH",
        );
        override_string(&mut self.relay.sink_url, "GRIDBAIT_RELAY_SINK_URL");
        override_u64(
            &mut self.relay.poll_interval_secs,
            "GRIDBAIT_RELAY_POLL_INTERVAL_SECS",
        );
        override_u64(
            &mut self.relay.error_backoff_secs,
            "GRIDBAIT_RELAY_ERROR_BACKOFF_SECS",
        );
        override_u64(
            &mut self.relay.request_timeout_secs,
            "GRIDBAIT_RELAY_REQUEST_TIMEOUT_SECS",
        );

        // Decoy
        override_bool(&mut self.decoy.enabled, "GRIDBAIT_DECOY_ENABLED");
        override_string(&mut self.decoy.event_log_path, "GRIDBAIT_DECOY_EVENT_LOG_PATH");

        // Metrics
        override_bool(&mut self.metrics.enabled, "GRIDBAIT_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "GRIDBAIT_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "GRIDBAIT_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), GridbaitError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.general.device_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "general.device_id".to_owned(),
                reason: "device_id must not be empty".to_owned(),
            }
            .into());
        }

        // Relay 검증 (비활성화 상태면 건너뜀)
        if self.relay.enabled {
            if self.relay.sink_url.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "relay.sink_url".to_owned(),
                    reason: "sink_url must not be empty when relay is enabled".to_owned(),
                }
                .into());
            }
            if !self.relay.sink_url.starts_with("http://")
                && !self.relay.sink_url.starts_with("https://")
            {
                return Err(ConfigError::InvalidValue {
                    field: "relay.sink_url".to_owned(),
                    reason: "sink_url must start with http:// or https://".to_owned(),
                }
                .into());
            }
            if self.relay.poll_interval_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "relay.poll_interval_secs".to_owned(),
                    reason: "must be greater than 0".to_owned(),
                }
                .into());
            }
            if self.relay.error_backoff_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "relay.error_backoff_secs".to_owned(),
                    reason: "must be greater than 0".to_owned(),
                }
                .into());
            }
            if self.relay.request_timeout_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "relay.request_timeout_secs".to_owned(),
                    reason: "must be greater than 0".to_owned(),
                }
                .into());
            }
            if self.relay.event_log_path.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "relay.event_log_path".to_owned(),
                    reason: "event_log_path must not be empty".to_owned(),
                }
                .into());
            }
        }

        // Decoy 검증
        if self.decoy.enabled {
            if self.decoy.listeners.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "decoy.listeners".to_owned(),
                    reason: "at least one listener must be configured when enabled".to_owned(),
                }
                .into());
            }
            for listener in &self.decoy.listeners {
                if listener.name.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "decoy.listeners.name".to_owned(),
                        reason: "listener name must not be empty".to_owned(),
                    }
                    .into());
                }
                if listener.bind.parse::<std::net::SocketAddr>().is_err() {
                    return Err(ConfigError::InvalidValue {
                        field: "decoy.listeners.bind".to_owned(),
                        reason: format!(
                            "'{}' is not a valid socket address for listener '{}'",
                            listener.bind, listener.name
                        ),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 데이터 디렉토리
    pub data_dir: String,
    /// PID 파일 경로
    pub pid_file: String,
    /// 알림에 스탬프되는 디바이스 식별자
    pub device_id: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            data_dir: "/var/lib/gridbait".to_owned(),
            pid_file: "/var/run/gridbait.pid".to_owned(),
            device_id: "gridbait-node".to_owned(),
        }
    }
}

/// 릴레이 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 이벤트 로그 경로 (디코이들이 append하는 공유 파일)
    pub event_log_path: String,
    /// 오프셋 저장 파일 경로
    pub offset_path: String,
    /// 차단 IP 목록 파일 경로 (외부에서 관리)
    pub blocklist_path: String,
    /// 원격 싱크 베이스 URL
    pub sink_url: String,
    /// 폴링 주기 (초)
    pub poll_interval_secs: u64,
    /// 에러 백오프 대기 시간 (초)
    pub error_backoff_secs: u64,
    /// 싱크 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            event_log_path: "/var/lib/gridbait/events.log".to_owned(),
            offset_path: "/var/lib/gridbait/relay.offset".to_owned(),
            blocklist_path: "/var/lib/gridbait/blocked_ips.txt".to_owned(),
            sink_url: "https://monitor.gridbait.example".to_owned(),
            poll_interval_secs: 5,
            error_backoff_secs: 10,
            request_timeout_secs: 10,
        }
    }
}

/// 디코이 리스너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoyConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 이벤트 로그 경로 (릴레이와 공유)
    pub event_log_path: String,
    /// 리스너 목록
    pub listeners: Vec<ListenerConfig>,
}

impl Default for DecoyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            event_log_path: "/var/lib/gridbait/events.log".to_owned(),
            listeners: vec![
                ListenerConfig {
                    name: "smart-meter".to_owned(),
                    protocol: "modbus".to_owned(),
                    bind: "0.0.0.0:1502".to_owned(),
                    canned_response: None,
                },
                ListenerConfig {
                    name: "scada".to_owned(),
                    protocol: "iec104".to_owned(),
                    bind: "0.0.0.0:2404".to_owned(),
                    canned_response: None,
                },
                ListenerConfig {
                    name: "ev-charger".to_owned(),
                    protocol: "ocpp".to_owned(),
                    bind: "0.0.0.0:8080".to_owned(),
                    canned_response: Some(
                        r#"{"status":"Accepted","currentTime":"2025-01-01T00:00:00Z"}"#.to_owned(),
                    ),
                },
            ],
        }
    }
}

/// 개별 디코이 리스너 설정
///
/// 프로토콜 프레이밍은 외부 협력 라이브러리의 몫이고,
/// 리스너 자체는 연결/수신을 이벤트 로그에 기록만 합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// 리스너 이름 (로그 라인과 tracing에 표시)
    pub name: String,
    /// 흉내내는 프로토콜 이름 (modbus, iec104, ocpp 등 — 표시용)
    pub protocol: String,
    /// 바인드 주소 (예: "0.0.0.0:1502")
    pub bind: String,
    /// 수신 데이터에 대한 고정 응답 (없으면 응답하지 않음)
    pub canned_response: Option<String>,
}

/// 메트릭 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 수신 주소
    pub listen_addr: String,
    /// 수신 포트
    pub port: u16,
    /// 스크레이프 엔드포인트 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = GridbaitConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.general.device_id, "gridbait-node");
        assert!(config.relay.enabled);
        assert!(config.decoy.enabled);
        assert_eq!(config.decoy.listeners.len(), 3);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        let config = GridbaitConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn default_decoy_and_relay_share_event_log() {
        let config = GridbaitConfig::default();
        assert_eq!(config.relay.event_log_path, config.decoy.event_log_path);
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = GridbaitConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.relay.poll_interval_secs, 5);
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[relay]
sink_url = "https://sink.example.com"
poll_interval_secs = 2
"#;
        let config = GridbaitConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        // log_format은 기본값 유지
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.relay.sink_url, "https://sink.example.com");
        assert_eq!(config.relay.poll_interval_secs, 2);
    }

    #[test]
    fn from_str_full_toml() {
        let toml = r#"
[general]
log_level = "warn"
log_format = "pretty"
data_dir = "/opt/gridbait/data"
pid_file = "/opt/gridbait/gridbait.pid"
device_id = "substation-7"

[relay]
enabled = true
event_log_path = "/opt/gridbait/events.log"
offset_path = "/opt/gridbait/relay.offset"
blocklist_path = "/opt/gridbait/blocked_ips.txt"
sink_url = "http://10.0.0.2:9000"
poll_interval_secs = 3
error_backoff_secs = 30
request_timeout_secs = 5

[decoy]
enabled = true
event_log_path = "/opt/gridbait/events.log"

[[decoy.listeners]]
name = "smart-meter"
protocol = "modbus"
bind = "0.0.0.0:1502"

[[decoy.listeners]]
name = "ev-charger"
protocol = "ocpp"
bind = "0.0.0.0:8080"
canned_response = '{"status":"Accepted"}'

[metrics]
enabled = true
listen_addr = "0.0.0.0"
port = 9200
"#;
        let config = GridbaitConfig::parse(toml).unwrap();
        assert_eq!(config.general.device_id, "substation-7");
        assert_eq!(config.relay.error_backoff_secs, 30);
        assert_eq!(config.decoy.listeners.len(), 2);
        assert_eq!(
            config.decoy.listeners[1].canned_response.as_deref(),
            Some(r#"{"status":"Accepted"}"#)
        );
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.port, 9200);
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = GridbaitConfig::parse("invalid = [[[toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            GridbaitError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = GridbaitConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = GridbaitConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_empty_device_id() {
        let mut config = GridbaitConfig::default();
        config.general.device_id = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("device_id"));
    }

    #[test]
    fn validate_rejects_bad_sink_url_when_enabled() {
        let mut config = GridbaitConfig::default();
        config.relay.sink_url = "ftp://monitor.example.com".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sink_url"));
    }

    #[test]
    fn validate_accepts_bad_sink_url_when_disabled() {
        let mut config = GridbaitConfig::default();
        config.relay.enabled = false;
        config.relay.sink_url = "not-a-url".to_owned();
        // relay가 비활성화 상태면 sink_url 검증을 건너뜀
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let mut config = GridbaitConfig::default();
        config.relay.poll_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn validate_rejects_empty_listeners_when_enabled() {
        let mut config = GridbaitConfig::default();
        config.decoy.listeners.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("listeners"));
    }

    #[test]
    fn validate_rejects_unparseable_bind_addr() {
        let mut config = GridbaitConfig::default();
        config.decoy.listeners[0].bind = "not-an-addr".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("not-an-addr"));
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut config = GridbaitConfig::default();
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("GRIDBAIT_RELAY_SINK_URL", "https://override.example.com") };
        config.apply_env_overrides();
        assert_eq!(config.relay.sink_url, "https://override.example.com");
        unsafe { std::env::remove_var("GRIDBAIT_RELAY_SINK_URL") };
    }

    #[test]
    #[serial]
    fn env_override_u64_invalid_keeps_original() {
        let mut config = GridbaitConfig::default();
        let original = config.relay.poll_interval_secs;
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("GRIDBAIT_RELAY_POLL_INTERVAL_SECS", "not-a-number") };
        config.apply_env_overrides();
        assert_eq!(config.relay.poll_interval_secs, original); // 원래 값 유지
        unsafe { std::env::remove_var("GRIDBAIT_RELAY_POLL_INTERVAL_SECS") };
    }

    #[test]
    #[serial]
    fn env_override_bool() {
        let mut config = GridbaitConfig::default();
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("GRIDBAIT_RELAY_ENABLED", "false") };
        config.apply_env_overrides();
        assert!(!config.relay.enabled);
        unsafe { std::env::remove_var("GRIDBAIT_RELAY_ENABLED") };
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = GridbaitConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = GridbaitConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(config.relay.sink_url, parsed.relay.sink_url);
        assert_eq!(config.decoy.listeners.len(), parsed.decoy.listeners.len());
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = GridbaitConfig::from_file("/nonexistent/path/gridbait.toml").await;
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            GridbaitError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
