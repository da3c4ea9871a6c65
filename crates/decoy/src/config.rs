//! 디코이 설정
//!
//! core의 `[decoy]` 섹션에서 파생되는 리스너 설정입니다.
//! 바인드 주소는 여기서 `SocketAddr`로 파싱되어 기동 전에 검증됩니다.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::DecoyError;

/// 단일 디코이 리스너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// 리스너 이름 (로그와 메트릭 레이블에 사용)
    pub name: String,
    /// 흉내내는 프로토콜 이름 (modbus, iec104, ocpp 등 — 장식용 레이블)
    pub protocol: String,
    /// 바인드 주소
    pub bind: SocketAddr,
    /// 수신 페이로드에 대한 고정 응답 (없으면 무응답)
    pub canned_response: Option<String>,
}

/// 디코이 모듈 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoyConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 이벤트 로그 경로 (릴레이와 공유)
    pub event_log_path: PathBuf,
    /// 리스너 목록
    pub listeners: Vec<ListenerConfig>,
}

impl DecoyConfig {
    /// core 설정 섹션에서 디코이 설정을 생성합니다.
    ///
    /// 바인드 주소가 파싱되지 않으면 에러입니다.
    pub fn from_core(core: &gridbait_core::config::DecoyConfig) -> Result<Self, DecoyError> {
        let mut listeners = Vec::with_capacity(core.listeners.len());
        for listener in &core.listeners {
            let bind: SocketAddr = listener.bind.parse().map_err(|_| DecoyError::Config {
                field: format!("listeners.{}.bind", listener.name),
                reason: format!("invalid socket address: {}", listener.bind),
            })?;
            listeners.push(ListenerConfig {
                name: listener.name.clone(),
                protocol: listener.protocol.clone(),
                bind,
                canned_response: listener.canned_response.clone(),
            });
        }

        let config = Self {
            enabled: core.enabled,
            event_log_path: PathBuf::from(&core.event_log_path),
            listeners,
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DecoyError> {
        if self.listeners.is_empty() {
            return Err(DecoyError::Config {
                field: "listeners".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        for listener in &self.listeners {
            if listener.name.is_empty() {
                return Err(DecoyError::Config {
                    field: "listeners.name".to_owned(),
                    reason: "must not be empty".to_owned(),
                });
            }
        }

        let mut names: Vec<&str> = self.listeners.iter().map(|l| l.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.listeners.len() {
            return Err(DecoyError::Config {
                field: "listeners.name".to_owned(),
                reason: "listener names must be unique".to_owned(),
            });
        }

        Ok(())
    }
}
