//! 파이프라인 trait — 모듈 생명주기 확장 포인트
//!
//! 릴레이와 디코이 모듈은 [`Pipeline`]을 구현하여
//! `gridbait-daemon`에서 동일한 생명주기(start/stop/health_check)로
//! 관리됩니다. trait object(`Box<dyn Pipeline>`)로 레지스트리에 등록되므로
//! 메서드는 박스된 Future를 반환합니다.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::error::GridbaitError;

/// 박스된 Future 타입 별칭
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 모듈 헬스 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// 정상 동작 중
    Healthy,
    /// 동작하지만 주의 필요 (사유 포함)
    Degraded(String),
    /// 동작 불가 (사유 포함)
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 여부를 반환합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 동작 불가 상태인지 여부를 반환합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// 모듈 생명주기 trait
///
/// `start`는 백그라운드 태스크를 스폰한 뒤 즉시 반환해야 하며,
/// `stop`은 스폰된 태스크를 협력적으로 취소하고 정리될 때까지 기다립니다.
/// 이미 실행 중에 `start`를 다시 호출하면
/// [`PipelineError::AlreadyRunning`](crate::error::PipelineError)이 반환됩니다.
pub trait Pipeline: Send {
    /// 모듈 이름 (로깅 및 헬스 리포트에 사용)
    fn name(&self) -> &str;

    /// 모듈을 시작합니다.
    fn start(&mut self) -> BoxFuture<'_, Result<(), GridbaitError>>;

    /// 모듈을 정지합니다.
    fn stop(&mut self) -> BoxFuture<'_, Result<(), GridbaitError>>;

    /// 현재 헬스 상태를 반환합니다.
    fn health_check(&self) -> BoxFuture<'_, HealthStatus>;
}
