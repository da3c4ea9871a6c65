//! 릴레이 파이프라인 에러 타입
//!
//! [`RelayError`]는 릴레이 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<RelayError> for GridbaitError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 전송 실패([`RelayError::Sink`])는 사이클을 중단시키지 않는
//! 일시적 실패로 취급되며, 릴레이 루프가 로깅 후 계속 진행합니다.

use gridbait_core::error::{GridbaitError, PipelineError};

/// 릴레이 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// 오프셋 파일 읽기/쓰기/파싱 실패
    #[error("offset store error: {path}: {reason}")]
    Offset {
        /// 오프셋 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 이벤트 로그 읽기 실패 (부재는 에러가 아니라 NotReady)
    #[error("tail error: {path}: {reason}")]
    Tail {
        /// 이벤트 로그 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 싱크 전송 실패 (네트워크, 타임아웃, 비성공 상태 코드)
    #[error("sink delivery failed: {endpoint}: {reason}")]
    Sink {
        /// 싱크 엔드포인트 (alerts, blocked_ips)
        endpoint: String,
        /// 실패 사유
        reason: String,
    },

    /// 차단 목록 파일 읽기 실패
    #[error("blocklist error: {path}: {reason}")]
    Blocklist {
        /// 차단 목록 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// HTTP 클라이언트 생성 실패
    #[error("http client error: {0}")]
    HttpClient(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RelayError> for GridbaitError {
    fn from(err: RelayError) -> Self {
        GridbaitError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_error_display() {
        let err = RelayError::Offset {
            path: "/var/lib/gridbait/relay.offset".to_owned(),
            reason: "invalid digit found in string".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("relay.offset"));
        assert!(msg.contains("invalid digit"));
    }

    #[test]
    fn sink_error_display() {
        let err = RelayError::Sink {
            endpoint: "alerts".to_owned(),
            reason: "status 503".to_owned(),
        };
        assert!(err.to_string().contains("alerts"));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn converts_to_gridbait_error() {
        let err = RelayError::Config {
            field: "sink_url".to_owned(),
            reason: "must not be empty".to_owned(),
        };
        let top: GridbaitError = err.into();
        assert!(matches!(top, GridbaitError::Pipeline(_)));
    }
}
