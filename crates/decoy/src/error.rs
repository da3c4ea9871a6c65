//! 디코이 모듈 에러 타입

use gridbait_core::error::{GridbaitError, PipelineError};

/// 디코이 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum DecoyError {
    /// 리스너 소켓 바인딩 실패
    #[error("bind failed for listener {listener} on {addr}: {reason}")]
    Bind {
        /// 리스너 이름
        listener: String,
        /// 바인드 주소
        addr: String,
        /// 실패 사유
        reason: String,
    },

    /// 이벤트 로그 기록 실패
    #[error("event log append failed: {path}: {reason}")]
    Log {
        /// 이벤트 로그 경로
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

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DecoyError> for GridbaitError {
    fn from(err: DecoyError) -> Self {
        GridbaitError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}
