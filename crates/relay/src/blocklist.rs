//! 차단 목록 리더
//!
//! 차단 IP 목록 파일은 외부(디코이 측 방화벽 스크립트 등)에서
//! 관리됩니다. 릴레이는 전송할 때마다 파일을 새로 읽어 스냅샷을
//! 만들 뿐, 로컬 캐시나 diff 상태를 유지하지 않습니다.

use std::path::{Path, PathBuf};

use gridbait_core::types::BlockedIpSnapshot;

use crate::error::RelayError;

/// 차단 목록 파일 리더
#[derive(Debug, Clone)]
pub struct BlocklistReader {
    path: PathBuf,
}

impl BlocklistReader {
    /// 주어진 경로의 리더를 만듭니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 차단 목록 파일 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 현재 시점 스냅샷을 읽습니다.
    ///
    /// 파일 부재를 포함한 모든 읽기 실패는 에러입니다. 릴레이 루프는
    /// 이 에러를 로깅하고 해당 사이클의 스냅샷 전송만 건너뜁니다.
    pub async fn read_snapshot(&self) -> Result<BlockedIpSnapshot, RelayError> {
        let timestamp = chrono::Utc::now().to_rfc3339();

        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            RelayError::Blocklist {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(BlockedIpSnapshot::from_lines(timestamp, &content))
    }
}
