//! 오프셋 저장소 — 처리 완료 지점의 내구성 커서
//!
//! 이벤트 로그에서 이미 처리한 바이트 수를 작은 파일에 십진수로 보관합니다.
//! 커밋은 임시 파일에 쓴 뒤 rename하는 방식이라 전부-아니면-전무입니다.
//! 부분적으로 쓰인 오프셋이 남을 수 없으므로, 크래시 후 재시작해도
//! 마지막으로 커밋된 지점에서 정확히 이어집니다.

use std::path::{Path, PathBuf};

use crate::error::RelayError;

/// 오프셋 저장소
///
/// 파일이 없으면 0에서 시작합니다(첫 실행).
/// 내용이 십진수가 아니면 에러입니다 — 손상된 오프셋을 조용히 0으로
/// 되돌리면 전체 로그가 재전송되므로, 운영자 개입을 요구합니다.
#[derive(Debug, Clone)]
pub struct OffsetStore {
    path: PathBuf,
}

impl OffsetStore {
    /// 주어진 경로의 오프셋 저장소를 만듭니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 저장소 파일 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 마지막으로 커밋된 오프셋을 읽습니다.
    ///
    /// 파일이 없으면 0을 반환합니다.
    pub async fn load(&self) -> Result<u64, RelayError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(RelayError::Offset {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        content.trim().parse::<u64>().map_err(|e| RelayError::Offset {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// 오프셋을 내구성 있게 커밋합니다.
    ///
    /// 임시 파일에 쓴 뒤 rename합니다. rename은 원자적이므로
    /// 커밋 도중 취소되거나 크래시해도 이전 값이 그대로 남습니다.
    pub async fn commit(&self, offset: u64) -> Result<(), RelayError> {
        let tmp_path = self.path.with_extension("offset.tmp");

        tokio::fs::write(&tmp_path, offset.to_string())
            .await
            .map_err(|e| RelayError::Offset {
                path: tmp_path.display().to_string(),
                reason: e.to_string(),
            })?;

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| RelayError::Offset {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = OffsetStore::new(dir.path().join("relay.offset"));
        assert_eq!(store.load().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn commit_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = OffsetStore::new(dir.path().join("relay.offset"));

        store.commit(1234).await.unwrap();
        assert_eq!(store.load().await.unwrap(), 1234);

        store.commit(5678).await.unwrap();
        assert_eq!(store.load().await.unwrap(), 5678);
    }

    #[tokio::test]
    async fn load_trims_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.offset");
        tokio::fs::write(&path, "42\n").await.unwrap();

        let store = OffsetStore::new(&path);
        assert_eq!(store.load().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn malformed_content_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.offset");
        tokio::fs::write(&path, "not-a-number").await.unwrap();

        let store = OffsetStore::new(&path);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, RelayError::Offset { .. }));
    }

    #[tokio::test]
    async fn commit_leaves_no_tmp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.offset");
        let store = OffsetStore::new(&path);

        store.commit(99).await.unwrap();
        assert!(!path.with_extension("offset.tmp").exists());
    }
}
