//! 로그 테일러 — 이벤트 로그의 증분 구간 읽기
//!
//! 저장된 오프셋과 현재 파일 크기를 비교해 새로 추가된 바이트 구간
//! `[offset, size)`만 정확히 읽습니다. 순수한 읽기 연산이며
//! 오프셋 저장소를 건드리지 않습니다 — 오프셋 전진은 릴레이 루프의 몫입니다.
//!
//! # 로테이션 감지
//! 파일 크기가 오프셋보다 작아지면 외부 로테이션/절단으로 판단하고
//! 오프셋 0부터 다시 읽도록 재동기화 신호를 돌려줍니다.
//! 일부 데이터를 다시 처리하는 쪽이 영원히 멈춰 있는 것보다 낫습니다.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::RelayError;

/// 한 번의 tail 읽기 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailOutcome {
    /// 이벤트 로그가 아직 존재하지 않음 — 에러가 아니라 대기 상태
    NotReady,
    /// 저장된 오프셋 이후로 새 데이터 없음
    NoGrowth,
    /// 새로 추가된 바이트 구간
    Chunk(TailChunk),
}

/// 읽어낸 증분 바이트 구간
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailChunk {
    /// 읽기 시작 오프셋
    pub start_offset: u64,
    /// 읽기 끝 오프셋 (exclusive) — 커밋 대상 값
    pub end_offset: u64,
    /// 원시 내용
    pub data: Bytes,
    /// 로테이션 재동기화로 0부터 다시 읽었는지 여부
    pub resynced: bool,
}

/// 로그 테일러
#[derive(Debug, Clone)]
pub struct LogTailer {
    path: PathBuf,
}

impl LogTailer {
    /// 주어진 이벤트 로그 경로의 테일러를 만듭니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 이벤트 로그 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 주어진 오프셋 이후의 새 내용을 읽습니다.
    ///
    /// - 로그 부재 → [`TailOutcome::NotReady`]
    /// - `size == offset` → [`TailOutcome::NoGrowth`]
    /// - `size < offset` → 재동기화: `[0, size)` 구간을 `resynced = true`로 반환
    /// - `size > offset` → `[offset, size)` 구간을 정확히 반환
    pub async fn read_from(&self, offset: u64) -> Result<TailOutcome, RelayError> {
        let size = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(TailOutcome::NotReady);
            }
            Err(e) => return Err(self.tail_err(e)),
        };

        if size == offset {
            return Ok(TailOutcome::NoGrowth);
        }

        let (start, resynced) = if size < offset {
            tracing::warn!(
                path = %self.path.display(),
                stored_offset = offset,
                current_size = size,
                "event log shrank underneath us, resyncing from offset 0"
            );
            (0, true)
        } else {
            (offset, false)
        };

        let data = self.read_range(start, size).await?;
        Ok(TailOutcome::Chunk(TailChunk {
            start_offset: start,
            // 동시 append로 파일이 더 자랐더라도 관측한 크기까지만 커밋합니다.
            end_offset: start + data.len() as u64,
            data,
            resynced,
        }))
    }

    /// `[start, end)` 바이트 구간을 읽습니다.
    async fn read_range(&self, start: u64, end: u64) -> Result<Bytes, RelayError> {
        let mut file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| self.tail_err(e))?;

        file.seek(std::io::SeekFrom::Start(start))
            .await
            .map_err(|e| self.tail_err(e))?;

        let expected = (end - start) as usize;
        let mut buf = Vec::with_capacity(expected);
        file.take(expected as u64)
            .read_to_end(&mut buf)
            .await
            .map_err(|e| self.tail_err(e))?;

        Ok(Bytes::from(buf))
    }

    fn tail_err(&self, e: std::io::Error) -> RelayError {
        RelayError::Tail {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}
