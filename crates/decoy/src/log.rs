//! 이벤트 로그 기록기
//!
//! 디코이와 릴레이를 잇는 유일한 조율 채널입니다. 각 메시지는
//! `<timestamp> - <message>` 형식의 한 줄로 append되며, 릴레이의
//! 분류기가 첫 ` - ` 구분자에서 타임스탬프를 분리합니다.
//!
//! 파일은 매 기록마다 append 모드로 새로 엽니다. 한 줄 단위 append의
//! 원자성은 하부 파일시스템이 보장한다고 가정합니다.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::DecoyError;

/// 이벤트 로그 기록기
#[derive(Debug, Clone)]
pub struct EventLogWriter {
    path: PathBuf,
}

impl EventLogWriter {
    /// 주어진 경로의 기록기를 만듭니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 이벤트 로그 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 메시지 한 건을 `<timestamp> - <message>\n` 형식으로 append합니다.
    ///
    /// 메시지에 개행이 들어 있으면 한 줄 불변식이 깨지므로 공백으로
    /// 치환합니다.
    pub async fn append(&self, message: &str) -> Result<(), DecoyError> {
        let timestamp = chrono::Utc::now().format("%a %b %e %H:%M:%S UTC %Y");
        let message = message.replace(['\n', '\r'], " ");
        let line = format!("{timestamp} - {message}\n");

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.log_err(e))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.log_err(e))
    }

    fn log_err(&self, e: std::io::Error) -> DecoyError {
        DecoyError::Log {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_creates_and_formats_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let writer = EventLogWriter::new(&path);

        writer.append("ALERT: Intrusion detected! from 10.0.0.1").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.ends_with("ALERT: Intrusion detected! from 10.0.0.1\n"));
        let (timestamp, message) = content.trim_end().split_once(" - ").unwrap();
        assert!(!timestamp.is_empty());
        assert_eq!(message, "ALERT: Intrusion detected! from 10.0.0.1");
    }

    #[tokio::test]
    async fn append_accumulates_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let writer = EventLogWriter::new(&path);

        writer.append("first").await.unwrap();
        writer.append("second").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("first"));
        assert!(lines[1].ends_with("second"));
    }

    #[tokio::test]
    async fn embedded_newlines_are_flattened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let writer = EventLogWriter::new(&path);

        writer.append("payload\r\nwith newlines").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("payload  with newlines"));
    }

    #[tokio::test]
    async fn unwritable_path_is_log_error() {
        let writer = EventLogWriter::new("/nonexistent-dir/events.log");
        let err = writer.append("msg").await.unwrap_err();
        assert!(matches!(err, DecoyError::Log { .. }));
    }
}
