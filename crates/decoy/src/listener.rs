//! 디코이 TCP 리스너
//!
//! 설정된 주소마다 얇은 TCP 수락 루프 하나를 돌립니다. 프로토콜
//! 의미를 해석하지 않습니다 — 접속과 페이로드를 이벤트 로그에
//! 산문으로 남기고, 설정된 고정 응답이 있으면 그대로 돌려줄 뿐입니다.
//! 실제 프로토콜 프레이밍이 필요해지면 이 read/reply 경계에 외부
//! 프로토콜 라이브러리가 끼어듭니다.

use gridbait_core::metrics::{
    DECOY_CONNECTIONS_TOTAL, DECOY_LOG_FAILURES_TOTAL, DECOY_PAYLOADS_TOTAL, LABEL_LISTENER,
};
use metrics::counter;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::ListenerConfig;
use crate::error::DecoyError;
use crate::log::EventLogWriter;

/// 연결당 읽기 버퍼 크기
const READ_BUF_SIZE: usize = 4096;

/// 바인딩된 디코이 리스너
#[derive(Debug)]
pub struct DecoyListener {
    config: ListenerConfig,
    log: EventLogWriter,
    socket: TcpListener,
}

impl DecoyListener {
    /// 설정된 주소에 바인딩합니다.
    ///
    /// 바인딩 실패는 기동 실패로 즉시 반환됩니다.
    pub async fn bind(
        config: ListenerConfig,
        log: EventLogWriter,
    ) -> Result<Self, DecoyError> {
        let socket = TcpListener::bind(config.bind)
            .await
            .map_err(|e| DecoyError::Bind {
                listener: config.name.clone(),
                addr: config.bind.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            listener = config.name,
            protocol = config.protocol,
            addr = %config.bind,
            "decoy listener bound"
        );

        Ok(Self {
            config,
            log,
            socket,
        })
    }

    /// 실제로 바인딩된 주소를 반환합니다 (포트 0 바인딩 테스트용).
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, DecoyError> {
        Ok(self.socket.local_addr()?)
    }

    /// 취소 토큰이 내려올 때까지 연결을 수락합니다.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), DecoyError> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = self.socket.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            counter!(
                                DECOY_CONNECTIONS_TOTAL,
                                LABEL_LISTENER => self.config.name.clone(),
                            )
                            .increment(1);
                            self.on_connect(stream, peer, cancel.child_token());
                        }
                        Err(e) => {
                            tracing::warn!(
                                listener = self.config.name,
                                error = %e,
                                "accept failed"
                            );
                        }
                    }
                }
            }
        }

        tracing::info!(listener = self.config.name, "decoy listener stopped");
        Ok(())
    }

    /// 침입 알림과 접속 라인을 기록하고 연결 처리 태스크를 스폰합니다.
    fn on_connect(
        &self,
        stream: TcpStream,
        peer: std::net::SocketAddr,
        cancel: CancellationToken,
    ) {
        let session = Uuid::new_v4();
        tracing::info!(
            listener = self.config.name,
            peer = %peer,
            session = %session,
            "decoy connection accepted"
        );

        let config = self.config.clone();
        let log = self.log.clone();
        tokio::spawn(async move {
            log_or_count(
                &log,
                &format!("ALERT: Intrusion detected! from {}", peer.ip()),
            )
            .await;
            log_or_count(
                &log,
                &format!(
                    "New connection to {} decoy ({}) from {peer}, session {session}",
                    config.name, config.protocol,
                ),
            )
            .await;

            handle_connection(stream, peer, session, &config, &log, cancel).await;
        });
    }
}

/// 페이로드를 읽는 족족 기록하고 고정 응답을 돌려줍니다.
async fn handle_connection(
    mut stream: TcpStream,
    peer: std::net::SocketAddr,
    session: Uuid,
    config: &ListenerConfig,
    log: &EventLogWriter,
    cancel: CancellationToken,
) {
    let mut buf = vec![0u8; READ_BUF_SIZE];

    loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => break,
            read = stream.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!(
                        listener = config.name,
                        peer = %peer,
                        error = %e,
                        "decoy connection read failed"
                    );
                    break;
                }
            },
        };

        counter!(
            DECOY_PAYLOADS_TOTAL,
            LABEL_LISTENER => config.name.clone(),
        )
        .increment(1);
        log_or_count(
            log,
            &format!(
                "Received {n} byte {} payload on {} from {peer}, session {session}",
                config.protocol, config.name,
            ),
        )
        .await;

        if let Some(reply) = &config.canned_response {
            if let Err(e) = stream.write_all(reply.as_bytes()).await {
                tracing::debug!(
                    listener = config.name,
                    peer = %peer,
                    error = %e,
                    "canned response write failed"
                );
                break;
            }
        }
    }

    log_or_count(
        log,
        &format!(
            "Connection to {} from {peer} closed, session {session}",
            config.name,
        ),
    )
    .await;
}

/// 로그 실패는 연결을 끊을 이유가 아니므로 카운트만 합니다.
async fn log_or_count(log: &EventLogWriter, message: &str) {
    if let Err(e) = log.append(message).await {
        counter!(DECOY_LOG_FAILURES_TOTAL).increment(1);
        tracing::warn!(error = %e, "event log append failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpStream;

    fn listener_config(canned: Option<&str>) -> ListenerConfig {
        ListenerConfig {
            name: "smart-meter".to_owned(),
            protocol: "modbus".to_owned(),
            bind: "127.0.0.1:0".parse().unwrap(),
            canned_response: canned.map(str::to_owned),
        }
    }

    async fn read_log(path: &std::path::Path) -> String {
        // append는 비동기 태스크에서 일어나므로 잠깐 기다립니다
        for _ in 0..50 {
            if let Ok(content) = tokio::fs::read_to_string(path).await {
                if !content.is_empty() {
                    return content;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        String::new()
    }

    #[tokio::test]
    async fn connection_writes_intrusion_alert() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("events.log");
        let log = EventLogWriter::new(&log_path);

        let listener = DecoyListener::bind(listener_config(None), log).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(listener.run(cancel.clone()));

        let stream = TcpStream::connect(addr).await.unwrap();
        drop(stream);

        let content = read_log(&log_path).await;
        assert!(content.contains("ALERT: Intrusion detected! from 127.0.0.1"));
        assert!(content.contains("New connection to smart-meter decoy (modbus)"));

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn payload_is_logged_and_answered() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("events.log");
        let log = EventLogWriter::new(&log_path);

        let listener = DecoyListener::bind(
            listener_config(Some("{\"status\":\"Accepted\"}")),
            log,
        )
        .await
        .unwrap();
        let addr = listener.local_addr().unwrap();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(listener.run(cancel.clone()));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"\x00\x01\x00\x00\x00\x06").await.unwrap();

        let mut reply = vec![0u8; 64];
        let n = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut reply))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&reply[..n], b"{\"status\":\"Accepted\"}");

        drop(stream);
        let content = read_log(&log_path).await;
        assert!(content.contains("Received 6 byte modbus payload on smart-meter"));

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn bind_conflict_is_a_bind_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLogWriter::new(dir.path().join("events.log"));

        let first = DecoyListener::bind(listener_config(None), log.clone())
            .await
            .unwrap();
        let mut config = listener_config(None);
        config.bind = first.local_addr().unwrap();

        let err = DecoyListener::bind(config, log).await.unwrap_err();
        assert!(matches!(err, DecoyError::Bind { .. }));
    }
}
