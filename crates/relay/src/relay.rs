//! 릴레이 루프 — tail → 분류 → 전송 → 커밋 상태 머신
//!
//! 이벤트 로그를 폴링 주기마다 확인하고, 새 구간을 알림으로 분류해
//! 원격 싱크로 전송한 뒤 오프셋을 커밋합니다. 커밋은 전송 단계가
//! 끝난 뒤에만 일어나므로, 크래시 시 일부 알림이 중복 전송될 수는
//! 있어도 유실되지는 않습니다 (at-least-once).
//!
//! [`RelayLoop::run_cycle`]는 상태 머신을 정확히 한 사이클 진행하는
//! 단일 스텝 API로, 테스트가 시간 경과 없이 각 단계를 검증할 수 있게
//! 합니다. [`RelayLoop::run`]은 취소 토큰이 내려올 때까지 사이클을
//! 반복하는 운영용 드라이버입니다.

use std::time::Duration;

use gridbait_core::error::{GridbaitError, PipelineError};
use gridbait_core::metrics::{
    LABEL_ALERT_TYPE, LABEL_ENDPOINT, LABEL_SEVERITY, RELAY_ALERTS_FORWARDED_TOTAL,
    RELAY_BACKOFFS_TOTAL,
    RELAY_COMMITTED_OFFSET, RELAY_CYCLES_TOTAL, RELAY_DELIVERY_FAILURES_TOTAL,
    RELAY_LINES_DROPPED_TOTAL, RELAY_LINES_PROCESSED_TOTAL,
};
use gridbait_core::pipeline::{BoxFuture, HealthStatus, Pipeline};
use gridbait_core::types::Alert;
use metrics::{counter, gauge};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::blocklist::BlocklistReader;
use crate::classify::parse_line;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::offset::OffsetStore;
use crate::sink::{ENDPOINT_ALERTS, ENDPOINT_BLOCKED_IPS, SinkClient};
use crate::tailer::{LogTailer, TailOutcome};

/// 릴레이 상태 머신의 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelayState {
    /// 다음 폴링까지 대기
    #[default]
    Idle,
    /// 이벤트 로그 크기 확인
    Checking,
    /// 새 구간 읽기
    Reading,
    /// 라인 분류
    Parsing,
    /// 싱크 전송
    Delivering,
    /// 오프셋 커밋
    Committing,
    /// 사이클 실패 후 백오프 대기
    ErrorBackoff,
}

/// 한 사이클의 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 이벤트 로그가 아직 없음
    NotReady,
    /// 새 데이터 없음
    NoGrowth,
    /// 구간 하나를 처리하고 커밋함
    Processed {
        /// 읽어들인 라인 수
        lines: usize,
        /// 드롭된 라인 수 (공백, 구분자 없음)
        dropped: usize,
        /// 전송 성공한 알림 수
        delivered: usize,
        /// 전송 실패한 알림 수
        failed: usize,
        /// 커밋된 오프셋
        committed_offset: u64,
    },
}

/// 릴레이 루프
pub struct RelayLoop {
    config: RelayConfig,
    tailer: LogTailer,
    offsets: OffsetStore,
    blocklist: BlocklistReader,
    sink: SinkClient,
    offset: u64,
    state: RelayState,
}

impl RelayLoop {
    /// 검증된 설정으로 릴레이 루프를 생성합니다.
    ///
    /// 오프셋은 [`RelayLoop::load_offset`]이 호출될 때까지 0입니다.
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        config.validate()?;

        let sink = SinkClient::new(
            config.sink_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;

        Ok(Self {
            tailer: LogTailer::new(&config.event_log_path),
            offsets: OffsetStore::new(&config.offset_path),
            blocklist: BlocklistReader::new(&config.blocklist_path),
            sink,
            offset: 0,
            state: RelayState::Idle,
            config,
        })
    }

    /// 현재 상태를 반환합니다.
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// 마지막으로 커밋된 오프셋(메모리 값)을 반환합니다.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 저장소에서 마지막 커밋 오프셋을 읽어 재개 지점을 복원합니다.
    pub async fn load_offset(&mut self) -> Result<(), RelayError> {
        self.offset = self.offsets.load().await?;
        tracing::info!(offset = self.offset, "resuming from committed offset");
        Ok(())
    }

    /// 상태 머신을 정확히 한 사이클 진행합니다.
    ///
    /// `Checking → Reading → Parsing → Delivering → Committing` 순서로
    /// 진행하며, 개별 알림의 전송 실패는 사이클을 중단시키지 않습니다.
    /// 반환된 에러는 호출자([`RelayLoop::run`])가 백오프로 처리합니다.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, RelayError> {
        self.state = RelayState::Checking;
        let chunk = match self.tailer.read_from(self.offset).await? {
            TailOutcome::NotReady => {
                self.state = RelayState::Idle;
                return Ok(CycleOutcome::NotReady);
            }
            TailOutcome::NoGrowth => {
                self.state = RelayState::Idle;
                counter!(RELAY_CYCLES_TOTAL).increment(1);
                return Ok(CycleOutcome::NoGrowth);
            }
            TailOutcome::Chunk(chunk) => chunk,
        };

        self.state = RelayState::Reading;
        let text = String::from_utf8_lossy(&chunk.data);

        self.state = RelayState::Parsing;
        let (alerts, lines, dropped) = self.parse_chunk(&text);

        self.state = RelayState::Delivering;
        let (delivered, failed) = self.deliver(&alerts).await;
        self.forward_blocklist().await;

        self.state = RelayState::Committing;
        self.offsets.commit(chunk.end_offset).await?;
        self.offset = chunk.end_offset;
        gauge!(RELAY_COMMITTED_OFFSET).set(self.offset as f64);
        counter!(RELAY_CYCLES_TOTAL).increment(1);

        tracing::debug!(
            lines,
            dropped,
            delivered,
            failed,
            committed_offset = self.offset,
            "relay cycle complete"
        );

        self.state = RelayState::Idle;
        Ok(CycleOutcome::Processed {
            lines,
            dropped,
            delivered,
            failed,
            committed_offset: chunk.end_offset,
        })
    }

    /// 전체 로그를 처음부터 한 번 처리하고 오프셋을 덮어씁니다.
    ///
    /// 싱크 도입 전에 쌓인 이벤트를 일괄 재전송하는 부트스트랩/복구
    /// 모드입니다.
    pub async fn backfill(&mut self) -> Result<CycleOutcome, RelayError> {
        tracing::info!(
            path = %self.config.event_log_path.display(),
            "backfill: reprocessing entire event log from offset 0"
        );
        self.offset = 0;
        self.run_cycle().await
    }

    /// 취소 토큰이 내려올 때까지 폴링 주기마다 사이클을 실행합니다.
    ///
    /// 사이클이 에러를 반환하면 [`RelayState::ErrorBackoff`]로 전환하고
    /// 폴링 주기 대신 더 긴 백오프 시간만큼 대기한 뒤 재시도합니다.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), RelayError> {
        self.load_offset().await?;

        let poll = Duration::from_secs(self.config.poll_interval_secs);
        let backoff = Duration::from_secs(self.config.error_backoff_secs);
        tracing::info!(
            path = %self.config.event_log_path.display(),
            sink = self.sink.base_url(),
            poll_secs = self.config.poll_interval_secs,
            "relay loop started"
        );

        loop {
            let sleep_for = match self.run_cycle().await {
                Ok(_) => poll,
                Err(e) => {
                    self.state = RelayState::ErrorBackoff;
                    counter!(RELAY_BACKOFFS_TOTAL).increment(1);
                    tracing::error!(
                        error = %e,
                        backoff_secs = self.config.error_backoff_secs,
                        "relay cycle failed, backing off"
                    );
                    backoff
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }

        tracing::info!("relay loop stopped");
        Ok(())
    }

    /// 구간을 라인 단위로 분류하고 전송 메타데이터를 스탬프합니다.
    fn parse_chunk(&self, text: &str) -> (Vec<Alert>, usize, usize) {
        let uploaded_at = chrono::Utc::now().to_rfc3339();
        let mut alerts = Vec::new();
        let mut lines = 0usize;
        let mut dropped = 0usize;

        for line in text.lines() {
            lines += 1;
            counter!(RELAY_LINES_PROCESSED_TOTAL).increment(1);

            match parse_line(line) {
                Some(mut alert) => {
                    alert.stamp(&self.config.device_id, &uploaded_at);
                    alerts.push(alert);
                }
                None => {
                    dropped += 1;
                    counter!(RELAY_LINES_DROPPED_TOTAL).increment(1);
                    if !line.trim().is_empty() {
                        tracing::warn!(line, "dropping malformed event log line");
                    }
                }
            }
        }

        (alerts, lines, dropped)
    }

    /// 알림을 하나씩 독립적으로 전송합니다. 실패는 카운트만 합니다.
    async fn deliver(&self, alerts: &[Alert]) -> (usize, usize) {
        let mut delivered = 0usize;
        let mut failed = 0usize;

        for alert in alerts {
            match self.sink.forward_alert(alert).await {
                Ok(()) => {
                    delivered += 1;
                    counter!(
                        RELAY_ALERTS_FORWARDED_TOTAL,
                        LABEL_ALERT_TYPE => alert.alert_type.to_string(),
                        LABEL_SEVERITY => alert.severity.to_string(),
                    )
                    .increment(1);
                }
                Err(e) => {
                    failed += 1;
                    counter!(
                        RELAY_DELIVERY_FAILURES_TOTAL,
                        LABEL_ENDPOINT => ENDPOINT_ALERTS,
                    )
                    .increment(1);
                    tracing::warn!(error = %e, alert = %alert, "alert delivery failed");
                }
            }
        }

        (delivered, failed)
    }

    /// 차단 목록을 새로 읽어 스냅샷으로 전송합니다.
    ///
    /// 읽기/전송 실패는 이번 사이클의 스냅샷만 건너뜁니다.
    async fn forward_blocklist(&self) {
        let snapshot = match self.blocklist.read_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "skipping blocklist snapshot");
                return;
            }
        };

        if let Err(e) = self.sink.forward_snapshot(&snapshot).await {
            counter!(
                RELAY_DELIVERY_FAILURES_TOTAL,
                LABEL_ENDPOINT => ENDPOINT_BLOCKED_IPS,
            )
            .increment(1);
            tracing::warn!(error = %e, "blocklist snapshot delivery failed");
        }
    }
}

/// 릴레이 모듈 — [`Pipeline`] 생명주기 래퍼
///
/// `start`는 릴레이 루프를 백그라운드 태스크로 스폰하고,
/// `stop`은 취소 토큰으로 협력적으로 종료시킨 뒤 합류합니다.
pub struct RelayService {
    config: RelayConfig,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<Result<(), RelayError>>>,
}

impl RelayService {
    /// 설정을 검증하고 서비스를 생성합니다.
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: None,
            handle: None,
        })
    }
}

impl Pipeline for RelayService {
    fn name(&self) -> &str {
        "relay"
    }

    fn start(&mut self) -> BoxFuture<'_, Result<(), GridbaitError>> {
        Box::pin(async move {
            if self.handle.is_some() {
                return Err(PipelineError::AlreadyRunning.into());
            }

            let relay = RelayLoop::new(self.config.clone())?;
            let cancel = CancellationToken::new();
            let handle = tokio::spawn(relay.run(cancel.clone()));

            self.cancel = Some(cancel);
            self.handle = Some(handle);
            tracing::info!("relay service started");
            Ok(())
        })
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<(), GridbaitError>> {
        Box::pin(async move {
            let Some(handle) = self.handle.take() else {
                return Err(PipelineError::NotRunning.into());
            };

            if let Some(cancel) = self.cancel.take() {
                cancel.cancel();
            }

            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "relay loop exited with error");
                }
                Err(e) => {
                    return Err(
                        GridbaitError::Pipeline(PipelineError::TaskFailed(e.to_string())),
                    );
                }
            }

            tracing::info!("relay service stopped");
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'_, HealthStatus> {
        Box::pin(async move {
            match &self.handle {
                None => HealthStatus::Unhealthy("not running".to_owned()),
                Some(handle) if handle.is_finished() => {
                    HealthStatus::Degraded("relay loop task exited".to_owned())
                }
                Some(_) => HealthStatus::Healthy,
            }
        })
    }
}
