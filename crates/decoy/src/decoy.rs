//! 디코이 모듈 — 리스너 묶음의 [`Pipeline`] 생명주기 래퍼

use gridbait_core::error::{GridbaitError, PipelineError};
use gridbait_core::pipeline::{BoxFuture, HealthStatus, Pipeline};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::DecoyConfig;
use crate::error::DecoyError;
use crate::listener::DecoyListener;
use crate::log::EventLogWriter;

/// 디코이 리스너 묶음
///
/// `start`는 설정된 모든 리스너를 바인딩한 뒤 각각을 백그라운드
/// 태스크로 스폰합니다. 하나라도 바인딩에 실패하면 전체 기동이
/// 실패합니다 — 절반만 열린 디코이 네트워크는 운영자가 알아채기
/// 어렵습니다.
pub struct DecoySet {
    config: DecoyConfig,
    cancel: Option<CancellationToken>,
    handles: Vec<JoinHandle<Result<(), DecoyError>>>,
}

impl DecoySet {
    /// 검증된 설정으로 디코이 묶음을 생성합니다.
    pub fn new(config: DecoyConfig) -> Result<Self, DecoyError> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: None,
            handles: Vec::new(),
        })
    }

    /// core 설정 섹션에서 디코이 묶음을 생성합니다.
    pub fn from_core(core: &gridbait_core::config::DecoyConfig) -> Result<Self, DecoyError> {
        Self::new(DecoyConfig::from_core(core)?)
    }
}

impl Pipeline for DecoySet {
    fn name(&self) -> &str {
        "decoy"
    }

    fn start(&mut self) -> BoxFuture<'_, Result<(), GridbaitError>> {
        Box::pin(async move {
            if !self.handles.is_empty() {
                return Err(PipelineError::AlreadyRunning.into());
            }

            let log = EventLogWriter::new(&self.config.event_log_path);
            let cancel = CancellationToken::new();

            // 전부 바인딩한 뒤에야 수락을 시작합니다
            let mut bound = Vec::with_capacity(self.config.listeners.len());
            for listener_config in &self.config.listeners {
                let listener =
                    DecoyListener::bind(listener_config.clone(), log.clone()).await?;
                bound.push(listener);
            }

            for listener in bound {
                self.handles.push(tokio::spawn(listener.run(cancel.clone())));
            }

            self.cancel = Some(cancel);
            tracing::info!(listeners = self.handles.len(), "decoy set started");
            Ok(())
        })
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<(), GridbaitError>> {
        Box::pin(async move {
            if self.handles.is_empty() {
                return Err(PipelineError::NotRunning.into());
            }

            if let Some(cancel) = self.cancel.take() {
                cancel.cancel();
            }

            for handle in self.handles.drain(..) {
                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "decoy listener exited with error");
                    }
                    Err(e) => {
                        return Err(GridbaitError::Pipeline(PipelineError::TaskFailed(
                            e.to_string(),
                        )));
                    }
                }
            }

            tracing::info!("decoy set stopped");
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'_, HealthStatus> {
        Box::pin(async move {
            if self.handles.is_empty() {
                return HealthStatus::Unhealthy("not running".to_owned());
            }

            let finished = self.handles.iter().filter(|h| h.is_finished()).count();
            if finished == 0 {
                HealthStatus::Healthy
            } else if finished < self.handles.len() {
                HealthStatus::Degraded(format!(
                    "{finished}/{} listener tasks exited",
                    self.handles.len(),
                ))
            } else {
                HealthStatus::Unhealthy("all listener tasks exited".to_owned())
            }
        })
    }
}
