//! 원격 싱크 HTTP 클라이언트
//!
//! 분류된 알림과 차단 IP 스냅샷을 원격 모니터링 싱크로 전송합니다.
//! URL 규칙은 `{base_url}/{endpoint}.json`이며 본문은 JSON입니다.
//!
//! 클라이언트는 재시도하지 않습니다. 실패는 릴레이 루프가 로깅하고
//! 카운트한 뒤 계속 진행합니다. at-least-once 보장은 전송 단계가
//! 끝나기 전에는 오프셋을 커밋하지 않는 루프 쪽 규칙에서 나옵니다.

use std::time::Duration;

use gridbait_core::types::{Alert, BlockedIpSnapshot};
use serde::Serialize;

use crate::error::RelayError;

/// 알림 엔드포인트 이름
pub const ENDPOINT_ALERTS: &str = "alerts";
/// 차단 IP 스냅샷 엔드포인트 이름
pub const ENDPOINT_BLOCKED_IPS: &str = "blocked_ips";

/// 원격 싱크 클라이언트
///
/// 내부적으로 커넥션 풀을 가진 [`reqwest::Client`] 하나를 재사용합니다.
#[derive(Debug, Clone)]
pub struct SinkClient {
    client: reqwest::Client,
    base_url: String,
}

impl SinkClient {
    /// 베이스 URL과 요청 타임아웃으로 클라이언트를 생성합니다.
    ///
    /// URL 끝의 `/`는 제거합니다.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::HttpClient(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { client, base_url })
    }

    /// 싱크 베이스 URL을 반환합니다.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 알림 하나를 전송합니다.
    pub async fn forward_alert(&self, alert: &Alert) -> Result<(), RelayError> {
        self.post_json(ENDPOINT_ALERTS, alert).await
    }

    /// 차단 IP 스냅샷을 전송합니다.
    pub async fn forward_snapshot(&self, snapshot: &BlockedIpSnapshot) -> Result<(), RelayError> {
        self.post_json(ENDPOINT_BLOCKED_IPS, snapshot).await
    }

    /// JSON 본문을 `{base_url}/{endpoint}.json`으로 POST합니다.
    ///
    /// 2xx가 아닌 응답은 [`RelayError::Sink`]로 돌려줍니다.
    async fn post_json<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<(), RelayError> {
        let url = format!("{}/{endpoint}.json", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| RelayError::Sink {
                endpoint: endpoint.to_owned(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Sink {
                endpoint: endpoint.to_owned(),
                reason: format!("status {status}"),
            });
        }

        tracing::debug!(endpoint, %url, "sink accepted payload");
        Ok(())
    }
}
