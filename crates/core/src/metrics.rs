//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `gridbait_`
//! - 모듈명: `relay_`, `decoy_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(gridbait_core::metrics::RELAY_ALERTS_FORWARDED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 알림 유형 레이블 키 (intrusion_detected, ip_blocked, vpn_analysis, unknown)
pub const LABEL_ALERT_TYPE: &str = "alert_type";

/// 심각도 레이블 키 (low, medium, high)
pub const LABEL_SEVERITY: &str = "severity";

/// 싱크 엔드포인트 레이블 키 (alerts, blocked_ips)
pub const LABEL_ENDPOINT: &str = "endpoint";

/// 디코이 리스너 이름 레이블 키
pub const LABEL_LISTENER: &str = "listener";

// ─── Relay 메트릭 ──────────────────────────────────────────────────

/// Relay: 처리된 이벤트 로그 라인 수 (counter)
pub const RELAY_LINES_PROCESSED_TOTAL: &str = "gridbait_relay_lines_processed_total";

/// Relay: 구분자 없음 등으로 드롭된 라인 수 (counter)
pub const RELAY_LINES_DROPPED_TOTAL: &str = "gridbait_relay_lines_dropped_total";

/// Relay: 싱크로 전송 성공한 알림 수 (counter, labels: alert_type, severity)
pub const RELAY_ALERTS_FORWARDED_TOTAL: &str = "gridbait_relay_alerts_forwarded_total";

/// Relay: 싱크 전송 실패 수 (counter, label: endpoint)
pub const RELAY_DELIVERY_FAILURES_TOTAL: &str = "gridbait_relay_delivery_failures_total";

/// Relay: 완료된 폴링 사이클 수 (counter)
pub const RELAY_CYCLES_TOTAL: &str = "gridbait_relay_cycles_total";

/// Relay: 에러 백오프 진입 횟수 (counter)
pub const RELAY_BACKOFFS_TOTAL: &str = "gridbait_relay_backoffs_total";

/// Relay: 커밋된 바이트 오프셋 (gauge)
pub const RELAY_COMMITTED_OFFSET: &str = "gridbait_relay_committed_offset";

// ─── Daemon 메트릭 ─────────────────────────────────────────────────

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "gridbait_daemon_build_info";

/// Daemon: 등록된 모듈 수 (gauge)
pub const DAEMON_MODULES_REGISTERED: &str = "gridbait_daemon_modules_registered";

/// Daemon: 기동 후 경과 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "gridbait_daemon_uptime_seconds";

// ─── Decoy 메트릭 ──────────────────────────────────────────────────

/// Decoy: 수락된 연결 수 (counter, label: listener)
pub const DECOY_CONNECTIONS_TOTAL: &str = "gridbait_decoy_connections_total";

/// Decoy: 수신한 페이로드 수 (counter, label: listener)
pub const DECOY_PAYLOADS_TOTAL: &str = "gridbait_decoy_payloads_total";

/// Decoy: 이벤트 로그 기록 실패 수 (counter)
pub const DECOY_LOG_FAILURES_TOTAL: &str = "gridbait_decoy_log_failures_total";

/// 모든 메트릭의 설명을 레코더에 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        RELAY_LINES_PROCESSED_TOTAL,
        "Event log lines read and classified by the relay loop"
    );
    describe_counter!(
        RELAY_LINES_DROPPED_TOTAL,
        "Event log lines dropped as blank or malformed"
    );
    describe_counter!(
        RELAY_ALERTS_FORWARDED_TOTAL,
        "Alerts successfully delivered to the remote sink"
    );
    describe_counter!(
        RELAY_DELIVERY_FAILURES_TOTAL,
        "Failed delivery attempts against the remote sink"
    );
    describe_counter!(RELAY_CYCLES_TOTAL, "Completed relay poll cycles");
    describe_counter!(RELAY_BACKOFFS_TOTAL, "Relay error-backoff entries");
    describe_gauge!(
        RELAY_COMMITTED_OFFSET,
        "Last committed byte offset into the event log"
    );

    describe_gauge!(DAEMON_BUILD_INFO, "Daemon build information");
    describe_gauge!(DAEMON_MODULES_REGISTERED, "Registered daemon modules");
    describe_gauge!(DAEMON_UPTIME_SECONDS, "Daemon uptime in seconds");

    describe_counter!(
        DECOY_CONNECTIONS_TOTAL,
        "Connections accepted by decoy listeners"
    );
    describe_counter!(
        DECOY_PAYLOADS_TOTAL,
        "Payloads received on decoy connections"
    );
    describe_counter!(
        DECOY_LOG_FAILURES_TOTAL,
        "Event log append failures in decoy listeners"
    );
}
