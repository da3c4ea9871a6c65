//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 디코이 서버와 릴레이 파이프라인이 공유하는 데이터 구조를 정의합니다.
//! 이벤트 로그 한 줄에서 파생되는 [`Alert`]와 주기적으로 전송되는
//! [`BlockedIpSnapshot`]이 원격 싱크로 가는 와이어 형식의 기준입니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 심각도 레벨
///
/// 분류된 알림의 심각도를 나타냅니다.
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Low < Medium < High`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 낮은 심각도 (정보성 분석 결과)
    Low,
    /// 중간 심각도 (분류되지 않은 이벤트)
    #[default]
    Medium,
    /// 높은 심각도 — 침입 또는 차단 이벤트
    High,
}

impl Severity {
    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// 알림 유형
///
/// 이벤트 로그 라인의 메시지 내용에 따라 분류됩니다.
/// 분류 규칙의 우선순위는 릴레이 크레이트의 classify 모듈이 정의합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// 침입 탐지 마커가 포함된 이벤트
    IntrusionDetected,
    /// IP 차단(또는 차단 예정) 이벤트
    IpBlocked,
    /// VPN 가능성 분석 결과
    VpnAnalysis,
    /// 분류되지 않은 이벤트 (기본값)
    #[default]
    Unknown,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntrusionDetected => write!(f, "intrusion_detected"),
            Self::IpBlocked => write!(f, "ip_blocked"),
            Self::VpnAnalysis => write!(f, "vpn_analysis"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// 구조화된 알림
///
/// 이벤트 로그 한 줄에서 파생되는 불변 레코드입니다.
/// `device_id`와 `uploaded_at`은 로그 라인이 아니라 전송 시점에
/// [`Alert::stamp`]로 채워지는 메타데이터입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// 원본 타임스탬프 접두사 (파싱하지 않고 불투명 텍스트로 전달)
    pub timestamp: String,
    /// 구분자 이후의 메시지 본문
    pub raw_message: String,
    /// 분류된 알림 유형
    pub alert_type: AlertType,
    /// 심각도
    pub severity: Severity,
    /// 차단된 IP 토큰 (`alert_type == ip_blocked`일 때만)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_ip: Option<String>,
    /// VPN 가능성 퍼센트 (`alert_type == vpn_analysis`일 때만)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpn_likelihood: Option<u8>,
    /// 전송 디바이스 식별자 (전송 시점에 스탬프)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// 전송 시각 RFC 3339 (전송 시점에 스탬프)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

impl Alert {
    /// 분류 결과만 담긴 알림을 생성합니다.
    ///
    /// 전송 메타데이터(`device_id`, `uploaded_at`)는 비워둡니다.
    pub fn new(
        timestamp: impl Into<String>,
        raw_message: impl Into<String>,
        alert_type: AlertType,
        severity: Severity,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            raw_message: raw_message.into(),
            alert_type,
            severity,
            blocked_ip: None,
            vpn_likelihood: None,
            device_id: None,
            uploaded_at: None,
        }
    }

    /// 전송 시점 메타데이터를 스탬프합니다.
    pub fn stamp(&mut self, device_id: impl Into<String>, uploaded_at: impl Into<String>) {
        self.device_id = Some(device_id.into());
        self.uploaded_at = Some(uploaded_at.into());
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.severity, self.alert_type, self.raw_message,
        )
    }
}

/// 차단 IP 스냅샷
///
/// 외부에서 관리되는 차단 목록 파일의 특정 시점 상태입니다.
/// 전송 때마다 파일에서 새로 읽으며, 로컬 상태를 유지하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedIpSnapshot {
    /// 스냅샷 생성 시각 RFC 3339
    pub timestamp: String,
    /// 현재 차단된 IP 문자열 목록
    pub blocked_ips: Vec<String>,
    /// 차단 IP 개수
    pub total_blocked: usize,
}

impl BlockedIpSnapshot {
    /// 라인 단위 목록에서 스냅샷을 생성합니다.
    ///
    /// 공백 라인은 제외하고, 각 라인의 앞뒤 공백을 제거합니다.
    pub fn from_lines(timestamp: impl Into<String>, lines: &str) -> Self {
        let blocked_ips: Vec<String> = lines
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect();
        let total_blocked = blocked_ips.len();
        Self {
            timestamp: timestamp.into(),
            blocked_ips,
            total_blocked,
        }
    }
}

impl fmt::Display for BlockedIpSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} blocked ips at {}", self.total_blocked, self.timestamp)
    }
}
