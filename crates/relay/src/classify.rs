//! 라인 분류기 — 이벤트 로그 한 줄을 구조화된 알림으로 변환
//!
//! 이벤트 로그의 각 라인은 `<timestamp> - <message>` 형식입니다.
//! 첫 번째 ` - ` 구분자에서 한 번만 분리하며, 메시지 본문에
//! 구분자가 다시 나타나도 타임스탬프는 영향을 받지 않습니다.
//!
//! # 분류 규칙
//! 규칙은 [`RULES`] 테이블에 선언된 순서대로 평가되고, 첫 매치가
//! 이깁니다. 어떤 규칙에도 매치되지 않은 라인은 `unknown`/`medium`
//! 알림으로 떨어집니다 — 분류 실패는 드롭 사유가 아닙니다.
//!
//! 추출기는 의도적으로 관대합니다. 디코이 로그의 문장이 조금
//! 바뀌어도 추출이 계속 동작하도록 엄밀한 형식 검증을 하지 않습니다.

use gridbait_core::types::{Alert, AlertType, Severity};

/// 타임스탬프와 메시지를 나누는 구분자
const FIELD_SEPARATOR: &str = " - ";

/// 단일 분류 규칙
///
/// `marker`가 메시지 본문에 포함되면 매치로 판정하고,
/// `enrich`가 추출 필드를 채웁니다.
struct ClassifyRule {
    marker: &'static str,
    alert_type: AlertType,
    severity: Severity,
    enrich: fn(&str, &mut Alert),
}

/// 분류 규칙 테이블 (선언 순서 = 우선순위)
const RULES: &[ClassifyRule] = &[
    ClassifyRule {
        marker: "ALERT: Intrusion detected!",
        alert_type: AlertType::IntrusionDetected,
        severity: Severity::High,
        enrich: enrich_none,
    },
    // "Would have blocked IP"가 "Blocked IP"보다 먼저 와야 합니다.
    // 부분 문자열 관계라 순서가 바뀌면 dry-run 이벤트가 오분류됩니다.
    ClassifyRule {
        marker: "Would have blocked IP",
        alert_type: AlertType::IpBlocked,
        severity: Severity::High,
        enrich: enrich_blocked_ip,
    },
    ClassifyRule {
        marker: "Blocked IP",
        alert_type: AlertType::IpBlocked,
        severity: Severity::High,
        enrich: enrich_blocked_ip,
    },
    ClassifyRule {
        marker: "VPN likelihood",
        alert_type: AlertType::VpnAnalysis,
        severity: Severity::Low,
        enrich: enrich_vpn_likelihood,
    },
];

fn enrich_none(_message: &str, _alert: &mut Alert) {}

fn enrich_blocked_ip(message: &str, alert: &mut Alert) {
    alert.blocked_ip = extract_ipv4_token(message);
}

fn enrich_vpn_likelihood(message: &str, alert: &mut Alert) {
    alert.vpn_likelihood = extract_percent(message);
}

/// 이벤트 로그 한 줄을 알림으로 분류합니다.
///
/// 공백뿐인 라인과 ` - ` 구분자가 없는 라인은 `None`을 반환합니다
/// (처리 대상에서 제외, 오프셋만 전진). 구분자가 있는 라인은 항상
/// `Some`을 반환합니다.
pub fn parse_line(line: &str) -> Option<Alert> {
    if line.trim().is_empty() {
        return None;
    }

    let (timestamp, message) = line.split_once(FIELD_SEPARATOR)?;

    for rule in RULES {
        if message.contains(rule.marker) {
            let mut alert = Alert::new(timestamp, message, rule.alert_type, rule.severity);
            (rule.enrich)(message, &mut alert);
            return Some(alert);
        }
    }

    Some(Alert::new(
        timestamp,
        message,
        AlertType::Unknown,
        Severity::Medium,
    ))
}

/// 메시지에서 IPv4로 보이는 첫 토큰을 찾습니다.
///
/// 정확히 세 개의 점을 포함한 첫 공백 구분 토큰을 반환합니다.
/// 옥텟 범위는 검증하지 않습니다 — 로그 문장 변형에 관대한 추출이
/// 목적이지 주소 유효성 검사가 아닙니다.
pub fn extract_ipv4_token(message: &str) -> Option<String> {
    message
        .split_whitespace()
        .find(|token| token.chars().filter(|c| *c == '.').count() == 3)
        .map(str::to_owned)
}

/// 메시지에서 첫 `%` 직전의 정수를 추출합니다.
///
/// `%` 앞에 연속된 숫자가 없거나 `u8` 범위를 넘으면 `None`입니다.
pub fn extract_percent(message: &str) -> Option<u8> {
    let before_percent = &message[..message.find('%')?];
    let digits: String = before_percent
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    digits.parse::<u8>().ok()
}
