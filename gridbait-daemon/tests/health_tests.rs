//! Health aggregation tests.
//!
//! Tests the health status aggregation logic and module health reporting.

use gridbait_core::pipeline::HealthStatus;
use gridbait_daemon::health::{ModuleHealth, aggregate_status};

fn module(name: &str, enabled: bool, status: HealthStatus) -> ModuleHealth {
    ModuleHealth {
        name: name.to_owned(),
        enabled,
        status,
    }
}

#[test]
fn test_aggregate_status_all_healthy() {
    // Given: All modules are healthy
    let modules = vec![
        module("decoy", true, HealthStatus::Healthy),
        module("relay", true, HealthStatus::Healthy),
    ];

    // When: Aggregating status
    let status = aggregate_status(&modules);

    // Then: Overall status should be Healthy
    assert!(
        status.is_healthy(),
        "all healthy modules should result in healthy status"
    );
}

#[test]
fn test_aggregate_status_one_degraded() {
    // Given: One module is degraded
    let modules = vec![
        module("decoy", true, HealthStatus::Healthy),
        module(
            "relay",
            true,
            HealthStatus::Degraded("relay loop task exited".to_owned()),
        ),
    ];

    // When: Aggregating status
    let status = aggregate_status(&modules);

    // Then: Overall status should be Degraded with the reason
    match status {
        HealthStatus::Degraded(reason) => {
            assert!(reason.contains("relay"));
            assert!(reason.contains("task exited"));
        }
        other => panic!("expected degraded, got {other:?}"),
    }
}

#[test]
fn test_aggregate_status_unhealthy_wins_over_degraded() {
    // Given: One degraded and one unhealthy module
    let modules = vec![
        module(
            "decoy",
            true,
            HealthStatus::Degraded("1/3 listener tasks exited".to_owned()),
        ),
        module("relay", true, HealthStatus::Unhealthy("not running".to_owned())),
    ];

    // When: Aggregating status
    let status = aggregate_status(&modules);

    // Then: Unhealthy takes precedence
    assert!(status.is_unhealthy());
}

#[test]
fn test_aggregate_status_ignores_disabled_modules() {
    // Given: An unhealthy module that is disabled
    let modules = vec![
        module("decoy", true, HealthStatus::Healthy),
        module("relay", false, HealthStatus::Unhealthy("not running".to_owned())),
    ];

    // When: Aggregating status
    let status = aggregate_status(&modules);

    // Then: Disabled modules do not affect the overall status
    assert!(status.is_healthy());
}

#[test]
fn test_aggregate_status_empty_is_healthy() {
    assert!(aggregate_status(&[]).is_healthy());
}

#[test]
fn test_daemon_health_serializes() {
    use gridbait_daemon::health::DaemonHealth;

    let health = DaemonHealth {
        status: HealthStatus::Healthy,
        uptime_secs: 42,
        modules: vec![module("decoy", true, HealthStatus::Healthy)],
    };

    let json = serde_json::to_string(&health).expect("should serialize");
    assert!(json.contains("\"uptime_secs\":42"));
    assert!(json.contains("decoy"));
}
