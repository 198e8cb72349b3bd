use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Host metrics sample sent to the prediction backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub timestamp: String,
    pub load_1m: f64,
    pub load_5m: f64,
    pub load_15m: f64,
    pub cpu_user: f64,
    pub cpu_system: f64,
    pub cpu_iowait: f64,
    pub sys_mem_available: f64,
    pub sys_mem_total: f64,
    pub disk_io_time: f64,
    pub disk_io_read: f64,
    pub disk_io_write: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_ip: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_variety: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingDecision {
    pub action: String,
    pub confidence: f64,
    pub reason: String,
    pub source: String,
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_instances: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    pub timestamp: String,
}

impl ScalingDecision {
    pub const MAINTAIN: &'static str = "maintain";

    /// `maintain` decisions need no execution.
    pub fn requires_action(&self) -> bool {
        self.action != Self::MAINTAIN
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: String,
    pub predicted_load: f64,
    pub confidence: f64,
    pub model_used: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub forecast_hours: u32,
    pub generated_at: String,
    pub forecast: Vec<ForecastPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    #[serde(default)]
    pub models_loaded: BTreeMap<String, bool>,
    pub active_instances: u32,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResponse {
    pub timestamp: String,
    pub anomaly_detected: bool,
    pub anomaly_score: f64,
    pub model_used: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingHistoryEntry {
    pub timestamp: String,
    pub action: String,
    pub reason: String,
    pub target_instances: u32,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentLoad {
    pub cpu: f64,
    pub memory: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingStatusResponse {
    pub timestamp: String,
    pub active_instances: u32,
    #[serde(default)]
    pub scaling_history: Vec<ScalingHistoryEntry>,
    pub current_load: CurrentLoad,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingExecutionResponse {
    pub timestamp: String,
    pub action: String,
    pub success: bool,
    pub message: String,
}

/// Result of the decide-then-execute workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingOutcome {
    pub decision: ScalingDecision,
    /// `None` when the decision was `maintain`.
    pub execution: Option<ScalingExecutionResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_metric_fields_are_omitted() {
        let metrics = SystemMetrics {
            timestamp: "2024-01-01T00:00:00Z".into(),
            load_1m: 1.0,
            load_5m: 1.0,
            load_15m: 1.0,
            cpu_user: 40.0,
            cpu_system: 5.0,
            cpu_iowait: 1.0,
            sys_mem_available: 4096.0,
            sys_mem_total: 8192.0,
            disk_io_time: 3.0,
            disk_io_read: 10.0,
            disk_io_write: 5.0,
            requests_per_ip: None,
            source_variety: Some(2.0),
            source_ip: None,
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json.get("requests_per_ip").is_none());
        assert!(json.get("source_ip").is_none());
        assert_eq!(json["source_variety"], 2.0);
    }

    #[test]
    fn maintain_requires_no_action() {
        let decision: ScalingDecision = serde_json::from_str(
            r#"{"action":"maintain","confidence":0.9,"reason":"steady","source":"hybrid",
                "scores":{"rule":0.1},"timestamp":"t"}"#,
        )
        .unwrap();
        assert!(!decision.requires_action());
        assert_eq!(decision.target_instances, None);

        let scale_up = ScalingDecision {
            action: "scale_up".into(),
            ..decision
        };
        assert!(scale_up.requires_action());
    }
}
