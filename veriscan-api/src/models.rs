//! Shared domain types for analysis records and products

use serde::{Deserialize, Serialize};

/// What kind of analysis a record captures; fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    ProductScan,
    AdAnalysis,
}

impl AnalysisKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisKind::ProductScan => "product_scan",
            AnalysisKind::AdAnalysis => "ad_analysis",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "product_scan" => Some(AnalysisKind::ProductScan),
            "ad_analysis" => Some(AnalysisKind::AdAnalysis),
            _ => None,
        }
    }
}

/// Analysis record lifecycle
///
/// Pipelines create records directly in `Processing`; `Pending` exists only
/// as the schema-level default and is never entered by the orchestrator.
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AnalysisStatus::Pending),
            "processing" => Some(AnalysisStatus::Processing),
            "completed" => Some(AnalysisStatus::Completed),
            "failed" => Some(AnalysisStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

/// Severity assigned to a detected claim by the claim-detection workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One evaluated marketing claim
///
/// Distinct from `Product::claims`, which are claims the product *declares*;
/// these are claims the workflow engine detected and judged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedClaim {
    pub text: String,
    pub issue: String,
    pub severity: Severity,
    pub verified: bool,
}

/// Fixed-shape nutrition record on a canonical product; every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_wire_strings() {
        assert_eq!(AnalysisKind::parse("ad_analysis"), Some(AnalysisKind::AdAnalysis));
        assert_eq!(AnalysisKind::AdAnalysis.as_str(), "ad_analysis");
        assert_eq!(AnalysisKind::parse("unknown"), None);
    }

    #[test]
    fn test_status_terminality() {
        assert!(AnalysisStatus::Completed.is_terminal());
        assert!(AnalysisStatus::Failed.is_terminal());
        assert!(!AnalysisStatus::Processing.is_terminal());
        assert!(!AnalysisStatus::Pending.is_terminal());
    }

    #[test]
    fn test_claim_serde_uses_lowercase_severity() {
        let claim = DetectedClaim {
            text: "100% Natural".to_string(),
            issue: "Contains artificial ingredients".to_string(),
            severity: Severity::High,
            verified: false,
        };
        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["severity"], "high");
        assert_eq!(json["text"], "100% Natural");
    }
}
