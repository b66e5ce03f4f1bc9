//! Structured estimates pulled out of an agent's generated text

use serde::{Deserialize, Serialize};

/// Qualitative risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classify a project by size (sq ft or units)
    pub fn from_project_size(size: f64) -> Self {
        if size < 50_000.0 {
            RiskLevel::Low
        } else if size < 200_000.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" | "moderate" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(format!("Unknown risk level: {}", s)),
        }
    }
}

/// Estimates extracted from one agent response; absent markers stay `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Estimates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_weeks: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub takt_time_hours: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

impl Estimates {
    pub fn is_empty(&self) -> bool {
        self.duration_weeks.is_none()
            && self.takt_time_hours.is_none()
            && self.risk_level.is_none()
            && self.recommendations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_from_size_thresholds() {
        assert_eq!(RiskLevel::from_project_size(49_999.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_project_size(50_000.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_project_size(199_999.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_project_size(200_000.0), RiskLevel::High);
    }

    #[test]
    fn test_risk_parse() {
        assert_eq!("HIGH".parse::<RiskLevel>(), Ok(RiskLevel::High));
        assert_eq!(" moderate ".parse::<RiskLevel>(), Ok(RiskLevel::Medium));
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_empty_estimates() {
        assert!(Estimates::default().is_empty());
        let estimates = Estimates {
            risk_level: Some(RiskLevel::Low),
            ..Default::default()
        };
        assert!(!estimates.is_empty());
    }
}
