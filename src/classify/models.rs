//! Data models for issue classification

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Categories of regression issues.
///
/// The taxonomy is closed and immutable at runtime; extending it requires
/// redeploying the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    CompilationError,
    SyntaxError,
    LinkingError,
    BuildFailure,
    Timeout,
    ResourceError,
    RuntimeError,
    ContactFailure,
    MeasurementError,
    CalibrationError,
    DeviceError,
    ConfigError,
    FileError,
    PermissionError,
}

impl IssueCategory {
    /// All categories, in declaration order
    pub const ALL: [IssueCategory; 14] = [
        IssueCategory::CompilationError,
        IssueCategory::SyntaxError,
        IssueCategory::LinkingError,
        IssueCategory::BuildFailure,
        IssueCategory::Timeout,
        IssueCategory::ResourceError,
        IssueCategory::RuntimeError,
        IssueCategory::ContactFailure,
        IssueCategory::MeasurementError,
        IssueCategory::CalibrationError,
        IssueCategory::DeviceError,
        IssueCategory::ConfigError,
        IssueCategory::FileError,
        IssueCategory::PermissionError,
    ];

    /// Stable string form (snake_case, matches serde)
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::CompilationError => "compilation_error",
            IssueCategory::SyntaxError => "syntax_error",
            IssueCategory::LinkingError => "linking_error",
            IssueCategory::BuildFailure => "build_failure",
            IssueCategory::Timeout => "timeout",
            IssueCategory::ResourceError => "resource_error",
            IssueCategory::RuntimeError => "runtime_error",
            IssueCategory::ContactFailure => "contact_failure",
            IssueCategory::MeasurementError => "measurement_error",
            IssueCategory::CalibrationError => "calibration_error",
            IssueCategory::DeviceError => "device_error",
            IssueCategory::ConfigError => "config_error",
            IssueCategory::FileError => "file_error",
            IssueCategory::PermissionError => "permission_error",
        }
    }

    /// Keyword signature for the rule-based classifier.
    ///
    /// Longer phrases are more specific and score higher when matched.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            IssueCategory::CompilationError => &[
                "compilation error",
                "compile error",
                "compilation failed",
                "compiler error",
                "compilation terminated",
                "cannot find header",
            ],
            IssueCategory::SyntaxError => &[
                "syntax error",
                "parse error",
                "unexpected token",
                "missing semicolon",
                "undeclared identifier",
                "missing closing brace",
            ],
            IssueCategory::LinkingError => &[
                "link error",
                "linking failed",
                "undefined reference",
                "cannot find symbol",
                "linker error",
                "cannot find library",
            ],
            IssueCategory::BuildFailure => &[
                "build failed",
                "build error",
                "make error",
                "build target failed",
            ],
            IssueCategory::Timeout => &[
                "timeout",
                "timed out",
                "time out",
                "execution timeout",
                "did not complete",
            ],
            IssueCategory::ResourceError => &[
                "out of memory",
                "memory error",
                "disk space",
                "resource not available",
                "resource allocation failed",
            ],
            IssueCategory::RuntimeError => &[
                "runtime error",
                "runtime exception",
                "null pointer",
                "segmentation fault",
                "core dumped",
            ],
            IssueCategory::ContactFailure => &[
                "contact failure",
                "contact error",
                "pin contact",
                "contact resistance",
                "open contact",
                "short contact",
                "contact force",
            ],
            IssueCategory::MeasurementError => &[
                "measurement error",
                "measurement failed",
                "invalid measurement",
                "measurement timeout",
                "measurement overflow",
                "value out of range",
            ],
            IssueCategory::CalibrationError => &[
                "calibration error",
                "calibration failed",
                "cal error",
                "calibration timeout",
                "calibration drift",
            ],
            IssueCategory::DeviceError => &[
                "device error",
                "device not found",
                "device failure",
                "device not responding",
                "device communication",
                "hardware malfunction",
            ],
            IssueCategory::ConfigError => &[
                "config error",
                "configuration file",
                "invalid parameter",
                "environment variable not set",
                "parameter out of range",
            ],
            IssueCategory::FileError => &[
                "file not found",
                "file error",
                "cannot open file",
                "file corrupted",
                "invalid file format",
            ],
            IssueCategory::PermissionError => &[
                "permission denied",
                "access denied",
                "insufficient privileges",
                "permission error",
                "authorization failed",
            ],
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueCategory {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueCategory::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| EngineError::UnknownCategory(s.to_string()))
    }
}

/// A single ranked category with its blended confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: IssueCategory,
    /// Blended confidence in [0, 1]
    pub confidence: f32,
    /// Raw supporting-evidence score from the contributing sub-classifier(s)
    pub evidence: f32,
}

/// Which sub-classifier(s) produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierSource {
    Rules,
    Statistical,
    Blended,
}

/// Result of a classification call.
///
/// An empty `ranked` list (and `primary == None`) means "unknown" — a valid
/// outcome for text that matches nothing, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub text: String,
    /// Categories ordered by non-increasing confidence
    pub ranked: Vec<CategoryScore>,
    pub primary: Option<IssueCategory>,
    pub source: ClassifierSource,
}

impl ClassificationResult {
    /// Confidence of the primary category, zero when unknown
    pub fn confidence(&self) -> f32 {
        self.ranked.first().map(|s| s.confidence).unwrap_or(0.0)
    }
}

/// A labeled training example
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledExample {
    pub text: String,
    pub category: IssueCategory,
}

impl LabeledExample {
    pub fn new(text: impl Into<String>, category: IssueCategory) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }
}

/// Report returned by a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Ensemble accuracy on the holdout split (training split if holdout empty)
    pub accuracy: f32,
    pub feature_count: usize,
    pub examples_used: usize,
    pub class_count: usize,
    pub trained_at: DateTime<Utc>,
}

/// Metadata about the currently loaded statistical model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub trained: bool,
    pub trained_at: Option<DateTime<Utc>>,
    pub feature_count: usize,
    pub classes: Vec<IssueCategory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip_via_str() {
        for category in IssueCategory::ALL {
            let parsed: IssueCategory = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_unknown_category_rejected() {
        let result = "quantum_flux_error".parse::<IssueCategory>();
        assert!(matches!(result, Err(EngineError::UnknownCategory(_))));
    }

    #[test]
    fn test_every_category_has_keywords() {
        for category in IssueCategory::ALL {
            assert!(!category.keywords().is_empty(), "{} has no keywords", category);
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&IssueCategory::ContactFailure).unwrap();
        assert_eq!(json, "\"contact_failure\"");
    }
}
