//! Built-in seed training examples
//!
//! A compact, repo-owned labeled set covering every taxonomy category, used
//! for cold-start training before field-labeled data accumulates.

use super::models::{IssueCategory, LabeledExample};

/// Seed examples, at least three per category
pub fn seed_examples() -> Vec<LabeledExample> {
    use IssueCategory::*;

    let samples: &[(&str, IssueCategory)] = &[
        // Compilation
        ("compilation error undefined symbol test_function", CompilationError),
        ("compiler error in module source file", CompilationError),
        ("compilation terminated due to errors", CompilationError),
        ("compiler cannot find header file", CompilationError),
        // Syntax
        ("syntax error expected semicolon before token", SyntaxError),
        ("parse error unexpected end of file", SyntaxError),
        ("missing closing brace in function body", SyntaxError),
        // Linking
        ("linker error undefined reference to main", LinkingError),
        ("linking failed cannot find library", LinkingError),
        ("undefined reference to external function", LinkingError),
        // Build
        ("build failed make error in target", BuildFailure),
        ("build target failed with nonzero exit", BuildFailure),
        ("make error while building test program", BuildFailure),
        // Timeout
        ("test execution timeout after 300 seconds", Timeout),
        ("connection timeout while accessing device", Timeout),
        ("operation timed out waiting for response", Timeout),
        ("test did not complete before deadline", Timeout),
        // Resource
        ("out of memory during test execution", ResourceError),
        ("disk space insufficient for log files", ResourceError),
        ("resource allocation failed on tester", ResourceError),
        // Runtime
        ("runtime error null pointer exception", RuntimeError),
        ("segmentation fault in test code", RuntimeError),
        ("runtime exception during execution", RuntimeError),
        // Contact
        ("contact failure detected on pin 5", ContactFailure),
        ("pin contact resistance out of specification", ContactFailure),
        ("open contact detected during test", ContactFailure),
        ("contact force insufficient on probe", ContactFailure),
        // Measurement
        ("measurement error value out of range", MeasurementError),
        ("invalid measurement result from adc", MeasurementError),
        ("measurement overflow in current test", MeasurementError),
        // Calibration
        ("calibration drift detected on instrument", CalibrationError),
        ("calibration failed for measurement unit", CalibrationError),
        ("calibration timeout occurred during warmup", CalibrationError),
        // Device
        ("device not responding to commands", DeviceError),
        ("device communication error on bus", DeviceError),
        ("device hardware malfunction detected", DeviceError),
        // Config
        ("invalid parameter value in config", ConfigError),
        ("configuration file corrupted or missing keys", ConfigError),
        ("environment variable not set for session", ConfigError),
        // File
        ("file not found test data missing", FileError),
        ("cannot open configuration file", FileError),
        ("file corrupted during transfer", FileError),
        // Permission
        ("file permission denied on results directory", PermissionError),
        ("access denied to device node", PermissionError),
        ("insufficient privileges for operation", PermissionError),
    ];

    samples
        .iter()
        .map(|&(text, category)| LabeledExample::new(text, category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_covers_every_category() {
        let covered: HashSet<_> = seed_examples().iter().map(|e| e.category).collect();
        for category in IssueCategory::ALL {
            assert!(covered.contains(&category), "{} not covered", category);
        }
    }

    #[test]
    fn test_at_least_three_per_category() {
        let examples = seed_examples();
        for category in IssueCategory::ALL {
            let count = examples.iter().filter(|e| e.category == category).count();
            assert!(count >= 3, "{} has only {} examples", category, count);
        }
    }
}
