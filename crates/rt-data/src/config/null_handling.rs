//! Missing-value handling for file sources

use serde::{Deserialize, Serialize};

/// Cell contents that mean "no measurement"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullConfig {
    /// Patterns to treat as missing
    pub patterns: Vec<String>,

    /// Whether to trim whitespace before checking
    pub trim_whitespace: bool,

    /// Case sensitive matching
    pub case_sensitive: bool,
}

impl Default for NullConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                String::new(),
                "-".to_string(),
                "N/A".to_string(),
                "null".to_string(),
                "None".to_string(),
            ],
            trim_whitespace: true,
            case_sensitive: false,
        }
    }
}

impl NullConfig {
    /// Check if a cell should be read as missing
    pub fn is_null(&self, value: &str) -> bool {
        let value = if self.trim_whitespace { value.trim() } else { value };

        self.patterns.iter().any(|pattern| {
            if self.case_sensitive {
                value == pattern
            } else {
                value.eq_ignore_ascii_case(pattern)
            }
        })
    }

    /// Parse a measurement cell; missing cells become NaN so the renderer can
    /// skip them while the sample keeps its timestamp slot
    pub fn parse_value(&self, value: &str) -> Option<f64> {
        if self.is_null(value) {
            return Some(f64::NAN);
        }
        value.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_patterns() {
        let config = NullConfig::default();
        assert!(config.is_null(" n/a "));
        assert!(config.is_null(""));
        assert!(!config.is_null("0.0"));
        assert!(config.parse_value("NULL").unwrap().is_nan());
        assert_eq!(config.parse_value(" 1.5"), Some(1.5));
        assert_eq!(config.parse_value("abc"), None);
    }
}
