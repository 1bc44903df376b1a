//! Error classification and remediation hints
//!
//! Failures from the server are free text. Known connection-shaped
//! failures get a checklist of things to verify on the LifeUp side.

use super::report;

/// Substrings that mark a failure as a connection problem (matched case-insensitively)
pub const CONNECTION_PATTERNS: [&str; 4] = ["connection", "unreachable", "ECONNREFUSED", "refused"];

/// What to check when the server cannot reach LifeUp
pub const CONNECTION_REMEDIATION: [&str; 4] = [
    "Is the LifeUp app running on the device?",
    "Is the LifeUp HTTP API service enabled in the app settings?",
    "Are LIFEUP_HOST and LIFEUP_PORT set to the device's address and API port?",
    "Can this machine reach the device over the network (same LAN, no firewall)?",
];

/// Category of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    /// The server could not reach the LifeUp API
    ConnectionFailure {
        /// First recognised pattern found in the text
        pattern: &'static str,
    },
    /// Nothing recognisable; only the raw message is shown
    Unrecognized,
}

impl Diagnosis {
    /// Remediation steps for this category, if any
    pub fn remediation(&self) -> Option<&'static [&'static str]> {
        match self {
            Diagnosis::ConnectionFailure { .. } => Some(&CONNECTION_REMEDIATION),
            Diagnosis::Unrecognized => None,
        }
    }
}

/// Classify an error message
pub fn classify(text: &str) -> Diagnosis {
    let lower = text.to_lowercase();
    CONNECTION_PATTERNS
        .iter()
        .find(|pattern| lower.contains(&pattern.to_lowercase()))
        .map(|&pattern| Diagnosis::ConnectionFailure { pattern })
        .unwrap_or(Diagnosis::Unrecognized)
}

/// Multi-line remediation block for a diagnosis, if it has one
pub fn remediation_block(diagnosis: &Diagnosis) -> Option<String> {
    let steps = diagnosis.remediation()?;
    let mut block = String::from("Cannot reach the LifeUp API. Please check:");
    for (i, step) in steps.iter().enumerate() {
        block.push_str(&format!("\n  {}. {}", i + 1, step));
    }
    Some(block)
}

/// Classify an error message and print any remediation guidance
pub fn diagnose(text: &str) -> Diagnosis {
    let diagnosis = classify(text);
    tracing::debug!(?diagnosis, "Classified failure");
    if let Some(block) = remediation_block(&diagnosis) {
        for line in block.lines() {
            report::error(line);
        }
    }
    diagnosis
}
