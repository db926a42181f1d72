//! Argument types shared by CLI commands

use std::fmt;
use std::str::FromStr;

/// `<workload>:<version>` as passed to `submit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadRef {
    pub workload: String,
    pub version: String,
}

impl WorkloadRef {
    /// Parses `workload:version`; both parts must be non-empty
    pub fn parse(input: &str) -> Result<Self, String> {
        let invalid = || {
            format!(
                "expected <workload>:<version> (e.g. stellar_optimization:v1.0.0), got '{}'",
                input
            )
        };

        let (workload, version) = input.split_once(':').ok_or_else(invalid)?;
        if workload.is_empty() || version.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            workload: workload.to_string(),
            version: version.to_string(),
        })
    }

    /// Job name prefix for this workload
    ///
    /// Kubernetes names are lowercase and cannot contain underscores.
    pub fn job_prefix(&self) -> String {
        self.workload.replace('_', "-").to_lowercase()
    }
}

impl FromStr for WorkloadRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workload, self.version)
    }
}

/// Parses a `KEY=VALUE` environment entry
pub fn parse_env_pair(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", input))?;
    if key.is_empty() {
        return Err(format!("empty variable name in '{}'", input));
    }
    Ok((key.to_string(), value.to_string()))
}
