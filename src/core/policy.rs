use std::{convert::Infallible, fmt::Display, str::FromStr};

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CsvError;

/// How record failures affect a processing run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Abort the run on the first record failure.
    Stop,
    /// Log record failures and carry on, reporting nothing.
    #[default]
    Skip,
    /// Carry on and return every record failure.
    Collect,
}

impl FailurePolicy {
    /// Resolves a policy name, ignoring case.
    ///
    /// Unknown names resolve to [`FailurePolicy::Skip`] so that a typo never
    /// drops valid input.
    ///
    /// # Examples
    ///
    /// ```
    /// use smart_csv_rs::core::policy::FailurePolicy;
    ///
    /// assert_eq!(FailurePolicy::from_name("STOP"), FailurePolicy::Stop);
    /// assert_eq!(FailurePolicy::from_name("collect"), FailurePolicy::Collect);
    /// assert_eq!(FailurePolicy::from_name("retry"), FailurePolicy::Skip);
    /// ```
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("stop") {
            FailurePolicy::Stop
        } else if name.eq_ignore_ascii_case("collect") {
            FailurePolicy::Collect
        } else {
            if !name.eq_ignore_ascii_case("skip") {
                warn!("Unknown validation strategy '{}', falling back to skip", name);
            }
            FailurePolicy::Skip
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FailurePolicy::from_name(s))
    }
}

impl Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Stop => write!(f, "stop"),
            FailurePolicy::Skip => write!(f, "skip"),
            FailurePolicy::Collect => write!(f, "collect"),
        }
    }
}

impl<'de> Deserialize<'de> for FailurePolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(FailurePolicy::from_name(&name))
    }
}

/// Externally supplied settings of a [`crate::core::processor::CsvProcessor`].
///
/// # Examples
///
/// ```
/// use smart_csv_rs::core::policy::{FailurePolicy, ProcessorConfig};
///
/// let config = ProcessorConfig::from_json(
///     r#"{ "name": "import-users", "validation_strategy": "Collect", "workers": 4 }"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.name.as_deref(), Some("import-users"));
/// assert_eq!(config.validation_strategy, FailurePolicy::Collect);
/// assert_eq!(config.workers, Some(4));
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcessorConfig {
    /// Name of the run, random when absent
    #[serde(default)]
    pub name: Option<String>,
    /// Failure policy, `skip` when absent
    #[serde(default)]
    pub validation_strategy: FailurePolicy,
    /// Worker pool size, host parallelism when absent
    #[serde(default)]
    pub workers: Option<usize>,
}

impl ProcessorConfig {
    pub fn from_json(json: &str) -> Result<Self, CsvError> {
        serde_json::from_str(json).map_err(|error| CsvError::Configuration(error.to_string()))
    }
}
