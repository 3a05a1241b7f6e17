//! Command-line target syntax.
//!
//! A target is written `PID` or `PID:KEYS`, where `KEYS` is a comma-separated
//! key list accepted by [`KeyFilter`]'s parser:
//!
//! ```text
//! --target 4242            every key goes to process 4242
//! --target 4242:h,l        only H and L
//! --target 4242:F5,0x1b    F5 and the raw code 0x1B
//! ```

use std::fmt;
use std::str::FromStr;

use keyroute_core::{KeyFilter, KeyParseError, ProcessId};
use thiserror::Error;

/// Error returned for a malformed `--target` value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TargetSpecError {
    #[error("invalid process id '{0}'")]
    InvalidPid(String),
    #[error(transparent)]
    Key(#[from] KeyParseError),
}

/// A process to bind and the keys it should receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub process: ProcessId,
    pub filter: KeyFilter,
}

impl FromStr for TargetSpec {
    type Err = TargetSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pid, keys) = match s.split_once(':') {
            Some((pid, keys)) => (pid, keys),
            None => (s, ""),
        };

        let pid = pid
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|&p| p != 0)
            .ok_or_else(|| TargetSpecError::InvalidPid(pid.to_string()))?;

        Ok(Self {
            process: ProcessId(pid),
            filter: keys.parse()?,
        })
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.process, self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_pid_matches_all_keys() {
        let spec: TargetSpec = "4242".parse().unwrap();

        assert_eq!(spec.process, ProcessId(4242));
        assert!(spec.filter.is_match_all());
    }

    #[test]
    fn test_pid_with_empty_key_list_matches_all_keys() {
        let spec: TargetSpec = "4242:".parse().unwrap();

        assert!(spec.filter.is_match_all());
    }

    #[test]
    fn test_pid_with_keys_builds_filter() {
        let spec: TargetSpec = "17:h,l".parse().unwrap();

        assert_eq!(spec.process, ProcessId(17));
        assert_eq!(spec.filter.len(), 2);
        assert!(spec.filter.matches(0x48));
        assert!(spec.filter.matches(0x4C));
        assert!(!spec.filter.matches(0x58));
    }

    #[test]
    fn test_zero_or_non_numeric_pid_is_rejected() {
        assert_eq!(
            "0".parse::<TargetSpec>(),
            Err(TargetSpecError::InvalidPid("0".into()))
        );
        assert!(matches!(
            "notepad:h".parse::<TargetSpec>(),
            Err(TargetSpecError::InvalidPid(_))
        ));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = "17:h,warp".parse::<TargetSpec>();

        assert!(matches!(result, Err(TargetSpecError::Key(_))));
    }
}
