//! Selection of the processes a user is interested in.

use regex::{Regex, RegexBuilder};

use crate::error::{PerfPlotError, Result};

/// Decides, per raw `Name(Id)` field, whether a process is kept.
#[derive(Debug, Clone, Default)]
pub enum ProcessFilter {
    /// Every process is kept.
    #[default]
    All,
    /// Keep a process when any of the patterns occurs in its field,
    /// ignoring case.
    Patterns(Regex),
}

impl ProcessFilter {
    /// Build a filter from a comma-separated list of name fragments.
    ///
    /// Each fragment is used as-is as one branch of a case-insensitive
    /// alternation, so `RBCWS.*Info` works as well as `session`. Blank
    /// fragments are ignored; when none remain the filter keeps every process.
    pub fn from_patterns(patterns: &str) -> Result<Self> {
        let branches: Vec<String> = patterns
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| format!("(?:{})", p))
            .collect();

        if branches.is_empty() {
            return Ok(ProcessFilter::All);
        }

        RegexBuilder::new(&branches.join("|"))
            .case_insensitive(true)
            .build()
            .map(ProcessFilter::Patterns)
            .map_err(|e| PerfPlotError::Config(format!("invalid process filter: {}", e)))
    }

    /// `None` keeps every process.
    pub fn from_option(patterns: Option<&str>) -> Result<Self> {
        match patterns {
            Some(p) => Self::from_patterns(p),
            None => Ok(ProcessFilter::All),
        }
    }

    pub fn accepts(&self, name_and_id: &str) -> bool {
        match self {
            ProcessFilter::All => true,
            ProcessFilter::Patterns(regex) => {
                !name_and_id.is_empty() && regex.is_match(name_and_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pattern() {
        let f = ProcessFilter::from_patterns("session").unwrap();
        assert!(f.accepts("RBCWSSession"));
        assert!(f.accepts("some session server"));
        assert!(!f.accepts("Quake"));
        assert!(!f.accepts(""));
    }

    #[test]
    fn test_multiple_patterns() {
        let f = ProcessFilter::from_patterns("Session,UserInfo").unwrap();
        assert!(f.accepts("RBCWSUserInfo"));
        assert!(f.accepts("Some Session Server"));
        assert!(f.accepts("Some Userinfo App"));
        assert!(!f.accepts("Quake"));
        assert!(!f.accepts(""));
    }

    #[test]
    fn test_patterns_are_regex_branches() {
        let f = ProcessFilter::from_patterns("RBCWS.*Info,^System").unwrap();
        assert!(f.accepts("RBCWSUserInfo(10496)"));
        assert!(f.accepts("system(4)"));
        assert!(!f.accepts("RBCWSSession(6520)"));
        assert!(!f.accepts("MySystem(8)"));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = ProcessFilter::from_patterns("session,svc(").unwrap_err();
        assert!(matches!(err, PerfPlotError::Config(_)));
    }

    #[test]
    fn test_blank_entries_ignored() {
        let f = ProcessFilter::from_patterns("session, ,").unwrap();
        assert!(f.accepts("RBCWSSession(1)"));
        assert!(!f.accepts("System(4)"));
        assert!(!f.accepts(""));
    }

    #[test]
    fn test_all_blank_means_all() {
        let f = ProcessFilter::from_patterns(" , ").unwrap();
        assert!(matches!(f, ProcessFilter::All));
    }

    #[test]
    fn test_all_processes() {
        let f = ProcessFilter::from_option(None).unwrap();
        assert!(f.accepts("RBCWSSession"));
        assert!(f.accepts("Quake"));
        assert!(f.accepts(""));
    }
}
