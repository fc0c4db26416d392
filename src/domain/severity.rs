use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid severity '{0}'. Valid severities: {names:?}", names = Severity::NAMES)]
pub struct InvalidSeverity(pub String);

/// Syslog severity carried by every GELF record.
///
/// Variants are declared from most to least urgent; the discriminant is the
/// numeric level written to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Severity {
    pub const ALL: [Severity; 8] = [
        Severity::Emergency,
        Severity::Alert,
        Severity::Critical,
        Severity::Error,
        Severity::Warning,
        Severity::Notice,
        Severity::Info,
        Severity::Debug,
    ];

    pub const NAMES: [&'static str; 8] = [
        "emergency",
        "alert",
        "critical",
        "error",
        "warning",
        "notice",
        "info",
        "debug",
    ];

    pub fn as_str(&self) -> &'static str {
        Self::NAMES[*self as usize]
    }

    /// Numeric syslog level (0 = emergency, 7 = debug).
    pub fn syslog_level(&self) -> u8 {
        *self as u8
    }
}

impl FromStr for Severity {
    type Err = InvalidSeverity;

    // Names are matched exactly; "ERROR" or "warn" are not severities.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMES
            .iter()
            .position(|name| *name == s)
            .map(|index| Self::ALL[index])
            .ok_or_else(|| InvalidSeverity(s.to_string()))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&tracing::Level> for Severity {
    fn from(level: &tracing::Level) -> Self {
        // TRACE has no syslog counterpart and folds into debug
        if *level == tracing::Level::ERROR {
            Severity::Error
        } else if *level == tracing::Level::WARN {
            Severity::Warning
        } else if *level == tracing::Level::INFO {
            Severity::Info
        } else {
            Severity::Debug
        }
    }
}

/// Set of enabled severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeveritySet(u8);

impl SeveritySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(u8::MAX)
    }

    /// Resolves configured names: unknown names are dropped, and a set left
    /// empty after filtering enables every severity.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = names
            .into_iter()
            .filter_map(|name| name.as_ref().parse::<Severity>().ok())
            .collect::<Self>();

        if set.is_empty() { Self::all() } else { set }
    }

    pub fn insert(&mut self, severity: Severity) {
        self.0 |= 1 << severity.syslog_level();
    }

    pub fn contains(&self, severity: Severity) -> bool {
        self.0 & (1 << severity.syslog_level()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Severities in the set, most urgent first.
    pub fn iter(&self) -> impl Iterator<Item = Severity> + '_ {
        Severity::ALL.into_iter().filter(|s| self.contains(*s))
    }
}

impl FromIterator<Severity> for SeveritySet {
    fn from_iter<T: IntoIterator<Item = Severity>>(iter: T) -> Self {
        let mut set = Self::empty();
        for severity in iter {
            set.insert(severity);
        }
        set
    }
}
