//! Error types
//!
//! Recoverable conditions are resolved locally by each component; these
//! types only cover table construction and the best-effort shutdown steps.

use core::fmt;

/// Result type for table construction
pub type TableResult<T> = core::result::Result<T, TableError>;

/// Reasons an HPT table is rejected at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// No events given
    Empty,
    /// More events than the scheduler can hold
    TooLong {
        /// Number of events supplied
        len: usize,
    },
    /// An offset is earlier than the one before it
    OutOfOrder {
        /// Index of the offending event
        index: usize,
    },
    /// The last event is not `Restart`
    MissingRestart,
    /// A `Restart` sits at offset zero
    ZeroCycle,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty HPT table"),
            Self::TooLong { len } => write!(f, "HPT table too long ({len} events)"),
            Self::OutOfOrder { index } => write!(f, "HPT event {index} out of order"),
            Self::MissingRestart => write!(f, "HPT table not terminated by Restart"),
            Self::ZeroCycle => write!(f, "HPT cycle has zero length"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TableError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Empty => defmt::write!(f, "Empty"),
            Self::TooLong { len } => defmt::write!(f, "TooLong({})", len),
            Self::OutOfOrder { index } => defmt::write!(f, "OutOfOrder({})", index),
            Self::MissingRestart => defmt::write!(f, "MissingRestart"),
            Self::ZeroCycle => defmt::write!(f, "ZeroCycle"),
        }
    }
}

/// Failure of one shutdown step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerError {
    /// Console queue did not accept the notice
    ConsoleUnavailable,
    /// Radio did not acknowledge the shutdown command
    RadioUnavailable,
    /// GPS did not accept the power-off command
    GpsUnavailable,
    /// Backup domain write failed
    BackupWriteFailed,
}

impl fmt::Display for PowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConsoleUnavailable => write!(f, "console unavailable"),
            Self::RadioUnavailable => write!(f, "radio unavailable"),
            Self::GpsUnavailable => write!(f, "GPS unavailable"),
            Self::BackupWriteFailed => write!(f, "backup register write failed"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PowerError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ConsoleUnavailable => defmt::write!(f, "ConsoleUnavailable"),
            Self::RadioUnavailable => defmt::write!(f, "RadioUnavailable"),
            Self::GpsUnavailable => defmt::write!(f, "GpsUnavailable"),
            Self::BackupWriteFailed => defmt::write!(f, "BackupWriteFailed"),
        }
    }
}
