use std::error;
use std::fmt;

/// Errors raised during configuration validation, before any scheduling occurs.
///
/// Both variants are fatal to the trial: there is no partial run and no retry,
/// since retrying a deterministic configuration error without changing the input
/// is pointless. An unrecognised energy source is deliberately *not* an error;
/// it is recovered locally with a warning (see `energy::EnergyLedger::snapshot`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A configuration value violates a documented precondition.
    InvalidParameter(String),
    /// The node topology is unusable (no nodes, sink inside the sender set, ...).
    InvalidTopology(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidParameter(ref msg) => write!(f, "invalid parameter: {}", msg),
            Error::InvalidTopology(ref msg) => write!(f, "invalid topology: {}", msg),
        }
    }
}

impl error::Error for Error {
    fn description(&self) -> &str {
        match *self {
            Error::InvalidParameter(..) => "invalid parameter",
            Error::InvalidTopology(..) => "invalid topology",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let err = Error::InvalidParameter("meanLightIntervalSeconds must be > 0".to_string());
        assert!(format!("{}", err).contains("meanLightIntervalSeconds"));
    }
}
