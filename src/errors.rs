use std::error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    /// Malformed problem input, with the 1-based line it was detected on.
    Parse { line: usize, message: String },
    UnknownNode(String),
    DuplicateId(String),
    Config(String),

    /// No vehicle in the fleet is large enough to ever carry this cargo.
    Capacity { cargo: String, weight: u64 },

    /// Every vehicle was already too full when this cargo came up for assignment.
    Unassignable { cargo: String, weight: u64 },
    NoRoute { from: String, to: String },
    Overloaded { vehicle: String, cargo: String },
    Stranded(Vec<String>),

    /// The simulated clock ran past `u64::MAX`.
    Overflow,
    Invalid(String),
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { line, message } => write!(f, "Parse error at line {line}: {message}"),
            Self::UnknownNode(node) => write!(f, "Unknown station {node:?}"),
            Self::DuplicateId(id) => write!(f, "Duplicate identifier {id:?}"),
            Self::Config(message) => write!(f, "Invalid configuration: {message}"),
            Self::Capacity { cargo, weight } => {
                write!(f, "Cargo {cargo} (weight {weight}) exceeds the capacity of every vehicle")
            }
            Self::Unassignable { cargo, weight } => {
                write!(f, "No vehicle has {weight} units of residual capacity left for cargo {cargo}")
            }
            Self::NoRoute { from, to } => write!(f, "No route from {from} to {to}"),
            Self::Overloaded { vehicle, cargo } => {
                write!(f, "Vehicle {vehicle} has no room left to load cargo {cargo}")
            }
            Self::Stranded(cargo) => write!(f, "Cargo left undelivered: {}", cargo.join(", ")),
            Self::Overflow => write!(f, "Elapsed time exceeds the representable range"),
            Self::Invalid(message) => write!(f, "Invalid plan: {message}"),
            Self::Io(e) => write!(f, "{e}"),
            Self::Json(e) => write!(f, "{e}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
