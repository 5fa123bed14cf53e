use std::fmt;

/// Malformed node graph. Raised once while building a `MeterNetwork`;
/// a network that fails any of these checks is never handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuralError {
    /// No node has level `main`.
    MissingMain,
    /// More than one node has level `main`.
    MultipleMain { ids: Vec<String> },
    /// The `main` node names a parent.
    MainHasParent { id: String },
    /// A non-main node has no parent.
    MissingParent { id: String },
    /// A node's parent id does not resolve.
    DanglingParent { id: String, parent_id: String },
    /// Two nodes share the same id.
    DuplicateId { id: String },
    /// A non-main node has no zone code.
    MissingZone { id: String },
    /// A node's zone differs from its (non-main) parent's zone.
    ZoneMismatch { id: String, zone: String, parent_zone: String },
    /// The parent chain starting at this node never reaches `main`.
    Cycle { id: String },
    /// Negative, NaN or infinite reading.
    InvalidReading { id: String, period: String, value: f64 },
    /// A reading is keyed by a period outside the known period list.
    UnknownPeriod { id: String, period: String },
    /// Known periods are not strictly chronological.
    UnorderedPeriods { period: String },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMain => write!(f, "no meter with level 'main'"),
            Self::MultipleMain { ids } => {
                write!(f, "expected one 'main' meter, found {}: {}", ids.len(), ids.join(", "))
            }
            Self::MainHasParent { id } => write!(f, "main meter '{id}' must not have a parent"),
            Self::MissingParent { id } => write!(f, "meter '{id}' has no parent"),
            Self::DanglingParent { id, parent_id } => {
                write!(f, "meter '{id}': parent '{parent_id}' does not exist")
            }
            Self::DuplicateId { id } => write!(f, "duplicate meter id '{id}'"),
            Self::MissingZone { id } => write!(f, "meter '{id}' has no zone"),
            Self::ZoneMismatch { id, zone, parent_zone } => {
                write!(f, "meter '{id}' is in zone '{zone}' but its parent is in zone '{parent_zone}'")
            }
            Self::Cycle { id } => write!(f, "meter '{id}' is part of a parent cycle"),
            Self::InvalidReading { id, period, value } => {
                write!(f, "meter '{id}', period {period}: invalid reading {value}")
            }
            Self::UnknownPeriod { id, period } => {
                write!(f, "meter '{id}': reading for unknown period {period}")
            }
            Self::UnorderedPeriods { period } => {
                write!(f, "periods must be strictly chronological (at {period})")
            }
        }
    }
}

impl std::error::Error for StructuralError {}

#[derive(Debug)]
pub enum ReconError {
    /// The node graph is malformed.
    Structural(StructuralError),
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Dataset validation error (bad thresholds, unknown meter in readings, etc.).
    ConfigValidation(String),
    /// Period key is not a canonical `YYYY-MM` month.
    PeriodParse { value: String },
    /// Missing required column in a readings CSV.
    MissingColumn { column: String },
    /// Reading value parse error.
    ReadingParse { meter_id: String, value: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural(e) => write!(f, "structural data error: {e}"),
            Self::ConfigParse(msg) => write!(f, "dataset parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "dataset validation error: {msg}"),
            Self::PeriodParse { value } => {
                write!(f, "cannot parse period '{value}' (expected YYYY-MM)")
            }
            Self::MissingColumn { column } => write!(f, "readings: missing column '{column}'"),
            Self::ReadingParse { meter_id, value } => {
                write!(f, "meter '{meter_id}': cannot parse reading '{value}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Structural(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StructuralError> for ReconError {
    fn from(e: StructuralError) -> Self {
        Self::Structural(e)
    }
}
