use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort building a system or evaluating the overlap objective.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown element '{0}' (only elements 1-99 are supported)")]
    UnknownElement(String),

    #[error("{given} basis names were given for {atoms} atoms")]
    BasisAssignmentLength { given: usize, atoms: usize },

    #[error("could not parse structure entry '{entry}': {reason}")]
    StructureParse { entry: String, reason: String },

    #[error("no direction specified: '{0}' is not one of S11, S12, S21, S22")]
    InvalidQuadrant(String),

    #[error("{0} is singular and cannot be inverted")]
    SingularMatrix(&'static str),

    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        found: String,
    },

    #[error("malformed basis: {0}")]
    MalformedBasis(String),

    #[error("angular momentum {0} is not supported (maximum is 2)")]
    UnsupportedAngularMomentum(u32),

    #[error("no '{basis}' basis available for element {element}")]
    BasisNotFound { element: String, basis: String },

    #[error("restricted hartree fock needs an even number of electrons, found {0}")]
    OpenShell(usize),

    #[error("unknown optimization method '{0}' (expected 'adam' or 'gd')")]
    UnknownOptimizer(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn shape(
        context: &'static str,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::ShapeMismatch {
            context,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
