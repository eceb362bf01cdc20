use thiserror::Error;

/// Result alias for `namesake`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building and partitioning a publication graph.
///
/// Per-record problems (`InvalidRelation`, `MalformedTitle`) are recovered by
/// the stage that detects them: the record is skipped, the error is logged and
/// kept in the stage outcome. Whole-run problems are returned to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A relation points at an unknown publication or carries a bad value.
    #[error("invalid relation {source_id} -> {target_id}: {reason}")]
    InvalidRelation {
        /// Source publication identifier.
        source_id: String,
        /// Target publication identifier.
        target_id: String,
        /// Why the relation was rejected.
        reason: String,
    },

    /// No edge survived fusion.
    #[error("no edges survived relation fusion")]
    EmptyGraph,

    /// The selected community detection algorithm is not compiled in.
    #[error("community detection capability '{capability}' is not available in this build")]
    DependencyMissing {
        /// Name of the missing capability (cargo feature).
        capability: &'static str,
    },

    /// A title was missing or not text; it is treated as empty.
    #[error("publication {id} has a missing or non-text title")]
    MalformedTitle {
        /// Publication identifier.
        id: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// The dataset collaborator could not produce records.
    #[error("dataset error: {0}")]
    Dataset(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Dataset(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_missing_capability() {
        let err = Error::DependencyMissing {
            capability: "leiden",
        };
        assert!(err.to_string().contains("leiden"));
    }

    #[test]
    fn json_errors_become_dataset_errors() {
        let err: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, Error::Dataset(_)));
    }
}
