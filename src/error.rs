use thiserror::Error;

pub type SoiResult<T> = Result<T, SoiError>;

#[derive(Error, Debug)]
pub enum SoiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DSP request error: {0}")]
    Dsp(String),

    #[error("Malformed calculation '{expression}': {message}")]
    MalformedExpression { expression: String, message: String },

    #[error("Variable '{variable}' resolved to code {code} with no categorical mapping")]
    UnmappedCode { variable: String, code: String },

    #[error("Climate impact variable '{0}' matches no known categorical pattern")]
    UnclassifiedClimateImpact(String),

    #[error("Total indicator '{indicator}' references '{reference}', which is not a computed base indicator")]
    UnresolvedIndicator { indicator: String, reference: String },

    #[error("Excel import error: {0}")]
    Import(String),

    #[error("Excel export error: {0}")]
    Export(String),
}

impl SoiError {
    /// Failures that spoil a single indicator but must not abort the batch.
    pub fn is_indicator_scoped(&self) -> bool {
        matches!(
            self,
            SoiError::UnmappedCode { .. }
                | SoiError::UnclassifiedClimateImpact(_)
                | SoiError::MalformedExpression { .. }
        )
    }
}
