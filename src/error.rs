use thiserror::Error;

#[derive(Debug, Error)]
pub enum LensError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("MISSING_COLUMN: {file} has no `{column}` column")]
    MissingColumn { file: String, column: String },

    #[error("CONFIG_INVALID: {0}")]
    Config(String),

    #[error("NO_DATA: {0}")]
    NoData(String),
}

pub type LensResult<T> = Result<T, LensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_names_file_and_column() {
        let err = LensError::MissingColumn {
            file: "incidents.csv".to_string(),
            column: "故障报告名称".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "MISSING_COLUMN: incidents.csv has no `故障报告名称` column"
        );
    }
}
