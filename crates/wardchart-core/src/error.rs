pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed series ({key}): {reason}")]
    MalformedSeries { key: String, reason: String },

    #[error("Unsupported chart type: {chart_type}")]
    UnsupportedChartType { chart_type: String },

    #[error("Unsupported locale: {locale}")]
    UnsupportedLocale { locale: String },

    #[error("Invalid series JSON: {message}")]
    InvalidSeriesJson { message: String },

    #[error("series JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSeries {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
