use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeeError {
    #[error("Please upload an Excel file first before submitting the form.")]
    MissingStore,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet read error: {0}")]
    Read(#[from] calamine::Error),

    #[error("Spreadsheet write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl FeeError {
    /// Collapse file-level failures into the single condition the web layer reports.
    pub fn into_store_unavailable(self) -> Self {
        match self {
            Self::Io(e) => Self::StoreUnavailable(e.to_string()),
            Self::Read(e) => Self::StoreUnavailable(e.to_string()),
            Self::Write(e) => Self::StoreUnavailable(e.to_string()),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, FeeError>;
