use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Block {id} not found")]
    BlockNotFound { id: String },
    #[error("Todo {id} not found")]
    TodoNotFound { id: String },
    #[error("Invalid time range {start}..{end}: end must be after start and at most 1440")]
    InvalidRange { start: u32, end: u32 },
    #[error("Invalid time '{0}'. Use HH:MM.")]
    InvalidTime(String),
    #[error("Invalid weekday {0}. Use 0 (Sunday) to 6 (Saturday).")]
    InvalidWeekday(u8),
    #[error("Unknown day '{0}'. Use a day name, 0-6, weekdays or weekend.")]
    UnknownDay(String),
}

pub type Result<T> = std::result::Result<T, Error>;
