use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("sheet {sheet:?} has no notes")]
    EmptySheet { sheet: String },

    #[error("sheet {sheet:?} note {position}: {note:?} is not on the keyboard")]
    UnknownNote { sheet: String, position: usize, note: String },

    #[error("sheet index {0} out of range")]
    NoSuchSheet(usize),
}
