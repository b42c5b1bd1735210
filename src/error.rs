use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not open or find the image: {path}")]
    ImageRead { path: String },

    #[error("could not write image: {path}")]
    ImageWrite { path: String },

    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),

    #[error("null pointer passed for {argument}")]
    NullPointer { argument: &'static str },

    #[error("argument {argument} is not valid UTF-8")]
    InvalidPath { argument: &'static str },

    #[error("negative triangle index {value}")]
    NegativeIndex { value: i32 },

    #[error("landmark index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
