pub mod error;
pub mod logging;
pub mod pdf;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{AnnotatorError, Result};
