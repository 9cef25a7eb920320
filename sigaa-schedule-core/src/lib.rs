//! SIGAA Schedule Core Library
//!
//! This library extracts class schedules and student identity from the HTML
//! page exported by the SIGAA academic portal, and provides the view models
//! and storage contracts around them.

pub mod charset;
pub mod error;
pub mod parser;
pub mod registration;
pub mod store;
pub mod timecode;
pub mod timetable;
pub mod types;

// Re-export core types and error handling
pub use error::{Error, Result};
pub use parser::{ScheduleDocumentParser, parse_document};
pub use types::*;

/// Commonly used items
pub mod prelude {
    pub use crate::{
        charset::*, parser::*, registration::*, store::*, timecode::*, timetable::*, types::*,
    };
}
