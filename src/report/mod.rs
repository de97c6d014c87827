//! Report compilation
//!
//! Transcripts go to the report generator; its payload is normalized into a
//! `Report` and attached to the interview (solo or aggregate) or to a
//! participant's session (individual).

mod compiler;
mod normalize;
mod transcript;

pub use compiler::ReportCompiler;
pub use normalize::{normalize, parse_report, strip_code_fences};
pub use transcript::{assemble, ReportInput};
