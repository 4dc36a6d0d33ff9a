//! `gradecheck-recon` — roster vs downloaded grade reconciliation engine.
//!
//! Pure engine crate: reads tables through [`GridSource`], returns classified
//! rows and batch statistics. No CLI or file-format dependencies.

pub mod batch;
pub mod config;
pub mod course;
pub mod error;
pub mod header;
pub mod model;
pub mod normalize;
pub mod source;
pub mod table;

pub use batch::run;
pub use config::ReconConfig;
pub use error::{CourseError, MissingColumn, ReconError};
pub use model::{BatchReport, BatchSummary, CourseOutcome, CourseStatus, JoinOrigin, ReconciledRow};
pub use source::{GridSource, InMemorySource};
pub use table::{RawGrid, Table};
