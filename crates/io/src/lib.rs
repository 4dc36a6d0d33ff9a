// File I/O: grid readers, upload staging, archive merge, result export

pub mod csv;
pub mod export;
pub mod merge;
pub mod source;
pub mod xlsx;

pub use export::{package_files, write_report};
pub use merge::{extract_and_merge, MergeReport};
pub use source::{read_grid, FileSource, UploadedFile};
