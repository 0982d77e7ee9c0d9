//! Library components of the neurobox command-line tool.

pub mod io;
pub mod logging;
pub mod pipeline_file;
