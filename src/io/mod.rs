//! File adapters around the engine
//!
//! - [`discovery`] - find CSV / Parquet inputs under a path
//! - [`reader`] - load files into raw readings
//! - [`writer`] - write verdict records and the rejected sidecar

pub mod discovery;
pub mod reader;
pub mod writer;

pub use discovery::{discover_inputs, InputFormat};
pub use reader::{load_inputs, read_readings};
pub use writer::{rejected_path, write_records, write_rejected, OutputFormat};
