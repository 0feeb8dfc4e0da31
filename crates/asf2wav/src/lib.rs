//! ASF (WMA2) validation and repackaging into RIFF/WAVE with a `dpds` table.
//!

pub mod api;
pub mod config;
pub mod cursor;
pub mod error;
pub mod guid;
pub mod header;
pub mod object;
pub mod packet;
pub mod riff;

pub use api::{transcode, validate};
pub use config::ConvertConfig;
pub use error::{AsfError, Result};
pub use object::AsfFile;
pub use riff::WaveSummary;
