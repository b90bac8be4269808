//! Placeholder block extraction and parsing.
//!
//! A placeholder block is a `:::` marker line naming a dotted object path, optionally
//! followed by lines indented at least four spaces that hold a YAML configuration:
//!
//! ```text
//! ::: statsforecast.models.AutoARIMA
//!     handler: python
//!     options:
//!       heading_level: 3
//!       members: [fit, predict]
//! ```

/// Block text parsing.
pub mod parse;
/// Document scanning.
pub mod scan;

use thiserror::Error;

pub use self::parse::{DEFAULT_HANDLER, PlaceholderBlock, parse_block};
pub use self::scan::{RawBlock, Token, blocks, scan};

/// Errors raised for a block whose configuration cannot be used.
#[derive(Debug, Error)]
pub enum BlockError {
	/// The marker line names no object.
	#[error("block has no module path")]
	MissingPath,
	/// The YAML body is valid but not a mapping.
	#[error("block configuration must be a mapping, found {0}")]
	InvalidConfig(&'static str),
}
