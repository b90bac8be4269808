use std::fmt;

use serde_json::Error as SerdeError;

use crate::blocks::BlockError;
use crate::python::LoadError;
use crate::render::RenderError;

/// Aggregate errors produced by the pydocmd API.
#[derive(Debug)]
pub enum PydocError {
	/// A placeholder block could not be parsed.
	Block(BlockError),
	/// Package loading or object lookup failed.
	Load(LoadError),
	/// Rendering failed.
	Render(RenderError),
	/// Failed to read a YAML options file or option value.
	Yaml(serde_yaml::Error),
	/// Failed to encode JSON.
	Serialization(SerdeError),
	/// Failed to perform IO operations.
	Io(std::io::Error),
	/// Invalid option given by the user.
	InvalidOption(String),
}

impl fmt::Display for PydocError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Block(err) => write!(f, "{err}"),
			Self::Load(err) => write!(f, "{err}"),
			Self::Render(err) => write!(f, "{err}"),
			Self::Yaml(err) => write!(f, "{err}"),
			Self::Serialization(err) => write!(f, "{err}"),
			Self::Io(err) => write!(f, "{err}"),
			Self::InvalidOption(message) => write!(f, "{message}"),
		}
	}
}

impl std::error::Error for PydocError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Block(err) => Some(err),
			Self::Load(err) => Some(err),
			Self::Render(err) => Some(err),
			Self::Yaml(err) => Some(err),
			Self::Serialization(err) => Some(err),
			Self::Io(err) => Some(err),
			Self::InvalidOption(_) => None,
		}
	}
}

impl From<BlockError> for PydocError {
	fn from(err: BlockError) -> Self {
		Self::Block(err)
	}
}

impl From<LoadError> for PydocError {
	fn from(err: LoadError) -> Self {
		Self::Load(err)
	}
}

impl From<RenderError> for PydocError {
	fn from(err: RenderError) -> Self {
		Self::Render(err)
	}
}

impl From<serde_yaml::Error> for PydocError {
	fn from(err: serde_yaml::Error) -> Self {
		Self::Yaml(err)
	}
}

impl From<SerdeError> for PydocError {
	fn from(err: SerdeError) -> Self {
		Self::Serialization(err)
	}
}

impl From<std::io::Error> for PydocError {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

/// Result type returned by the pydocmd library.
pub type Result<T> = std::result::Result<T, PydocError>;
