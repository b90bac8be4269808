use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a package or resolving an object inside it.
#[derive(Debug, Error)]
pub enum LoadError {
	/// No search path contains the requested package.
	#[error("No module named '{name}'")]
	PackageNotFound {
		/// Requested top-level package name.
		name: String,
	},
	/// A dotted path segment does not exist.
	#[error("'{segment}' not found in '{parent}'")]
	ObjectNotFound {
		/// Missing segment.
		segment: String,
		/// Path of the object that was searched.
		parent: String,
	},
	/// A path segment names something that has no members.
	#[error("'{parent}' has no members; cannot look up '{segment}'")]
	NotAContainer {
		/// Segment that was requested.
		segment: String,
		/// Path of the non-container object.
		parent: String,
	},
	/// An import alias points at a module that was not loaded.
	#[error("alias '{alias}' points to '{target}', which is outside package '{package}'")]
	AliasOutsidePackage {
		/// Path of the alias.
		alias: String,
		/// Alias target.
		target: String,
		/// Loaded package name.
		package: String,
	},
	/// Alias chain does not terminate.
	#[error("alias chain starting at '{0}' is cyclic")]
	AliasCycle(String),
	/// Reading a source file failed.
	#[error("failed to read {}: {source}", path.display())]
	Io {
		/// File that could not be read.
		path: PathBuf,
		/// Underlying IO error.
		#[source]
		source: std::io::Error,
	},
	/// The Python grammar could not be loaded or the parser gave up.
	#[error("failed to parse {}: {message}", path.display())]
	Parse {
		/// File being parsed.
		path: PathBuf,
		/// What went wrong.
		message: String,
	},
	/// Querying the Python interpreter for its search paths failed.
	#[error("failed to query search paths from `{interpreter}`: {message}")]
	Interpreter {
		/// Interpreter command.
		interpreter: String,
		/// What went wrong.
		message: String,
	},
}
