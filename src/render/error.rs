use thiserror::Error;

/// Errors raised while preparing or producing a documentation fragment.
#[derive(Debug, Error)]
pub enum RenderError {
	/// Merged options do not fit the option schema.
	#[error("invalid render options: {0}")]
	InvalidOptions(#[from] serde_yaml::Error),
	/// A block's `options` value is not a mapping.
	#[error("`options` must be a mapping, found {0}")]
	OptionsNotMapping(&'static str),
	/// A `filters` entry is not a valid regular expression.
	#[error("invalid filter `{pattern}`: {source}")]
	InvalidFilter {
		/// Pattern as written, without its `!` prefix.
		pattern: String,
		/// Compilation failure.
		#[source]
		source: regex::Error,
	},
}
