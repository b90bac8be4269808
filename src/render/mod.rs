//! Markdown rendering of Python objects.

/// Render options and their defaults.
pub mod config;
/// Object renderer.
pub mod core;
/// Render error type.
pub mod error;
/// Heading and source helpers.
pub mod utils;

pub use self::config::{
	MembersOption, MembersOrder, RenderConfig, SectionStyle, SummaryCategories, block_options,
	default_options, merge_options,
};
pub use self::core::Renderer;
pub use self::error::RenderError;
pub use self::utils::strip_heading_prefix;
use crate::python::Object;

/// Render one object to a markdown fragment under `config`.
pub fn render_object_docs(obj: &Object, config: &RenderConfig) -> Result<String, RenderError> {
	Ok(Renderer::new(config.clone())?.render(obj))
}
