//! Visualization templates and the registry that matches payloads to them.

pub mod html;
mod registry;
mod shape;
pub mod templates;
mod traits;

pub use registry::TemplateRegistry;
pub use shape::{DataShape, ShapeKind};
pub use traits::{ColorScheme, Palette, Template, TemplateDescriptor, TemplateOptions};
