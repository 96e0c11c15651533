pub mod loader;

pub use loader::{is_supported_extension, load_image, save_png};
