pub mod ids_loader;
pub mod toml_loader;

pub use ids_loader::{load_item_ids, parse_item_ids};
pub use toml_loader::{item_file_path, load_toml_to_item};
