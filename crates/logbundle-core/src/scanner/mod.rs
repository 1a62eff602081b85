pub mod walk;

pub use walk::{discover, read_path_list, Discovery};
