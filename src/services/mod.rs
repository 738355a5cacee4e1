pub mod retrieval;
pub mod upload;

pub use retrieval::{Download, list_files, open_download};
pub use upload::upload;
