//! Catalog domain types.

pub mod author;
pub mod book;
pub mod category;
pub mod file_pair;
pub mod macros;
pub mod page;
pub mod reader;
pub mod reader_list;

pub use author::*;
pub use book::*;
pub use category::*;
pub use file_pair::FilePair;
pub use page::{Page, PageRequest};
pub use reader::*;
pub use reader_list::*;
