//! Reassembly of request trees from flat items
//!
//! Pure transforms over `&[RawItem]`; no store access.

mod page;
mod tree;

pub use page::{assemble_page, AssembledPage};
pub use tree::{assemble_forward, assemble_reverse};
