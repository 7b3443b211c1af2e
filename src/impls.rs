pub mod baserow;
pub mod memory;
