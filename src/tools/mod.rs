pub mod freq;
pub mod huff_tree;
pub mod code_table;
pub mod bits;
