pub mod node;
pub mod source;
