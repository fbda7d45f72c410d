pub mod apply;
pub mod path;
pub mod types;
