pub mod elements;
pub mod parser;

pub use elements::ParsedMedia;
pub use parser::parse;
