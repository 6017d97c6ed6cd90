pub mod library;
pub mod matching;
pub mod neighbors;
pub mod store;
