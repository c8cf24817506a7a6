pub mod env;
pub mod resolve;
pub mod version;
