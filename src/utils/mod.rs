pub mod escape;
pub mod instagram;
pub mod json;
pub mod time;
