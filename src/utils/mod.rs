pub mod headers;
pub mod validation;
