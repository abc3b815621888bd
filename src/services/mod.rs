pub mod speech;
pub mod study;
