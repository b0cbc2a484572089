pub mod completion;
pub mod pdf;
