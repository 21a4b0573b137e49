pub mod mixer;
pub mod narration;
