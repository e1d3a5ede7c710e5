pub mod ask;
pub mod transcript;
