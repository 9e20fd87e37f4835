pub mod classifier;
pub mod drive;
pub mod storage;
