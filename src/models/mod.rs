pub mod classify_types;
pub mod drive_types;
