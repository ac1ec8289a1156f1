pub mod drive;
pub mod health;
pub mod provision;
pub mod upload_test;
