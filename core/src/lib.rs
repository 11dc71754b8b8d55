pub mod db;
pub mod insights;
pub mod models;
pub mod nutrients;
pub mod nutrition;
pub mod workbook;
