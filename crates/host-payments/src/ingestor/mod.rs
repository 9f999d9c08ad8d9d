pub mod explorer;
pub mod pager;
pub mod types;
