pub mod build;
pub mod feature;
pub mod show;
pub mod start;
