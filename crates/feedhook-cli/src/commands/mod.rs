pub mod list;
pub mod preview;
pub mod run;
