pub mod layout;
pub mod run;
pub mod tasks;
