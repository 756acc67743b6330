//! Command implementations

mod catalog;
mod init;
mod run;

pub use catalog::{run_list, run_remove_entry, run_restore};
pub use init::run_init;
pub use run::{run_delete, run_plan, run_update};
