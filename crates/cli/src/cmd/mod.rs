mod list;
mod run;

pub use list::cmd_list_modders;
pub use run::cmd_run;
