mod clean;
mod init;
mod rescan;
mod sync;

pub use clean::cmd_clean;
pub use init::cmd_init;
pub use rescan::cmd_rescan;
pub use sync::cmd_sync;
