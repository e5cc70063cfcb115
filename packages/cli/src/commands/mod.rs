pub mod check;
pub mod init;
pub mod list;
pub mod preview;

pub use check::{check, CheckArgs};
pub use init::{init, InitArgs};
pub use list::{list, ListArgs};
pub use preview::{preview, PreviewArgs};
