//! getpgid/setpgid 系统调用测试

pub mod pgid;
pub mod probe;

pub use pgid::{GroupOps, Kernel, PgidError};
pub use probe::{run, ExitStatus, ProbeConfig};
