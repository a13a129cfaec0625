use log::debug;
use nix::errno::Errno;
use nix::unistd::{self, Pid};
use thiserror::Error;

/// 进程组相关系统调用的错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PgidError {
    /// `getpgid` 失败，`arg` 为传入的 pid（0 表示当前进程）
    #[error("getpgid({arg}) failed: {}", .errno.desc())]
    Lookup { arg: i32, errno: Errno },
    #[error("setpgid(0, 0) failed: {}", .0.desc())]
    Promote(Errno),
    #[error("setpgid with same group failed: {}", .0.desc())]
    Rejoin(Errno),
}

impl PgidError {
    pub fn errno(&self) -> Errno {
        match *self {
            PgidError::Lookup { errno, .. } => errno,
            PgidError::Promote(errno) | PgidError::Rejoin(errno) => errno,
        }
    }
}

/// 探测序列所需的进程组操作
///
/// 真实实现见 [`Kernel`]，测试中可以替换为内存中的实现。
pub trait GroupOps {
    /// `getpid()`
    fn current_pid(&self) -> Pid;

    /// `getpgid(0)`
    fn current_pgid(&self) -> Result<Pid, PgidError>;

    /// `getpgid(pid)`
    fn pgid_of(&self, pid: Pid) -> Result<Pid, PgidError>;

    /// `setpgid(0, 0)`：让当前进程成为新进程组的组长
    fn become_group_leader(&self) -> Result<(), PgidError>;

    /// `setpgid(0, pgid)`：把当前进程放入 `pgid`
    fn rejoin_group(&self, pgid: Pid) -> Result<(), PgidError>;
}

/// 直接调用内核的实现
#[derive(Debug, Default, Clone, Copy)]
pub struct Kernel;

impl GroupOps for Kernel {
    fn current_pid(&self) -> Pid {
        unistd::getpid()
    }

    fn current_pgid(&self) -> Result<Pid, PgidError> {
        let ret = unistd::getpgid(None);
        debug!("getpgid(0) -> {:?}", ret);
        ret.map_err(|errno| PgidError::Lookup { arg: 0, errno })
    }

    fn pgid_of(&self, pid: Pid) -> Result<Pid, PgidError> {
        let ret = unistd::getpgid(Some(pid));
        debug!("getpgid({}) -> {:?}", pid, ret);
        ret.map_err(|errno| PgidError::Lookup {
            arg: pid.as_raw(),
            errno,
        })
    }

    fn become_group_leader(&self) -> Result<(), PgidError> {
        // pid 与 pgid 都为 0：作用于自身，新组号等于自身 pid
        let ret = unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0));
        debug!("setpgid(0, 0) -> {:?}", ret);
        ret.map_err(PgidError::Promote)
    }

    fn rejoin_group(&self, pgid: Pid) -> Result<(), PgidError> {
        let ret = unistd::setpgid(Pid::from_raw(0), pgid);
        debug!("setpgid(0, {}) -> {:?}", pgid, ret);
        ret.map_err(PgidError::Rejoin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_group_matches_group_of_own_pid() {
        let kernel = Kernel;
        let pgid = kernel.current_pgid().unwrap();
        let by_pid = kernel.pgid_of(kernel.current_pid()).unwrap();
        assert_eq!(pgid, by_pid);
    }

    #[test]
    fn lookup_of_missing_process_fails() {
        // pid_max 上限为 4194304，这个 pid 不可能存在
        let err = Kernel.pgid_of(Pid::from_raw(i32::MAX)).unwrap_err();
        assert_eq!(err.errno(), Errno::ESRCH);
        assert_eq!(
            err.to_string(),
            format!("getpgid({}) failed: {}", i32::MAX, Errno::ESRCH.desc())
        );
    }

    #[test]
    fn error_text_follows_perror() {
        assert_eq!(
            PgidError::Promote(Errno::EPERM).to_string(),
            "setpgid(0, 0) failed: Operation not permitted"
        );
        assert_eq!(
            PgidError::Rejoin(Errno::EPERM).to_string(),
            "setpgid with same group failed: Operation not permitted"
        );
    }
}
