//! getpgid/setpgid 探测序列
//!
//! 依次执行：
//! 1. `getpgid(0)` 读取当前进程组
//! 2. `getpgid(getpid())` 通过 pid 读取，结果应与 1 相同
//! 3. `setpgid(0, 0)` 让当前进程成为新进程组的组长
//! 4. 再次读取进程组，检查其等于 pid
//! 5. `setpgid(0, pgid)` 重复设置同一个进程组
//!
//! 只有第 3 步（以及读取失败）会使进程以非零状态退出，其余检查只打印结果。

use std::io::{self, Write};

use log::{debug, info, warn};

use crate::pgid::{GroupOps, PgidError};

/// 进程退出状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    /// `setpgid(0, 0)` 或 `getpgid` 失败
    Fatal = 1,
    /// 严格模式下，组长检查未通过
    PostconditionFailed = 2,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProbeConfig {
    /// 组长检查失败时以 [`ExitStatus::PostconditionFailed`] 退出
    pub strict: bool,
}

/// 执行探测序列
///
/// ## 参数
///
/// - `ops` - 进程组操作的实现
/// - `config` - 探测配置
/// - `out` - 测试报告的输出
/// - `diag` - 系统调用错误信息的输出（对应 `perror`）
///
/// ## 返回值
///
/// 进程应当使用的退出状态；只有写输出失败时返回 `Err`
pub fn run<G, O, D>(
    ops: &G,
    config: ProbeConfig,
    out: &mut O,
    diag: &mut D,
) -> io::Result<ExitStatus>
where
    G: GroupOps + ?Sized,
    O: Write + ?Sized,
    D: Write + ?Sized,
{
    writeln!(out, "Test sys_getpgid and sys_setpgid")?;

    let pgid = match ops.current_pgid() {
        Ok(pgid) => pgid,
        Err(e) => return abort(diag, e),
    };
    writeln!(out, "Current PGID: {}", pgid)?;

    let pid = ops.current_pid();
    let by_pid = match ops.pgid_of(pid) {
        Ok(pgid) => pgid,
        Err(e) => return abort(diag, e),
    };
    writeln!(out, "PGID of PID {}: {}", pid, by_pid)?;
    if by_pid != pgid {
        warn!("getpgid({}) = {} but getpgid(0) = {}", pid, by_pid, pgid);
        writeln!(
            out,
            "WARNING: PGID of PID {} ({}) differs from current PGID ({})",
            pid, by_pid, pgid
        )?;
    }

    if let Err(e) = ops.become_group_leader() {
        return abort(diag, e);
    }
    writeln!(out, "Successfully created new process group")?;

    let pgid = match ops.current_pgid() {
        Ok(pgid) => pgid,
        Err(e) => return abort(diag, e),
    };
    writeln!(out, "New PGID: {} (should equal PID {})", pgid, pid)?;

    let passed = pgid == pid;
    if passed {
        writeln!(out, "TEST PASSED: PGID equals PID after setpgid(0, 0)")?;
    } else {
        warn!("pgid {} != pid {} after setpgid(0, 0)", pgid, pid);
        writeln!(out, "TEST FAILED: PGID should equal PID")?;
    }

    // 已经在该进程组中，重复设置应当成功
    match ops.rejoin_group(pgid) {
        Ok(()) => writeln!(out, "setpgid with same group succeeded (as expected)")?,
        Err(e) => {
            debug!("rejoin failed: {:?}", e);
            writeln!(diag, "{}", e)?;
        }
    }

    writeln!(out, "All tests completed")?;
    out.flush()?;

    let status = if !passed && config.strict {
        ExitStatus::PostconditionFailed
    } else {
        ExitStatus::Success
    };
    info!("probe finished: {:?}", status);
    Ok(status)
}

fn abort<D: Write + ?Sized>(diag: &mut D, e: PgidError) -> io::Result<ExitStatus> {
    debug!("aborting: {:?}", e);
    writeln!(diag, "{}", e)?;
    diag.flush()?;
    Ok(ExitStatus::Fatal)
}
