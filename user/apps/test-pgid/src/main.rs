use clap::Parser;
use log::{error, LevelFilter};
use std::io::{self, Write};
use test_pgid::{ExitStatus, Kernel, ProbeConfig};

#[derive(Debug, Parser)]
#[command(name = "test-pgid", version, about = "Test sys_getpgid and sys_setpgid")]
struct Cli {
    /// Exit with status 2 when PGID != PID after setpgid(0, 0)
    #[arg(long)]
    strict: bool,
    /// Trace every syscall on stderr
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // 不读取 RUST_LOG，日志级别只由命令行决定
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .format_timestamp(None)
        .init();

    let config = ProbeConfig { strict: cli.strict };
    let status = {
        let mut out = io::stdout().lock();
        let mut diag = io::stderr().lock();
        let status = test_pgid::run(&Kernel, config, &mut out, &mut diag);
        let _ = out.flush();
        status
    };

    let status = status.unwrap_or_else(|e| {
        error!("failed to write report: {}", e);
        ExitStatus::Fatal
    });
    std::process::exit(status.code());
}
