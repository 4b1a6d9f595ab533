use core::sync::atomic::Ordering;

use anyhow::Error;
use clap::Parser;
use seqgen::{cfg::Config, cmd::Cmd, runtime::Runtime};
use tokio::runtime::Builder;

pub fn main() {
    let cmd = Cmd::parse();
    if let Err(err) = seqgen::logging::init(cmd.verbose as usize) {
        eprintln!("ERROR: failed to initialize logging: {err}");
        std::process::exit(1);
    }

    if let Err(err) = run(cmd) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}

fn run(cmd: Cmd) -> Result<(), Error> {
    let cfg = Config::try_from(&cmd)?;
    let runtime = Runtime::new(cfg, cmd.modes)
        .with_format(cmd.format)
        .with_stop_after(cmd.stop_after);
    let is_running = runtime.is_running();

    // The coordinating loop blocks, so it runs on the blocking pool while
    // this thread waits for Ctrl-C.
    let summary = Builder::new_current_thread()
        .enable_all()
        .thread_name("runtime")
        .build()?
        .block_on(async move {
            let mut app = tokio::task::spawn_blocking(move || runtime.run(std::io::stdout().lock()));

            tokio::select! {
                rc = &mut app => return Ok::<_, Error>(rc??),
                rc = tokio::signal::ctrl_c() => {
                    rc?;
                    is_running.store(false, Ordering::SeqCst);
                }
            }

            Ok(app.await??)
        })?;

    log::info!(
        "done: {} update(s), {} error(s), {} thread(s) joined, {} orphaned, {} item(s) discarded",
        summary.num_updates,
        summary.num_errors,
        summary.shutdown.joined,
        summary.shutdown.orphaned.len(),
        summary.shutdown.discarded,
    );

    Ok(())
}
