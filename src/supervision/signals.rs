use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Registers `SIGTERM`/`SIGINT` handlers that flip a shared flag instead of
/// terminating the process outright, so a running digestion or metadata
/// collection loop gets the chance to finish its current batch and shut
/// down in an orderly way.
pub fn install_termination_flag() -> std::io::Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&flag))?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&flag))?;
    Ok(flag)
}
