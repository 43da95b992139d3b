use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Returns a flag that flips to `true` on the first Ctrl-C.
///
/// The signal is awaited on a small single-threaded runtime in a background thread, so
/// the scan itself stays synchronous. A second Ctrl-C is absorbed; the scan ends after
/// the image it is working on.
pub fn stop_on_ctrl_c() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let spawned = std::thread::Builder::new().name("ctrl-c".into()).spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "cannot listen for Ctrl-C, the scan can only run to completion");
                return;
            }
        };
        runtime.block_on(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("interrupt received, stopping after the current image");
                    flag.store(true, Ordering::Relaxed);
                }
                Err(e) => debug!(error = %e, "Ctrl-C listener failed"),
            }
        });
    });
    if let Err(e) = spawned {
        warn!(error = %e, "cannot spawn Ctrl-C listener");
    }
    stop
}
