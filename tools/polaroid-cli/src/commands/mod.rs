pub mod caption;
pub mod check;
pub mod develop;
pub mod finish;
pub mod print;
pub mod shoot;

use tokio_util::sync::CancellationToken;

/// Token that fires on Ctrl+C.
pub fn ctrl_c_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted");
            trigger.cancel();
        }
    });
    cancel
}
