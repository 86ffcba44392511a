/*
[INPUT]:  Errors returned while establishing the BBO session
[OUTPUT]: Logged, context-wrapped process errors
[POS]:    Startup layer - setup failure reporting
[UPDATE]: When changing how setup failures surface to the operator
*/

use anyhow::anyhow;
use ascendex_bbo_adapter::BboError;
use tracing::error;

/// Context attached to every session setup failure
pub const SETUP_CONTEXT: &str = "start bbo stream";

/// Log a session setup failure and wrap it for the process exit path.
///
/// Setup failures the adapter marks fatal are expected operator-facing errors
/// (unreachable exchange, bad endpoint); anything else is a client misuse bug.
pub fn setup_failure(err: BboError) -> anyhow::Error {
    if err.is_fatal() {
        error!(error = %err, "session setup failed");
        anyhow!(err).context(SETUP_CONTEXT)
    } else {
        error!(error = %err, "unexpected session state during setup");
        anyhow!(err).context(format!("{SETUP_CONTEXT}: unexpected session state"))
    }
}
