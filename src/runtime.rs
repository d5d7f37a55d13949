//! Shared Tokio runtime behind the blocking entry points.

use once_cell::sync::OnceCell;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::{Handle, Runtime};

use crate::errors::{DdlError, Result};

/// Global shared Tokio runtime, created on first use.
static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

fn shared_runtime() -> Result<Arc<Runtime>> {
    RUNTIME
        .get_or_try_init(|| {
            Runtime::new()
                .map(Arc::new)
                .map_err(|e| DdlError::Runtime(e.to_string()))
        })
        .map(Arc::clone)
}

/// Run `future` to completion on the shared runtime.
///
/// Fails with [`DdlError::Runtime`] when called from inside a Tokio runtime,
/// where blocking would panic. `what` names the async variant to call instead.
pub(crate) fn block_on<T, F>(what: &str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if Handle::try_current().is_ok() {
        return Err(DdlError::Runtime(format!(
            "blocking call made from inside a Tokio runtime, use {} instead",
            what
        )));
    }
    shared_runtime()?.block_on(future)
}
