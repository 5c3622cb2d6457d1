use crate::Result;

/// Initialize logging/tracing for a bokkichat process.
///
/// Default: info for our crates, warn for everything else.
/// Can be overridden with `RUST_LOG`. Calling this more than once keeps the
/// first subscriber.
pub fn init(service_name: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,bokkichat=info,bokkichat_core=info,bokkichat_telegram=info,bokkichat_mtproto=info,{}=info",
            service_name.replace('-', "_")
        ))
    });

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init();

    Ok(())
}
