use color_eyre::Result;
use tracing::error;

use crate::tui;

/// Installs color-eyre and a panic hook that restores the terminal before
/// the report is printed.
pub fn init() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .capture_span_trace_by_default(false)
        .display_location_section(false)
        .display_env_section(false)
        .try_into_hooks()?;
    eyre_hook.install()?;

    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = tui::restore() {
            error!("unable to restore terminal: {:?}", e);
        }
        let report = panic_hook.panic_report(panic_info);
        error!("panic: {}", report);
        eprintln!("{}", report);
    }));

    Ok(())
}
