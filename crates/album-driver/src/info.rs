//! Reads the name and date of the current item from the viewer's info panel.

use crate::page::{AlbumPage, UiRole};
use crate::remote_log::LogSink;
use std::time::Duration;

const PANEL_SETTLE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoOutcome {
    /// The panel was read and closed again.
    Described(String),
    /// No usable info button; nothing was opened.
    Skipped,
    /// The panel was read but could not be closed.  The viewer is in an
    /// unknown state and the caller should start over.
    LeftOpen(String),
}

/// `Filename: {name}, Date: "{timestamp}"` from the first two value cells.
pub fn describe(fields: &[String]) -> String {
    match fields {
        [] => String::new(),
        [name] => name.clone(),
        [name, date, ..] => format!("Filename: {}, Date: \"{}\"", name, date),
    }
}

pub async fn extract_and_log<P, L>(page: &P, log: &L) -> InfoOutcome
where
    P: AlbumPage + ?Sized,
    L: LogSink,
{
    if !page.present(UiRole::InfoTrigger).await {
        log.warning("Info Button not found");
        return InfoOutcome::Skipped;
    }
    if let Err(e) = page.click(UiRole::InfoTrigger).await {
        log.warning(format!("Could not open info panel: {}", e));
        return InfoOutcome::Skipped;
    }
    tokio::time::sleep(PANEL_SETTLE).await;

    let description = describe(&page.field_texts().await);
    log.info(description.clone());

    if !page.present(UiRole::InfoClose).await {
        log.warning("Could not find Close Button. Going to Idle...");
        return InfoOutcome::LeftOpen(description);
    }
    if let Err(e) = page.click(UiRole::InfoClose).await {
        log.warning(format!("Could not close info panel: {}. Going to Idle...", e));
        return InfoOutcome::LeftOpen(description);
    }
    tokio::time::sleep(PANEL_SETTLE).await;

    InfoOutcome::Described(description)
}
