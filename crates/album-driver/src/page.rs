use album_proto::config::SelectorConfig;
use async_trait::async_trait;
use std::fmt;

/// The viewer controls the automation looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiRole {
    AlbumViewer,
    DownloadTrigger,
    NextTrigger,
    InfoTrigger,
    InfoClose,
}

impl UiRole {
    pub fn selector(self, selectors: &SelectorConfig) -> &str {
        match self {
            UiRole::AlbumViewer => &selectors.album_viewer,
            UiRole::DownloadTrigger => &selectors.download_button,
            UiRole::NextTrigger => &selectors.next_button,
            UiRole::InfoTrigger => &selectors.info_button,
            UiRole::InfoClose => &selectors.info_close_button,
        }
    }
}

impl fmt::Display for UiRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UiRole::AlbumViewer => "Album Viewer",
            UiRole::DownloadTrigger => "Download Button",
            UiRole::NextTrigger => "Next Button",
            UiRole::InfoTrigger => "Info Button",
            UiRole::InfoClose => "Close Button",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("{0} not found")]
    Missing(UiRole),
    #[error("browser: {0}")]
    Browser(String),
}

/// The album page as seen by the automation.
#[async_trait]
pub trait AlbumPage: Send + Sync {
    /// Whether at least one element for `role` is in the document.  A lookup
    /// failure counts as absent.
    async fn present(&self, role: UiRole) -> bool;

    /// Clicks the first element for `role`.
    async fn click(&self, role: UiRole) -> Result<(), PageError>;

    /// Text of the first two info panel value cells, in document order.
    /// Empty when the panel cannot be read.
    async fn field_texts(&self) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_selectors() {
        let selectors = SelectorConfig::default();
        assert_eq!(UiRole::AlbumViewer.selector(&selectors), ".viewer-3uWLw");
        assert_eq!(
            UiRole::NextTrigger.selector(&selectors),
            ".ico-next-4KyWW.center-S44vV"
        );
        assert_eq!(UiRole::InfoClose.selector(&selectors), ".ico-close-3WH4i");
    }

    #[test]
    fn test_missing_error_names_role() {
        let err = PageError::Missing(UiRole::DownloadTrigger);
        assert_eq!(err.to_string(), "Download Button not found");
    }
}
