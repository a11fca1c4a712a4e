//! Balance banner view model and the account-management link.

use async_trait::async_trait;
use ninja_core::BalanceView;

const MANAGE_PAGE_PATH: &str = "/add-on/credits?from_SN=true";
const PRODUCTION_SITE: &str = "https://myninja.ai";
const BETA_SITE: &str = "https://betamyninja.ai";
const GAMMA_SITE: &str = "https://gammamyninja.ai";

/// What the balance banner should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceBanner {
    Hidden,
    Loading,
    Available { amount: String },
}

impl BalanceBanner {
    pub fn from_view(api_base_url: Option<&str>, view: &BalanceView) -> Self {
        let configured = api_base_url.is_some_and(|url| !url.trim().is_empty());
        if !configured {
            return Self::Hidden;
        }
        match &view.record {
            Some(record) => Self::Available {
                amount: record.display_amount(),
            },
            None if view.is_loading => Self::Loading,
            None => Self::Hidden,
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }

    pub fn text(&self) -> Option<String> {
        match self {
            Self::Hidden => None,
            Self::Loading => Some("Loading balance...".to_string()),
            Self::Available { amount } => Some(format!("{} credits available", amount)),
        }
    }
}

/// Account-management page for the environment behind `api_base_url`.
pub fn manage_balance_url(api_base_url: &str) -> String {
    let site = if api_base_url.contains("gamma") {
        GAMMA_SITE
    } else if api_base_url.contains("beta") {
        BETA_SITE
    } else {
        PRODUCTION_SITE
    };
    format!("{}{}", site, MANAGE_PAGE_PATH)
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Failed to open {url}: {reason}")]
pub struct OpenUrlError {
    pub url: String,
    pub reason: String,
}

/// Opens URLs in the host's external browser.
#[async_trait]
pub trait UrlOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<(), OpenUrlError>;
}

/// Open the management page. Does nothing without a base URL; opener
/// failures are logged.
pub async fn open_manage_page(opener: &dyn UrlOpener, api_base_url: Option<&str>) {
    let Some(base) = api_base_url.filter(|url| !url.trim().is_empty()) else {
        return;
    };
    let url = manage_balance_url(base);
    if let Err(err) = opener.open(&url).await {
        tracing::error!(error = %err, "Failed to open balance management page");
    }
}
