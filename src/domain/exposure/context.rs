//! Per-request evaluation context

use serde::{Deserialize, Serialize};

use crate::domain::content::{DeviceId, ItemId};

/// Name of the public site used when a request does not specify one
pub const DEFAULT_SITE: &str = "website";

/// How the page is being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PageMode {
    /// Regular visitor rendering
    #[default]
    Normal,
    /// Inline page editing
    Edit,
    /// Authoring preview
    Preview,
}

impl PageMode {
    /// Check if this is an authoring rendering where tests stay off
    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Edit | Self::Preview)
    }
}

/// What the tracking subsystem knows about the visitor session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// A tracked session exists for the request
    pub active: bool,
    /// The visitor was classified as a robot
    #[serde(default)]
    pub bot: bool,
}

impl SessionState {
    /// An active, human session
    pub fn tracked() -> Self {
        Self {
            active: true,
            bot: false,
        }
    }

    /// No tracked session
    pub fn inactive() -> Self {
        Self {
            active: false,
            bot: false,
        }
    }

    /// An active session flagged as a bot
    pub fn bot() -> Self {
        Self {
            active: true,
            bot: true,
        }
    }

    /// Check if the visitor may take part in tests
    pub fn is_trackable(&self) -> bool {
        self.active && !self.bot
    }
}

/// No session reported means no tracking
impl Default for SessionState {
    fn default() -> Self {
        Self::inactive()
    }
}

/// Everything the evaluator needs to know about one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Site the request was routed to
    #[serde(default = "default_site")]
    pub site: String,
    /// Resolved content item, absent when nothing matched the URL
    #[serde(default)]
    pub item_id: Option<ItemId>,
    /// Device variant being rendered
    #[serde(default)]
    pub device_id: DeviceId,
    #[serde(default)]
    pub page_mode: PageMode,
    /// Tracking state reported by the host, inactive when absent
    #[serde(default)]
    pub session: SessionState,
    /// Stable identifier of the client, used for traffic allocation
    pub client_id: String,
    /// Combination forced by internal tooling, e.g. screenshot capture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_combination: Option<Vec<u8>>,
}

fn default_site() -> String {
    DEFAULT_SITE.to_string()
}

impl RequestContext {
    /// Create a tracked visitor request for an item on the default site and device
    pub fn new(item_id: Option<ItemId>, client_id: impl Into<String>) -> Self {
        Self {
            site: default_site(),
            item_id,
            device_id: DeviceId::default(),
            page_mode: PageMode::Normal,
            session: SessionState::tracked(),
            client_id: client_id.into(),
            forced_combination: None,
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    pub fn with_device(mut self, device_id: DeviceId) -> Self {
        self.device_id = device_id;
        self
    }

    pub fn with_page_mode(mut self, page_mode: PageMode) -> Self {
        self.page_mode = page_mode;
        self
    }

    pub fn with_session(mut self, session: SessionState) -> Self {
        self.session = session;
        self
    }

    pub fn with_forced_combination(mut self, indices: Vec<u8>) -> Self {
        self.forced_combination = Some(indices);
        self
    }
}
