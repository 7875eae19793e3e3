//! The dashboard screen: navigation bar, panel sidebar, the three chart
//! panels, and the chat box.
//!
//! [`DashboardShell`] owns every piece of dashboard state. It is driven from
//! a single thread (the web server loop or a CLI command); network work runs
//! on worker threads and is applied by [`DashboardShell::poll`].

use std::sync::Arc;

use serde::Serialize;

use crate::chart::{ChartPanel, PanelStatus};
use crate::chat::{ChatBackend, ChatExchange, ChatPanel, ChatPhase, HttpChatBackend};
use crate::client::ApiClient;
use crate::config::DashConfig;
use crate::events::EventLog;
use crate::panels::{PanelDescriptor, PanelId, PanelSelector};
use crate::series::{HttpSeriesFetcher, Series, SeriesSource};

/// Brand shown at the left of the navigation bar.
pub const NAV_BRAND: &str = "Web UI Copilot";

/// Navigation bar entries (informational, not routed).
pub const NAV_ITEMS: [&str; 3] = ["General WebUI", "Clinical RAG", "Food Security"];

/// Header above the panel area.
pub const MAIN_HEADER: &str = "Web Copilot";

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

/// Serializable snapshot of the whole screen.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub nav: NavView,
    pub header: &'static str,
    pub sidebar: Vec<SidebarEntry>,
    pub selected: PanelId,
    pub panels: Vec<PanelView>,
    pub chat: ChatView,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavView {
    pub brand: &'static str,
    pub items: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SidebarEntry {
    pub id: PanelId,
    pub label: &'static str,
    pub icon: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelView {
    pub id: PanelId,
    pub title: &'static str,
    pub visible: bool,
    pub status: PanelStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_svg: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatView {
    pub question: String,
    pub phase: ChatPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub history: Vec<ChatExchange>,
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

/// Composition root for the dashboard.
pub struct DashboardShell {
    selector: PanelSelector,
    charts: Vec<ChartPanel>,
    chat: ChatPanel,
    series_source: Arc<dyn SeriesSource>,
    chat_backend: Arc<dyn ChatBackend>,
}

impl DashboardShell {
    /// Build the dashboard against the configured HTTP backend.
    pub fn from_config(config: &DashConfig) -> Self {
        let client = ApiClient::from_config(&config.api);
        let series_source = Arc::new(HttpSeriesFetcher::new(client.clone()));
        let chat_backend = Arc::new(HttpChatBackend::new(client, &config.api.chat_path));
        Self::new(
            config.dashboard.initial_panel,
            series_source,
            chat_backend,
            EventLog::from_config(&config.logging),
        )
    }

    /// Build the dashboard with explicit collaborators.
    pub fn new(
        initial: PanelId,
        series_source: Arc<dyn SeriesSource>,
        chat_backend: Arc<dyn ChatBackend>,
        log: EventLog,
    ) -> Self {
        let charts = PanelDescriptor::all()
            .into_iter()
            .map(|descriptor| ChartPanel::new(descriptor, log.clone()))
            .collect();
        Self {
            selector: PanelSelector::new(initial),
            charts,
            chat: ChatPanel::new(log),
            series_source,
            chat_backend,
        }
    }

    /// Mount every chart panel, visible or not. Each fetches once.
    pub fn mount(&mut self) {
        for chart in &mut self.charts {
            chart.mount(Arc::clone(&self.series_source));
        }
    }

    /// Apply any completed background work. Returns whether anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for chart in &mut self.charts {
            changed |= chart.poll();
        }
        changed |= self.chat.poll();
        changed
    }

    // -- Selection --

    pub fn selected(&self) -> PanelId {
        self.selector.current()
    }

    /// Select a panel. Pure UI state: no network activity.
    pub fn select(&mut self, id: PanelId) -> bool {
        self.selector.select(id)
    }

    /// Charts currently visible (always exactly one).
    pub fn visible_panels(&self) -> Vec<PanelId> {
        self.charts
            .iter()
            .map(|c| c.descriptor().id)
            .filter(|id| self.selector.is_visible(*id))
            .collect()
    }

    pub fn chart(&self, id: PanelId) -> Option<&ChartPanel> {
        self.charts.iter().find(|c| c.descriptor().id == id)
    }

    pub fn chart_mut(&mut self, id: PanelId) -> Option<&mut ChartPanel> {
        self.charts.iter_mut().find(|c| c.descriptor().id == id)
    }

    /// The series behind a panel, once loaded.
    pub fn series(&self, id: PanelId) -> Option<&Series> {
        self.chart(id).and_then(ChartPanel::series)
    }

    // -- Chat --

    pub fn chat(&self) -> &ChatPanel {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatPanel {
        &mut self.chat
    }

    pub fn set_question(&mut self, text: impl Into<String>) {
        self.chat.set_question(text);
    }

    /// Submit the pending question. Returns the request id.
    pub fn submit_question(&mut self) -> u64 {
        self.chat.submit(Arc::clone(&self.chat_backend))
    }

    // -- View --

    /// Snapshot of the screen. Only the selected panel is visible, and only
    /// visible panels carry chart markup.
    pub fn view(&self) -> DashboardView {
        let selected = self.selector.current();

        let sidebar = PanelId::ALL
            .into_iter()
            .map(|id| SidebarEntry {
                id,
                label: id.sidebar_label(),
                icon: id.icon(),
                selected: id == selected,
            })
            .collect();

        let panels = self
            .charts
            .iter()
            .map(|chart| {
                let descriptor = chart.descriptor();
                let visible = self.selector.is_visible(descriptor.id);
                PanelView {
                    id: descriptor.id,
                    title: descriptor.title,
                    visible,
                    status: chart.state().status(),
                    chart_svg: if visible { chart.chart_svg() } else { None },
                }
            })
            .collect();

        DashboardView {
            nav: NavView {
                brand: NAV_BRAND,
                items: NAV_ITEMS.to_vec(),
            },
            header: MAIN_HEADER,
            sidebar,
            selected,
            panels,
            chat: ChatView {
                question: self.chat.pending_question().to_string(),
                phase: self.chat.phase(),
                response: self.chat.last_response().map(str::to_string),
                history: self.chat.history().cloned().collect(),
            },
        }
    }
}
