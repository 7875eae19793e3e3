//! Panel identifiers, their static descriptors, and the selection state.
//!
//! The dashboard has a fixed set of three data panels. Which one is shown is
//! an explicit [`PanelSelector`] value; visibility is computed from it and
//! nothing else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PanelId
// ---------------------------------------------------------------------------

/// Identifier of one of the built-in data panels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelId {
    #[default]
    Gdp,
    Co2,
    Agri,
}

impl PanelId {
    /// All panels in sidebar order.
    pub const ALL: [PanelId; 3] = [PanelId::Gdp, PanelId::Co2, PanelId::Agri];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gdp => "gdp",
            Self::Co2 => "co2",
            Self::Agri => "agri",
        }
    }

    /// Short label used in the sidebar.
    pub fn sidebar_label(&self) -> &'static str {
        match self {
            Self::Gdp => "GDP",
            Self::Co2 => "CO₂",
            Self::Agri => "Agriculture",
        }
    }

    /// Icon glyph shown next to the sidebar label.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Gdp => "📈",
            Self::Co2 => "☁",
            Self::Agri => "🌱",
        }
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PanelId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gdp" => Ok(Self::Gdp),
            "co2" | "co₂" => Ok(Self::Co2),
            "agri" | "agriculture" | "agri-land" => Ok(Self::Agri),
            other => anyhow::bail!("unknown panel '{other}' (expected gdp, co2 or agri)"),
        }
    }
}

// ---------------------------------------------------------------------------
// PanelDescriptor
// ---------------------------------------------------------------------------

/// Static description of a panel's data source and labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelDescriptor {
    pub id: PanelId,
    pub title: &'static str,
    /// Endpoint path, resolved against the configured base URL.
    pub endpoint: &'static str,
    pub x_field: &'static str,
    pub y_field: &'static str,
    pub y_label: &'static str,
}

impl PanelDescriptor {
    /// The built-in descriptor for `id`.
    pub fn builtin(id: PanelId) -> Self {
        match id {
            PanelId::Gdp => Self {
                id,
                title: "GDP (USA, 100 yrs)",
                endpoint: "/api/gdp-usa-100yrs",
                x_field: "year",
                y_field: "gdp",
                y_label: "GDP (Trillions USD)",
            },
            PanelId::Co2 => Self {
                id,
                title: "CO₂ Emissions (World, 50 yrs)",
                endpoint: "/api/co2-world-50yrs",
                x_field: "year",
                y_field: "co2",
                y_label: "CO₂ Emissions (kT)",
            },
            PanelId::Agri => Self {
                id,
                title: "Agricultural Land (World, 50 yrs)",
                endpoint: "/api/agri-land-world-50yrs",
                x_field: "year",
                y_field: "agriLand",
                y_label: "Area (hectares or sq km)",
            },
        }
    }

    /// Descriptors for every built-in panel, in sidebar order.
    pub fn all() -> Vec<Self> {
        PanelId::ALL.into_iter().map(Self::builtin).collect()
    }
}

// ---------------------------------------------------------------------------
// PanelSelector
// ---------------------------------------------------------------------------

/// Which panel is currently shown. Exactly one is current at all times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSelector {
    current: PanelId,
}

impl PanelSelector {
    pub fn new(initial: PanelId) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> PanelId {
        self.current
    }

    /// Make `id` the current panel. Returns whether the selection changed;
    /// re-selecting the current panel is a no-op.
    pub fn select(&mut self, id: PanelId) -> bool {
        if self.current == id {
            return false;
        }
        self.current = id;
        true
    }

    /// Visibility of `id` as a function of the selection alone.
    pub fn is_visible(&self, id: PanelId) -> bool {
        self.current == id
    }
}

impl Default for PanelSelector {
    fn default() -> Self {
        Self::new(PanelId::default())
    }
}
