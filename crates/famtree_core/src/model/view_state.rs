//! Presentation state persisted alongside the member collection.
//!
//! # Invariants
//! - `tree_zoom` stays within `[MIN_TREE_ZOOM, MAX_TREE_ZOOM]`.
//! - `collapsed_nodes` iterates in sorted order so snapshots are stable.

use crate::model::member::MemberId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

pub const MIN_TREE_ZOOM: f64 = 0.5;
pub const MAX_TREE_ZOOM: f64 = 3.0;
pub const TREE_ZOOM_STEP: f64 = 0.2;
pub const DEFAULT_TREE_ZOOM: f64 = 1.0;

/// UI color scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    /// Unknown stored labels decode as light.
    #[default]
    #[serde(other)]
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Parses a stored label. Anything but `dark` is treated as `light`.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("dark") {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ephemeral and persisted view preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Members whose subtree is hidden in the tree view.
    pub collapsed_nodes: BTreeSet<MemberId>,
    /// Currently focused member, if any.
    pub selected_member_id: Option<MemberId>,
    pub theme: Theme,
    /// In-memory only; not part of persisted snapshots.
    pub tree_zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            collapsed_nodes: BTreeSet::new(),
            selected_member_id: None,
            theme: Theme::Light,
            tree_zoom: DEFAULT_TREE_ZOOM,
        }
    }
}

impl ViewState {
    /// Forgets collapse and selection state. Theme and zoom are preserved.
    pub fn reset_navigation(&mut self) {
        self.collapsed_nodes.clear();
        self.selected_member_id = None;
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.tree_zoom = clamp_zoom(self.tree_zoom + TREE_ZOOM_STEP);
        self.tree_zoom
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.tree_zoom = clamp_zoom(self.tree_zoom - TREE_ZOOM_STEP);
        self.tree_zoom
    }
}

fn clamp_zoom(value: f64) -> f64 {
    // Round to one decimal so repeated steps do not accumulate float noise.
    let rounded = (value * 10.0).round() / 10.0;
    rounded.clamp(MIN_TREE_ZOOM, MAX_TREE_ZOOM)
}

#[cfg(test)]
mod tests {
    use super::{Theme, ViewState, MAX_TREE_ZOOM, MIN_TREE_ZOOM};

    #[test]
    fn zoom_is_clamped_on_both_ends() {
        let mut view = ViewState::default();
        for _ in 0..20 {
            view.zoom_in();
        }
        assert_eq!(view.tree_zoom, MAX_TREE_ZOOM);

        for _ in 0..30 {
            view.zoom_out();
        }
        assert_eq!(view.tree_zoom, MIN_TREE_ZOOM);
    }

    #[test]
    fn zoom_steps_do_not_drift() {
        let mut view = ViewState::default();
        view.zoom_in();
        view.zoom_in();
        assert_eq!(view.tree_zoom, 1.4);
        view.zoom_out();
        assert_eq!(view.tree_zoom, 1.2);
    }

    #[test]
    fn theme_parse_and_toggle() {
        assert_eq!(Theme::parse(" DARK "), Theme::Dark);
        assert_eq!(Theme::parse("sepia"), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().as_str(), "light");
    }

    #[test]
    fn reset_navigation_keeps_preferences() {
        let mut view = ViewState {
            theme: Theme::Dark,
            ..ViewState::default()
        };
        view.collapsed_nodes.insert("a".to_string());
        view.selected_member_id = Some("a".to_string());
        view.zoom_in();

        view.reset_navigation();
        assert!(view.collapsed_nodes.is_empty());
        assert_eq!(view.selected_member_id, None);
        assert_eq!(view.theme, Theme::Dark);
        assert_eq!(view.tree_zoom, 1.2);
    }
}
