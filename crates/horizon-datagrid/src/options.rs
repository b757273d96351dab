//! Grid configuration loaded from TOML or JSON.
//!
//! Every field has a default, so a file only needs the keys it changes:
//!
//! ```toml
//! selection_mode = "single"
//! selection_unit = "cell"
//! drag_threshold = 6.0
//!
//! [key_bindings]
//! begin_edit = "Enter"
//! commit_edit = "Ctrl+Enter"
//! select_all = "none"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::input::GridKeyBindings;
use crate::reorder::{ReorderHandle, RowReorderController};
use crate::selection::{SelectionMode, SelectionUnit};

/// Behavior switches for a [`DataGrid`](crate::DataGrid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub selection_mode: SelectionMode,
    pub selection_unit: SelectionUnit,
    /// Refuse every edit.
    pub is_read_only: bool,
    /// Pointer travel, in logical pixels, before a drag takes capture.
    pub drag_threshold: f32,
    /// Rows can be dragged to new positions.
    pub can_user_reorder_rows: bool,
    /// Where a press must land to start a row reorder drag.
    pub reorder_handle: ReorderHandle,
    /// Centered share of a row's height that counts as a drop inside it.
    pub inside_band: f32,
    /// Group headers answer the Left/Right/Multiply tree keys.
    pub treat_groups_as_nodes: bool,
    /// Hierarchical sources discard children on collapse.
    pub virtualize_children: bool,
    /// Action name to gesture string overrides; `"none"` disables.
    pub key_bindings: BTreeMap<String, String>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            selection_mode: SelectionMode::default(),
            selection_unit: SelectionUnit::default(),
            is_read_only: false,
            drag_threshold: horizon_datagrid_core::DragThreshold::DEFAULT,
            can_user_reorder_rows: false,
            reorder_handle: ReorderHandle::default(),
            inside_band: RowReorderController::DEFAULT_INSIDE_BAND,
            treat_groups_as_nodes: false,
            virtualize_children: false,
            key_bindings: BTreeMap::new(),
        }
    }
}

impl GridOptions {
    /// Parse options from TOML.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self = toml::from_str(text)?;
        options.validated()
    }

    /// Parse options from JSON.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(text)?;
        options.validated()
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GridError::Options(e.to_string()))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The default key bindings with this file's overrides applied.
    pub fn key_bindings(&self) -> Result<GridKeyBindings> {
        let mut bindings = GridKeyBindings::default();
        bindings.apply_overrides(
            self.key_bindings
                .iter()
                .map(|(action, gesture)| (action.as_str(), gesture.as_str())),
        )?;
        Ok(bindings)
    }

    fn validated(self) -> Result<Self> {
        if !self.drag_threshold.is_finite() || self.drag_threshold < 0.0 {
            return Err(GridError::Options(format!(
                "drag_threshold must be a non-negative number, got {}",
                self.drag_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.inside_band) {
            return Err(GridError::Options(format!(
                "inside_band must be between 0 and 1, got {}",
                self.inside_band
            )));
        }
        // Bad bindings fail at load time, not on first key press.
        self.key_bindings()?;
        Ok(self)
    }
}
