//! Keyboard input: keys, modifiers, gestures and the action binding table.
//!
//! The grid does not hard-code which key does what. Every keyboard command is
//! a [`GridAction`], and a [`GridKeyBindings`] table maps actions to
//! [`KeyGesture`]s. A binding of `None` disables its action.
//!
//! # Resolution
//!
//! [`GridKeyBindings::resolve`] walks the table in order and returns the
//! first action whose gesture matches (first match wins). Two actions bound
//! to the same gesture is allowed; the later one is simply unreachable.
//! Navigation actions also match when the pressed Shift/Ctrl state differs
//! from their gesture, so `Shift+Down` still resolves to
//! [`GridAction::MoveDown`] and the selection engine sees the modifiers.
//!
//! # Gesture Strings
//!
//! ```
//! use horizon_datagrid::input::{Key, KeyGesture, KeyboardModifiers};
//!
//! let gesture: KeyGesture = "Ctrl+Shift+Home".parse().unwrap();
//! assert_eq!(gesture.key, Key::Home);
//! assert_eq!(gesture.modifiers, KeyboardModifiers::CTRL_SHIFT);
//! assert_eq!(gesture.to_string(), "Ctrl+Shift+Home");
//!
//! // "none" is a valid binding meaning "disabled".
//! assert_eq!(KeyGesture::parse_binding("none").unwrap(), None);
//! ```

use std::fmt;
use std::str::FromStr;

use horizon_datagrid_core::logging::targets;

use crate::error::{GridError, Result};

// =============================================================================
// Keys and Modifiers
// =============================================================================

/// Keyboard modifiers that may be held during input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held (Cmd on macOS).
    pub control: bool,
    /// The Alt key is held (Option on macOS).
    pub alt: bool,
    /// The Meta/Super key is held.
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Alt modifier only.
    pub const ALT: Self = Self {
        shift: false,
        control: false,
        alt: true,
        meta: false,
    };

    /// Control + Shift modifiers.
    pub const CTRL_SHIFT: Self = Self {
        shift: true,
        control: true,
        alt: false,
        meta: false,
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }

    /// Check if no modifiers are pressed.
    pub fn none(&self) -> bool {
        !self.any()
    }

    /// The same modifiers with Shift released.
    pub fn without_shift(self) -> Self {
        Self {
            shift: false,
            ..self
        }
    }

    /// The same modifiers with Shift and Control released.
    pub fn without_selection_modifiers(self) -> Self {
        Self {
            shift: false,
            control: false,
            ..self
        }
    }
}

/// Keys the grid reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum Key {
    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Function keys
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,

    // Navigation
    ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
    Home, End, PageUp, PageDown,

    // Editing
    Backspace, Delete, Insert,
    Enter, Tab, Escape, Space,

    // Numpad operators
    Add, Subtract, Multiply, Divide,
}

impl Key {
    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Key::ArrowUp
                | Key::ArrowDown
                | Key::ArrowLeft
                | Key::ArrowRight
                | Key::Home
                | Key::End
                | Key::PageUp
                | Key::PageDown
        )
    }

    /// Canonical display name.
    pub fn name(self) -> &'static str {
        KEY_NAMES
            .iter()
            .find(|(key, _)| *key == self)
            .map(|(_, name)| *name)
            .unwrap_or("?")
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical names, first entry per key wins for display.
#[rustfmt::skip]
const KEY_NAMES: &[(Key, &str)] = &[
    (Key::A, "A"), (Key::B, "B"), (Key::C, "C"), (Key::D, "D"), (Key::E, "E"),
    (Key::F, "F"), (Key::G, "G"), (Key::H, "H"), (Key::I, "I"), (Key::J, "J"),
    (Key::K, "K"), (Key::L, "L"), (Key::M, "M"), (Key::N, "N"), (Key::O, "O"),
    (Key::P, "P"), (Key::Q, "Q"), (Key::R, "R"), (Key::S, "S"), (Key::T, "T"),
    (Key::U, "U"), (Key::V, "V"), (Key::W, "W"), (Key::X, "X"), (Key::Y, "Y"),
    (Key::Z, "Z"),
    (Key::F1, "F1"), (Key::F2, "F2"), (Key::F3, "F3"), (Key::F4, "F4"),
    (Key::F5, "F5"), (Key::F6, "F6"), (Key::F7, "F7"), (Key::F8, "F8"),
    (Key::F9, "F9"), (Key::F10, "F10"), (Key::F11, "F11"), (Key::F12, "F12"),
    (Key::ArrowUp, "Up"), (Key::ArrowDown, "Down"),
    (Key::ArrowLeft, "Left"), (Key::ArrowRight, "Right"),
    (Key::Home, "Home"), (Key::End, "End"),
    (Key::PageUp, "PageUp"), (Key::PageDown, "PageDown"),
    (Key::Backspace, "Backspace"), (Key::Delete, "Delete"), (Key::Insert, "Insert"),
    (Key::Enter, "Enter"), (Key::Tab, "Tab"), (Key::Escape, "Escape"), (Key::Space, "Space"),
    (Key::Add, "Add"), (Key::Subtract, "Subtract"),
    (Key::Multiply, "Multiply"), (Key::Divide, "Divide"),
    // Aliases
    (Key::ArrowUp, "ArrowUp"), (Key::ArrowDown, "ArrowDown"),
    (Key::ArrowLeft, "ArrowLeft"), (Key::ArrowRight, "ArrowRight"),
    (Key::PageUp, "PgUp"), (Key::PageDown, "PgDn"),
    (Key::Enter, "Return"), (Key::Escape, "Esc"), (Key::Delete, "Del"),
    (Key::Add, "Plus"), (Key::Subtract, "Minus"),
    (Key::Multiply, "*"), (Key::Add, "+"), (Key::Subtract, "-"), (Key::Divide, "/"),
];

impl FromStr for Key {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        KEY_NAMES
            .iter()
            .find(|(_, candidate)| candidate.eq_ignore_ascii_case(name))
            .map(|(key, _)| *key)
            .ok_or_else(|| GridError::invalid_gesture(s, format!("unknown key '{name}'")))
    }
}

// =============================================================================
// Key Gesture
// =============================================================================

/// One key with modifiers, such as `Ctrl+A` or `F2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyGesture {
    /// The primary key.
    pub key: Key,
    /// The modifier keys that must be held.
    pub modifiers: KeyboardModifiers,
}

impl KeyGesture {
    /// Create a gesture from a key and modifiers.
    pub const fn new(key: Key, modifiers: KeyboardModifiers) -> Self {
        Self { key, modifiers }
    }

    /// A gesture with no modifiers.
    pub const fn key_only(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::NONE)
    }

    /// A Ctrl+key gesture.
    pub const fn ctrl(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::CTRL)
    }

    /// A Shift+key gesture.
    pub const fn shift(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::SHIFT)
    }

    /// A Ctrl+Shift+key gesture.
    pub const fn ctrl_shift(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::CTRL_SHIFT)
    }

    /// Check if this gesture matches the given key and modifiers exactly.
    pub fn matches(&self, key: Key, modifiers: KeyboardModifiers) -> bool {
        self.key == key && self.modifiers == modifiers
    }

    /// Parse a binding string; `"none"` (or an empty string) disables the
    /// binding and yields `Ok(None)`.
    pub fn parse_binding(s: &str) -> Result<Option<KeyGesture>> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl fmt::Display for KeyGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(5);
        if self.modifiers.control {
            parts.push("Ctrl");
        }
        if self.modifiers.alt {
            parts.push("Alt");
        }
        if self.modifiers.shift {
            parts.push("Shift");
        }
        if self.modifiers.meta {
            parts.push("Meta");
        }
        parts.push(self.key.name());
        write!(f, "{}", parts.join("+"))
    }
}

impl FromStr for KeyGesture {
    type Err = GridError;

    /// Parse `"Ctrl+Shift+Home"`, `"F2"`, `"Multiply"` and similar.
    ///
    /// Modifier names are case-insensitive. A trailing `+` names the plus key
    /// (`"Ctrl++"`).
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(GridError::invalid_gesture(s, "empty gesture"));
        }

        let (head, key_part) = match trimmed.strip_suffix("++") {
            Some(head) => (head, "+"),
            None if trimmed == "+" => ("", "+"),
            None => match trimmed.rsplit_once('+') {
                Some((head, key)) => (head, key),
                None => ("", trimmed),
            },
        };
        if key_part.trim().is_empty() {
            return Err(GridError::invalid_gesture(s, "missing key"));
        }

        let mut modifiers = KeyboardModifiers::NONE;
        for part in head.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers.control = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "cmd" | "command" | "win" | "super" => modifiers.meta = true,
                other => {
                    return Err(GridError::invalid_gesture(
                        s,
                        format!("unknown modifier '{other}'"),
                    ));
                }
            }
        }

        let key = key_part
            .parse::<Key>()
            .map_err(|_| GridError::invalid_gesture(s, format!("unknown key '{}'", key_part.trim())))?;
        Ok(KeyGesture::new(key, modifiers))
    }
}

// =============================================================================
// Actions
// =============================================================================

/// A keyboard command the grid understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridAction {
    /// Move the current cell one row up.
    MoveUp,
    /// Move the current cell one row down.
    MoveDown,
    /// Move one column left, or collapse / step to parent on tree rows.
    MoveLeft,
    /// Move one column right, or expand / step to first child on tree rows.
    MoveRight,
    /// Move to the first visible row.
    MoveFirstRow,
    /// Move to the last visible row.
    MoveLastRow,
    /// Move to the first column of the current row.
    MoveRowStart,
    /// Move to the last column of the current row.
    MoveRowEnd,
    /// Move up by one viewport.
    PageUp,
    /// Move down by one viewport.
    PageDown,
    /// Commit and move to the next cell.
    NextCell,
    /// Commit and move to the previous cell.
    PreviousCell,
    /// Start editing the current cell.
    BeginEdit,
    /// Commit the edit and move down.
    CommitEdit,
    /// Cancel the edit.
    CancelEdit,
    /// Select every cell or row.
    SelectAll,
    /// Toggle selection of the current cell or row.
    ToggleSelection,
    /// Expand the current group or node when it is collapsed.
    ExpandCurrent,
}

impl GridAction {
    /// Every action in default table order.
    pub const ALL: [GridAction; 18] = [
        GridAction::MoveFirstRow,
        GridAction::MoveLastRow,
        GridAction::MoveUp,
        GridAction::MoveDown,
        GridAction::MoveLeft,
        GridAction::MoveRight,
        GridAction::MoveRowStart,
        GridAction::MoveRowEnd,
        GridAction::PageUp,
        GridAction::PageDown,
        GridAction::PreviousCell,
        GridAction::NextCell,
        GridAction::BeginEdit,
        GridAction::CommitEdit,
        GridAction::CancelEdit,
        GridAction::SelectAll,
        GridAction::ToggleSelection,
        GridAction::ExpandCurrent,
    ];

    /// Returns true for actions that move the current cell and carry
    /// selection modifiers.
    pub fn is_navigation(self) -> bool {
        matches!(
            self,
            GridAction::MoveUp
                | GridAction::MoveDown
                | GridAction::MoveLeft
                | GridAction::MoveRight
                | GridAction::MoveFirstRow
                | GridAction::MoveLastRow
                | GridAction::MoveRowStart
                | GridAction::MoveRowEnd
                | GridAction::PageUp
                | GridAction::PageDown
        )
    }

    /// The snake_case name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            GridAction::MoveUp => "move_up",
            GridAction::MoveDown => "move_down",
            GridAction::MoveLeft => "move_left",
            GridAction::MoveRight => "move_right",
            GridAction::MoveFirstRow => "move_first_row",
            GridAction::MoveLastRow => "move_last_row",
            GridAction::MoveRowStart => "move_row_start",
            GridAction::MoveRowEnd => "move_row_end",
            GridAction::PageUp => "page_up",
            GridAction::PageDown => "page_down",
            GridAction::NextCell => "next_cell",
            GridAction::PreviousCell => "previous_cell",
            GridAction::BeginEdit => "begin_edit",
            GridAction::CommitEdit => "commit_edit",
            GridAction::CancelEdit => "cancel_edit",
            GridAction::SelectAll => "select_all",
            GridAction::ToggleSelection => "toggle_selection",
            GridAction::ExpandCurrent => "expand_current",
        }
    }

    /// The gesture bound to this action out of the box.
    pub fn default_gesture(self) -> KeyGesture {
        match self {
            GridAction::MoveUp => KeyGesture::key_only(Key::ArrowUp),
            GridAction::MoveDown => KeyGesture::key_only(Key::ArrowDown),
            GridAction::MoveLeft => KeyGesture::key_only(Key::ArrowLeft),
            GridAction::MoveRight => KeyGesture::key_only(Key::ArrowRight),
            GridAction::MoveFirstRow => KeyGesture::ctrl(Key::Home),
            GridAction::MoveLastRow => KeyGesture::ctrl(Key::End),
            GridAction::MoveRowStart => KeyGesture::key_only(Key::Home),
            GridAction::MoveRowEnd => KeyGesture::key_only(Key::End),
            GridAction::PageUp => KeyGesture::key_only(Key::PageUp),
            GridAction::PageDown => KeyGesture::key_only(Key::PageDown),
            GridAction::NextCell => KeyGesture::key_only(Key::Tab),
            GridAction::PreviousCell => KeyGesture::shift(Key::Tab),
            GridAction::BeginEdit => KeyGesture::key_only(Key::F2),
            GridAction::CommitEdit => KeyGesture::key_only(Key::Enter),
            GridAction::CancelEdit => KeyGesture::key_only(Key::Escape),
            GridAction::SelectAll => KeyGesture::ctrl(Key::A),
            GridAction::ToggleSelection => KeyGesture::ctrl(Key::Space),
            GridAction::ExpandCurrent => KeyGesture::key_only(Key::Multiply),
        }
    }
}

impl fmt::Display for GridAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GridAction {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        GridAction::ALL
            .into_iter()
            .find(|action| action.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| GridError::Options(format!("unknown grid action '{name}'")))
    }
}

// =============================================================================
// Binding Table
// =============================================================================

/// Ordered action → gesture table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridKeyBindings {
    entries: Vec<(GridAction, Option<KeyGesture>)>,
}

impl Default for GridKeyBindings {
    fn default() -> Self {
        Self {
            entries: GridAction::ALL
                .into_iter()
                .map(|action| (action, Some(action.default_gesture())))
                .collect(),
        }
    }
}

impl GridKeyBindings {
    /// A table with every action disabled.
    pub fn empty() -> Self {
        Self {
            entries: GridAction::ALL.into_iter().map(|action| (action, None)).collect(),
        }
    }

    /// The gesture bound to `action`, if enabled.
    pub fn gesture(&self, action: GridAction) -> Option<KeyGesture> {
        self.entries
            .iter()
            .find(|(a, _)| *a == action)
            .and_then(|(_, gesture)| *gesture)
    }

    /// Rebind `action`. `None` disables it. Table order is kept.
    pub fn set(&mut self, action: GridAction, gesture: Option<KeyGesture>) {
        match self.entries.iter_mut().find(|(a, _)| *a == action) {
            Some(entry) => entry.1 = gesture,
            None => self.entries.push((action, gesture)),
        }
    }

    /// Apply `(action name, gesture string)` overrides.
    pub fn apply_overrides<'a, I>(&mut self, overrides: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (action, gesture) in overrides {
            let action: GridAction = action.parse()?;
            let gesture = KeyGesture::parse_binding(gesture)?;
            self.set(action, gesture);
        }
        Ok(())
    }

    /// Iterate over the table in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (GridAction, Option<KeyGesture>)> + '_ {
        self.entries.iter().copied()
    }

    /// Find the action for a key press.
    ///
    /// Exact matches are tried first, in table order. Navigation actions are
    /// then tried with Shift ignored, then with Shift and Ctrl ignored.
    pub fn resolve(&self, key: Key, modifiers: KeyboardModifiers) -> Option<GridAction> {
        let exact = self.first_match(key, modifiers, false);
        let action = exact
            .or_else(|| self.first_match(key, modifiers.without_shift(), true))
            .or_else(|| self.first_match(key, modifiers.without_selection_modifiers(), true));
        tracing::trace!(
            target: targets::INPUT,
            key = %key,
            ?modifiers,
            action = ?action,
            "key resolved"
        );
        action
    }

    fn first_match(
        &self,
        key: Key,
        modifiers: KeyboardModifiers,
        navigation_only: bool,
    ) -> Option<GridAction> {
        self.entries
            .iter()
            .filter(|(action, _)| !navigation_only || action.is_navigation())
            .find_map(|(action, gesture)| {
                gesture
                    .filter(|g| g.matches(key, modifiers))
                    .map(|_| *action)
            })
    }
}
