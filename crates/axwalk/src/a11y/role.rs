/*!
Platform UI roles.

Roles describe what an element *is* in the UI hierarchy. The vocabulary follows the
platform's `AX*` role strings; anything outside the known set is carried verbatim in
[`Role::Other`] so no platform information is lost.
*/

#![allow(missing_docs)]

use std::collections::hash_set;
use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Platform role string constants (kAX*Role).
mod ax_role {
  pub(super) const APPLICATION: &str = "AXApplication";
  pub(super) const WINDOW: &str = "AXWindow";
  pub(super) const SHEET: &str = "AXSheet";
  pub(super) const GROUP: &str = "AXGroup";
  pub(super) const SCROLL_AREA: &str = "AXScrollArea";
  pub(super) const SPLIT_GROUP: &str = "AXSplitGroup";
  pub(super) const TOOLBAR: &str = "AXToolbar";
  pub(super) const WEB_AREA: &str = "AXWebArea";
  pub(super) const MENU_BAR: &str = "AXMenuBar";
  pub(super) const MENU_BAR_ITEM: &str = "AXMenuBarItem";
  pub(super) const MENU: &str = "AXMenu";
  pub(super) const MENU_ITEM: &str = "AXMenuItem";
  pub(super) const MENU_BUTTON: &str = "AXMenuButton";
  pub(super) const TAB_GROUP: &str = "AXTabGroup";
  pub(super) const TAB_BUTTON: &str = "AXTabButton";
  pub(super) const LIST: &str = "AXList";
  pub(super) const TABLE: &str = "AXTable";
  pub(super) const OUTLINE: &str = "AXOutline";
  pub(super) const ROW: &str = "AXRow";
  pub(super) const CELL: &str = "AXCell";
  pub(super) const COLUMN: &str = "AXColumn";
  pub(super) const BUTTON: &str = "AXButton";
  pub(super) const LINK: &str = "AXLink";
  pub(super) const CHECK_BOX: &str = "AXCheckBox";
  pub(super) const RADIO_BUTTON: &str = "AXRadioButton";
  pub(super) const POP_UP_BUTTON: &str = "AXPopUpButton";
  pub(super) const COMBO_BOX: &str = "AXComboBox";
  pub(super) const SLIDER: &str = "AXSlider";
  pub(super) const SWITCH: &str = "AXSwitch";
  pub(super) const DISCLOSURE_TRIANGLE: &str = "AXDisclosureTriangle";
  pub(super) const TEXT_FIELD: &str = "AXTextField";
  pub(super) const TEXT_AREA: &str = "AXTextArea";
  pub(super) const STATIC_TEXT: &str = "AXStaticText";
  pub(super) const IMAGE: &str = "AXImage";
  pub(super) const HEADING: &str = "AXHeading";
  pub(super) const DOCK_ITEM: &str = "AXDockItem";
  pub(super) const UNKNOWN: &str = "AXUnknown";
}

/// Platform UI role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
  // === Structural / Containers ===
  Application,
  Window,
  Sheet,
  Group,
  ScrollArea,
  SplitGroup,
  Toolbar,
  WebArea,

  // === Navigation ===
  MenuBar,
  MenuBarItem,
  Menu,
  MenuItem,
  MenuButton,
  TabGroup,
  TabButton,

  // === Collections ===
  List,
  Table,
  Outline,
  Row,
  Cell,
  Column,

  // === Interactive ===
  Button,
  Link,
  CheckBox,
  RadioButton,
  PopUpButton,
  ComboBox,
  Slider,
  Switch,
  DisclosureTriangle,
  TextField,
  TextArea,

  // === Static content ===
  StaticText,
  Image,
  Heading,

  // === System surfaces ===
  DockItem,

  /// Missing or empty platform role.
  #[default]
  Unknown,

  /// Role string outside the known vocabulary, kept verbatim.
  Other(String),
}

impl Role {
  /// Map a platform role string.
  pub fn from_platform(s: &str) -> Self {
    match s {
      ax_role::APPLICATION => Self::Application,
      ax_role::WINDOW => Self::Window,
      ax_role::SHEET => Self::Sheet,
      ax_role::GROUP => Self::Group,
      ax_role::SCROLL_AREA => Self::ScrollArea,
      ax_role::SPLIT_GROUP => Self::SplitGroup,
      ax_role::TOOLBAR => Self::Toolbar,
      ax_role::WEB_AREA => Self::WebArea,
      ax_role::MENU_BAR => Self::MenuBar,
      ax_role::MENU_BAR_ITEM => Self::MenuBarItem,
      ax_role::MENU => Self::Menu,
      ax_role::MENU_ITEM => Self::MenuItem,
      ax_role::MENU_BUTTON => Self::MenuButton,
      ax_role::TAB_GROUP => Self::TabGroup,
      ax_role::TAB_BUTTON => Self::TabButton,
      ax_role::LIST => Self::List,
      ax_role::TABLE => Self::Table,
      ax_role::OUTLINE => Self::Outline,
      ax_role::ROW => Self::Row,
      ax_role::CELL => Self::Cell,
      ax_role::COLUMN => Self::Column,
      ax_role::BUTTON => Self::Button,
      ax_role::LINK => Self::Link,
      ax_role::CHECK_BOX => Self::CheckBox,
      ax_role::RADIO_BUTTON => Self::RadioButton,
      ax_role::POP_UP_BUTTON => Self::PopUpButton,
      ax_role::COMBO_BOX => Self::ComboBox,
      ax_role::SLIDER => Self::Slider,
      ax_role::SWITCH => Self::Switch,
      ax_role::DISCLOSURE_TRIANGLE => Self::DisclosureTriangle,
      ax_role::TEXT_FIELD => Self::TextField,
      ax_role::TEXT_AREA => Self::TextArea,
      ax_role::STATIC_TEXT => Self::StaticText,
      ax_role::IMAGE => Self::Image,
      ax_role::HEADING => Self::Heading,
      ax_role::DOCK_ITEM => Self::DockItem,
      "" | ax_role::UNKNOWN => Self::Unknown,
      other => Self::Other(other.to_string()),
    }
  }

  /// Platform role string.
  pub fn as_str(&self) -> &str {
    match self {
      Self::Application => ax_role::APPLICATION,
      Self::Window => ax_role::WINDOW,
      Self::Sheet => ax_role::SHEET,
      Self::Group => ax_role::GROUP,
      Self::ScrollArea => ax_role::SCROLL_AREA,
      Self::SplitGroup => ax_role::SPLIT_GROUP,
      Self::Toolbar => ax_role::TOOLBAR,
      Self::WebArea => ax_role::WEB_AREA,
      Self::MenuBar => ax_role::MENU_BAR,
      Self::MenuBarItem => ax_role::MENU_BAR_ITEM,
      Self::Menu => ax_role::MENU,
      Self::MenuItem => ax_role::MENU_ITEM,
      Self::MenuButton => ax_role::MENU_BUTTON,
      Self::TabGroup => ax_role::TAB_GROUP,
      Self::TabButton => ax_role::TAB_BUTTON,
      Self::List => ax_role::LIST,
      Self::Table => ax_role::TABLE,
      Self::Outline => ax_role::OUTLINE,
      Self::Row => ax_role::ROW,
      Self::Cell => ax_role::CELL,
      Self::Column => ax_role::COLUMN,
      Self::Button => ax_role::BUTTON,
      Self::Link => ax_role::LINK,
      Self::CheckBox => ax_role::CHECK_BOX,
      Self::RadioButton => ax_role::RADIO_BUTTON,
      Self::PopUpButton => ax_role::POP_UP_BUTTON,
      Self::ComboBox => ax_role::COMBO_BOX,
      Self::Slider => ax_role::SLIDER,
      Self::Switch => ax_role::SWITCH,
      Self::DisclosureTriangle => ax_role::DISCLOSURE_TRIANGLE,
      Self::TextField => ax_role::TEXT_FIELD,
      Self::TextArea => ax_role::TEXT_AREA,
      Self::StaticText => ax_role::STATIC_TEXT,
      Self::Image => ax_role::IMAGE,
      Self::Heading => ax_role::HEADING,
      Self::DockItem => ax_role::DOCK_ITEM,
      Self::Unknown => ax_role::UNKNOWN,
      Self::Other(s) => s,
    }
  }

  /// Info for these roles changes rarely and is cached with the long TTL.
  pub const fn has_static_info(&self) -> bool {
    matches!(
      self,
      Self::Button
        | Self::Link
        | Self::MenuItem
        | Self::MenuButton
        | Self::PopUpButton
        | Self::TabButton
        | Self::CheckBox
        | Self::RadioButton
        | Self::Switch
        | Self::DisclosureTriangle
        | Self::ComboBox
        | Self::Slider
        | Self::StaticText
        | Self::Image
        | Self::Heading
    )
  }

  /// Content roles that are never expanded and never kept as clickable containers.
  pub const fn is_non_interactive(&self) -> bool {
    matches!(self, Self::StaticText | Self::Image | Self::Heading)
  }

  /// Interactive controls whose children are not explored.
  pub const fn is_interactive_leaf(&self) -> bool {
    matches!(
      self,
      Self::Button
        | Self::ComboBox
        | Self::CheckBox
        | Self::RadioButton
        | Self::Link
        | Self::PopUpButton
        | Self::TextField
        | Self::Slider
        | Self::TabButton
        | Self::Switch
        | Self::DisclosureTriangle
        | Self::TextArea
        | Self::MenuButton
        | Self::MenuItem
    )
  }

  /// Collections whose `children` are reported as visible rows only.
  pub const fn is_row_collection(&self) -> bool {
    matches!(self, Self::List | Self::Table | Self::Outline)
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Self::from_platform(s))
  }
}

impl From<String> for Role {
  fn from(s: String) -> Self {
    Self::from_platform(&s)
  }
}

impl From<Role> for String {
  fn from(role: Role) -> Self {
    match role {
      Role::Other(s) => s,
      known => known.as_str().to_string(),
    }
  }
}

/// Set of roles, serialized as a list of platform role strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(HashSet<Role>);

impl RoleSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build from role names, ignoring blank entries.
  pub fn from_names<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    names
      .into_iter()
      .map(|name| name.as_ref().trim().to_string())
      .filter(|name| !name.is_empty())
      .map(Role::from)
      .collect()
  }

  pub fn contains(&self, role: &Role) -> bool {
    self.0.contains(role)
  }

  pub fn insert(&mut self, role: Role) -> bool {
    self.0.insert(role)
  }

  /// Copy of this set with extra roles added.
  #[must_use]
  pub fn widened(&self, extra: impl IntoIterator<Item = Role>) -> Self {
    let mut set = self.clone();
    set.0.extend(extra);
    set
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> hash_set::Iter<'_, Role> {
    self.0.iter()
  }

  /// Platform role names, sorted.
  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.0.iter().map(|r| r.as_str().to_string()).collect();
    names.sort_unstable();
    names
  }
}

impl FromIterator<Role> for RoleSet {
  fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
    Self(iter.into_iter().collect())
  }
}

impl Extend<Role> for RoleSet {
  fn extend<T: IntoIterator<Item = Role>>(&mut self, iter: T) {
    self.0.extend(iter);
  }
}

impl<'a> IntoIterator for &'a RoleSet {
  type Item = &'a Role;
  type IntoIter = hash_set::Iter<'a, Role>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}
