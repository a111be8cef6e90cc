use std::collections::HashMap;

/// Stable identifiers for every control in the status menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuItem {
    Reload,
    Debug,
    Issues,
    Remaining,
    Pause,
    Pause15m,
    Pause1h,
}

impl MenuItem {
    pub fn default_title(self) -> &'static str {
        match self {
            MenuItem::Reload => "Reload",
            MenuItem::Debug => "💻Debug",
            MenuItem::Issues => "⚠️Issues",
            MenuItem::Remaining => "Remaining",
            MenuItem::Pause => "Pause",
            MenuItem::Pause15m => "Pause for 15m",
            MenuItem::Pause1h => "Pause for 1h",
        }
    }

    /// Keyboard shortcut in the terminal front end
    pub fn shortcut(self) -> Option<char> {
        match self {
            MenuItem::Reload => Some('r'),
            MenuItem::Debug => Some('d'),
            MenuItem::Issues => Some('i'),
            MenuItem::Pause15m => Some('1'),
            MenuItem::Pause1h => Some('2'),
            MenuItem::Remaining | MenuItem::Pause => None,
        }
    }

    pub fn from_shortcut(key: char) -> Option<MenuItem> {
        MENU_ORDER
            .iter()
            .copied()
            .find(|item| item.shortcut() == Some(key))
    }

    /// Sub-items render indented under Pause
    pub fn is_submenu(self) -> bool {
        matches!(self, MenuItem::Pause15m | MenuItem::Pause1h)
    }

    fn development_only(self) -> bool {
        matches!(self, MenuItem::Debug | MenuItem::Issues)
    }
}

const MENU_ORDER: [MenuItem; 7] = [
    MenuItem::Reload,
    MenuItem::Debug,
    MenuItem::Issues,
    MenuItem::Remaining,
    MenuItem::Pause,
    MenuItem::Pause15m,
    MenuItem::Pause1h,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub title: String,
    pub checked: bool,
}

#[derive(Debug, Clone)]
pub struct Menu {
    entries: HashMap<MenuItem, MenuEntry>,
}

impl Menu {
    pub fn new(development: bool) -> Self {
        let mut menu = Menu {
            entries: HashMap::new(),
        };
        menu.set_development(development);
        menu
    }

    /// Add or drop the development-only items, keeping everything else
    pub fn set_development(&mut self, development: bool) {
        for item in MENU_ORDER {
            if item.development_only() && !development {
                self.entries.remove(&item);
            } else {
                self.entries.entry(item).or_insert_with(|| MenuEntry {
                    title: item.default_title().to_string(),
                    checked: false,
                });
            }
        }
    }

    pub fn contains(&self, item: MenuItem) -> bool {
        self.entries.contains_key(&item)
    }

    pub fn get(&self, item: MenuItem) -> Option<&MenuEntry> {
        self.entries.get(&item)
    }

    pub fn set_title(&mut self, item: MenuItem, title: String) {
        if let Some(entry) = self.entries.get_mut(&item) {
            entry.title = title;
        }
    }

    pub fn set_checked(&mut self, item: MenuItem, checked: bool) {
        if let Some(entry) = self.entries.get_mut(&item) {
            entry.checked = checked;
        }
    }

    /// Entries in display order
    pub fn iter(&self) -> impl Iterator<Item = (MenuItem, &MenuEntry)> {
        MENU_ORDER
            .iter()
            .filter_map(|item| self.entries.get(item).map(|entry| (*item, entry)))
    }
}
