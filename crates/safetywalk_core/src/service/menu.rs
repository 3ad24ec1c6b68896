//! Sidebar menu descriptors derived from record partitions.

use crate::host::view::ViewSurface;
use crate::model::record::Record;
use log::error;

/// Template the host shows for a menu with no items.
pub const EMPTY_MENU_TEMPLATE: &str = "./menu.html";

const ICON_CLASS: &str = "material-icons";

/// One of the three sidebar menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuSection {
    DeferredIssues,
    ResolvedIssues,
    Instructions,
}

impl MenuSection {
    pub fn title(self) -> &'static str {
        match self {
            Self::DeferredIssues => "Maintenance Issues",
            Self::ResolvedIssues => "Maintenance Resolved Issues",
            Self::Instructions => "Instruction POI's",
        }
    }

    pub fn ligature(self) -> &'static str {
        match self {
            Self::DeferredIssues => "report_problem",
            Self::ResolvedIssues => "done",
            Self::Instructions => "book",
        }
    }

    pub fn icon(self) -> MenuIcon {
        MenuIcon {
            class_name: ICON_CLASS.to_string(),
            ligature: self.ligature().to_string(),
        }
    }
}

/// Ligature icon rendered by the host sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuIcon {
    pub class_name: String,
    pub ligature: String,
}

/// Entry bound to a navigate-and-close action.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub title: String,
    pub icon: MenuIcon,
    pub target: Record,
}

impl MenuItem {
    /// Closes the sidebar and flies to the target record.
    ///
    /// Navigation failure is logged and swallowed.
    pub fn activate(&self, view: &dyn ViewSurface) {
        view.close_menu();
        if let Err(err) = view.go_to_poi(&self.target) {
            error!(
                "event=menu_navigate module=menu status=error poi_id={} error={err}",
                display_id(&self.target)
            );
        }
    }
}

/// Fully built sidebar menu.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuDescriptor {
    pub section: MenuSection,
    pub title: String,
    pub icon: MenuIcon,
    /// Same order as the repository listing.
    pub items: Vec<MenuItem>,
    /// `Some(EMPTY_MENU_TEMPLATE)` when there are no items.
    pub template: Option<&'static str>,
}

impl MenuDescriptor {
    pub fn build(section: MenuSection, records: &[Record]) -> Self {
        let icon = section.icon();
        let items: Vec<MenuItem> = records
            .iter()
            .map(|record| MenuItem {
                title: record.title.clone(),
                icon: icon.clone(),
                target: record.clone(),
            })
            .collect();
        let template = items.is_empty().then_some(EMPTY_MENU_TEMPLATE);
        Self {
            section,
            title: section.title().to_string(),
            icon,
            items,
            template,
        }
    }

    pub fn item_titles(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.title.as_str()).collect()
    }
}

pub(crate) fn display_id(record: &Record) -> String {
    record
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unsaved".to_string())
}
