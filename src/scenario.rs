//! Recorded touch scenarios
//!
//! A scenario seeds the home screen (pages, workspace items, the all apps
//! list) and lists timed input steps to replay through it:
//!
//! ```toml
//! [workspace]
//! pages = 2
//!
//! [[workspace.items]]
//! id = 10
//! title = "Phone"
//! component = "org.flick.phone"
//! x = 0
//! y = 0
//!
//! [[steps]]
//! at = 0
//! action = "down"
//! x = 90.0
//! y = 230.0
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::caps::PlatformCaps;
use crate::config::EngineConfig;
use crate::dnd::{ItemContainer, ItemInfo};
use crate::error::{Error, Result};
use crate::input::TouchEvent;
use crate::state::{HomeScreen, HomeView};
use crate::timers::Scheduler;

fn one() -> usize {
    1
}

/// An item seeded on the workspace
#[derive(Debug, Clone, Deserialize)]
pub struct ItemSpec {
    pub id: u64,
    pub title: String,
    /// App component; makes the item a shortcut
    #[serde(default)]
    pub component: Option<String>,
    /// Widget provider; makes the item a widget
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default = "one")]
    pub span_x: usize,
    #[serde(default = "one")]
    pub span_y: usize,
    #[serde(default)]
    pub panel: usize,
    pub x: usize,
    pub y: usize,
}

impl ItemSpec {
    fn to_item(&self) -> Result<ItemInfo> {
        match (&self.provider, &self.component) {
            (Some(provider), _) => Ok(ItemInfo::widget(self.id, &self.title, provider, self.span_x, self.span_y)),
            (None, Some(component)) => Ok(ItemInfo::app(self.id, &self.title, component, ItemContainer::Workspace)),
            (None, None) => Err(Error::Scenario(format!(
                "item {} needs a component or a provider",
                self.id
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSpec {
    pub id: u64,
    pub title: String,
    pub component: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceSpec {
    #[serde(default = "one")]
    pub pages: usize,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
}

impl Default for WorkspaceSpec {
    fn default() -> Self {
        Self {
            pages: 1,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Down {
        #[serde(default)]
        slot: i32,
        x: f64,
        y: f64,
    },
    Move {
        #[serde(default)]
        slot: i32,
        x: f64,
        y: f64,
    },
    Up {
        #[serde(default)]
        slot: i32,
    },
    Cancel,
    View {
        view: HomeView,
    },
    /// Saved page state coming back; either value may be missing
    Restore {
        #[serde(default)]
        current: Option<i64>,
        #[serde(default)]
        total: Option<i64>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    /// Milliseconds from the start of the scenario
    pub at: u64,
    #[serde(flatten)]
    pub action: Action,
}

impl Step {
    /// Feed this step into the engine
    pub fn apply<S: Scheduler>(&self, home: &mut HomeScreen<S>) {
        debug!(at = self.at, action = ?self.action, "Scenario step");
        match self.action {
            Action::Down { slot, x, y } => home.handle_touch(TouchEvent::Down { slot, x, y }),
            Action::Move { slot, x, y } => home.handle_touch(TouchEvent::Motion { slot, x, y }),
            Action::Up { slot } => home.handle_touch(TouchEvent::Up { slot }),
            Action::Cancel => home.handle_touch(TouchEvent::Cancel),
            Action::View { view } => home.set_view(view),
            Action::Restore { current, total } => {
                home.restore(current, total);
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Overrides the engine config file
    #[serde(default)]
    pub config: Option<EngineConfig>,
    #[serde(default)]
    pub workspace: WorkspaceSpec,
    #[serde(default)]
    pub apps: Vec<AppSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_toml(contents: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(contents).map_err(|e| Error::Scenario(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::from_toml(&contents)?;
        info!(steps = scenario.steps.len(), "Loaded scenario from {:?}", path);
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        if let Some(pair) = self.steps.windows(2).find(|w| w[1].at < w[0].at) {
            return Err(Error::Scenario(format!(
                "steps out of order: {}ms after {}ms",
                pair[1].at, pair[0].at
            )));
        }
        Ok(())
    }

    /// Time of the last step
    pub fn duration(&self) -> u64 {
        self.steps.last().map_or(0, |s| s.at)
    }

    /// The embedded config if there is one, else `base`
    pub fn effective_config(&self, base: &EngineConfig) -> EngineConfig {
        self.config.clone().unwrap_or_else(|| base.clone())
    }

    /// Build a home screen seeded with this scenario's items and apps
    pub fn build<S: Scheduler>(&self, base: &EngineConfig, scheduler: S, caps: &PlatformCaps) -> Result<HomeScreen<S>> {
        let apps = self
            .apps
            .iter()
            .map(|a| ItemInfo::app(a.id, &a.title, &a.component, ItemContainer::AllApps))
            .collect();
        let mut home = HomeScreen::new(self.effective_config(base), scheduler, caps, self.workspace.pages, apps);
        for entry in &self.workspace.items {
            let item = entry.to_item()?;
            if !home.seed_item(entry.panel, item, entry.x, entry.y) {
                return Err(Error::Scenario(format!(
                    "item {} does not fit at panel {} ({}, {})",
                    entry.id, entry.panel, entry.x, entry.y
                )));
            }
        }
        Ok(home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnd::ItemKind;

    #[test]
    fn test_parse_full_scenario() {
        let scenario = Scenario::from_toml(
            r#"
            [config.timing]
            long_press_ms = 300

            [workspace]
            pages = 3

            [[workspace.items]]
            id = 1
            title = "Clock"
            provider = "org.flick.clock"
            span_x = 2
            span_y = 2
            x = 1
            y = 1

            [[apps]]
            id = 7
            title = "Camera"
            component = "org.flick.camera"

            [[steps]]
            at = 0
            action = "down"
            x = 10.0
            y = 20.0

            [[steps]]
            at = 50
            action = "move"
            slot = 1
            x = 12.5
            y = 20.0

            [[steps]]
            at = 60
            action = "view"
            view = "all_apps"

            [[steps]]
            at = 70
            action = "restore"
            current = 1
            "#,
        )
        .unwrap();

        assert_eq!(scenario.config.as_ref().map(|c| c.timing.long_press_ms), Some(300));
        assert_eq!(scenario.workspace.pages, 3);
        let item = scenario.workspace.items[0].to_item().unwrap();
        assert!(matches!(item.kind, ItemKind::Widget { .. }));
        assert_eq!((item.span_x, item.span_y), (2, 2));
        assert_eq!(scenario.duration(), 70);
        assert_eq!(
            scenario.steps.iter().map(|s| s.action.clone()).collect::<Vec<_>>(),
            vec![
                Action::Down { slot: 0, x: 10.0, y: 20.0 },
                Action::Move { slot: 1, x: 12.5, y: 20.0 },
                Action::View { view: HomeView::AllApps },
                Action::Restore { current: Some(1), total: None },
            ]
        );
    }

    #[test]
    fn test_steps_must_be_ordered() {
        let err = Scenario::from_toml(
            r#"
            [[steps]]
            at = 100
            action = "cancel"

            [[steps]]
            at = 50
            action = "cancel"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Scenario(_)));
    }

    #[test]
    fn test_unknown_action_is_a_scenario_error() {
        let err = Scenario::from_toml("[[steps]]\nat = 0\naction = \"jump\"\n").unwrap_err();
        assert!(matches!(err, Error::Scenario(_)));
    }

    #[test]
    fn test_overlapping_items_fail_to_build() {
        let scenario = Scenario::from_toml(
            r#"
            [[workspace.items]]
            id = 1
            title = "A"
            component = "org.flick.a"
            x = 0
            y = 0

            [[workspace.items]]
            id = 2
            title = "B"
            component = "org.flick.b"
            x = 0
            y = 0
            "#,
        )
        .unwrap();
        let result = scenario.build(
            &EngineConfig::default(),
            crate::timers::ManualScheduler::new(),
            &PlatformCaps::default(),
        );
        assert!(matches!(result, Err(Error::Scenario(_))));
    }

    #[test]
    fn test_item_without_component_or_provider() {
        let scenario = Scenario::from_toml("[[workspace.items]]\nid = 3\ntitle = \"?\"\nx = 0\ny = 0\n").unwrap();
        assert!(scenario.workspace.items[0].to_item().is_err());
    }
}
