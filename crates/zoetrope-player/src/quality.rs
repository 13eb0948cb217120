//! Quality ladder bookkeeping.
//!
//! The registry mirrors the engine's level reports into a UI-facing list:
//! an automatic pseudo-entry first, then concrete levels ordered by height.
//! List and selection are only republished when they actually change, so
//! periodic ladder reports from the engine stay quiet.

use tracing::debug;
use zoetrope_engine::{LevelId, LevelInfo};

/// Quality choice held by a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    /// The engine picks the rendition adaptively.
    #[default]
    Auto,
    /// Playback is pinned to one concrete level.
    Manual(LevelId),
}

/// One row of the selectable quality list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualityLevel {
    /// Selection to submit when the user picks this row.
    pub selector: Selection,
    /// Vertical resolution, when the row is a concrete level.
    pub height: Option<u32>,
    /// Display label, e.g. `Auto`, `720p`.
    pub label: String,
}

/// Selection as published to the UI.
///
/// While in automatic mode the label stays `Auto` no matter which rendition
/// the engine is actually feeding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SelectionView {
    pub selection: Selection,
    pub label: String,
}

/// What a ladder report changed, if anything.
#[derive(Debug, Default)]
pub(crate) struct ReconcileOutcome {
    pub list: Option<Vec<QualityLevel>>,
    pub selection: Option<SelectionView>,
}

const AUTO_LABEL: &str = "Auto";

fn level_label(level: &LevelInfo) -> String {
    if level.height > 0 {
        return format!("{}p", level.height);
    }
    match &level.name {
        Some(name) if !name.is_empty() => name.clone(),
        _ => format!("level {}", level.id.0),
    }
}

#[derive(Debug)]
pub(crate) struct QualityRegistry {
    /// Concrete levels from the last report, ascending by height.
    levels: Vec<LevelInfo>,
    selection: Selection,
    published_list: Option<Vec<QualityLevel>>,
    published_view: Option<SelectionView>,
}

impl QualityRegistry {
    pub(crate) fn new() -> Self {
        Self {
            levels: Vec::new(),
            selection: Selection::Auto,
            published_list: None,
            published_view: None,
        }
    }

    pub(crate) fn selection(&self) -> Selection {
        self.selection
    }

    /// Absorbs a ladder report from the engine.
    ///
    /// A manual pin survives as long as its level id is still reported;
    /// when the id vanishes the selection falls back to automatic.
    pub(crate) fn reconcile(&mut self, reported: &[LevelInfo]) -> ReconcileOutcome {
        let mut levels = reported.to_vec();
        // Stable sort keeps engine order between equal heights.
        levels.sort_by_key(|level| level.height);
        self.levels = levels;

        if let Selection::Manual(id) = self.selection {
            if !self.contains(id) {
                debug!(level = %id, "pinned level vanished from ladder, back to auto");
                self.selection = Selection::Auto;
            }
        }

        ReconcileOutcome {
            list: self.publish_list(),
            selection: self.publish_view(),
        }
    }

    /// Records a selection intent. Pins to unknown level ids are refused.
    ///
    /// The published view is left untouched here; it catches up when the
    /// engine confirms the switch.
    pub(crate) fn select(&mut self, selection: Selection) -> bool {
        if let Selection::Manual(id) = selection {
            if !self.contains(id) {
                return false;
            }
        }
        self.selection = selection;
        true
    }

    /// Publishes the current view if it drifted from the last published one.
    ///
    /// Called when the engine reports a level switch; in automatic mode the
    /// view is insensitive to which rendition was switched to.
    pub(crate) fn level_switched(&mut self) -> Option<SelectionView> {
        self.publish_view()
    }

    /// Forgets the ladder and the selection, republishing the empty state.
    pub(crate) fn reset(&mut self) -> ReconcileOutcome {
        self.selection = Selection::Auto;
        self.reconcile(&[])
    }

    fn contains(&self, id: LevelId) -> bool {
        self.levels.iter().any(|level| level.id == id)
    }

    fn view(&self) -> SelectionView {
        let label = match self.selection {
            Selection::Auto => AUTO_LABEL.to_owned(),
            Selection::Manual(id) => self
                .levels
                .iter()
                .find(|level| level.id == id)
                .map(level_label)
                .unwrap_or_else(|| format!("level {}", id.0)),
        };
        SelectionView {
            selection: self.selection,
            label,
        }
    }

    fn list(&self) -> Vec<QualityLevel> {
        let mut rows = Vec::with_capacity(self.levels.len() + 1);
        rows.push(QualityLevel {
            selector: Selection::Auto,
            height: None,
            label: AUTO_LABEL.to_owned(),
        });
        rows.extend(self.levels.iter().map(|level| QualityLevel {
            selector: Selection::Manual(level.id),
            height: Some(level.height),
            label: level_label(level),
        }));
        rows
    }

    fn publish_list(&mut self) -> Option<Vec<QualityLevel>> {
        let list = self.list();
        if self.published_list.as_ref() == Some(&list) {
            return None;
        }
        self.published_list = Some(list.clone());
        Some(list)
    }

    fn publish_view(&mut self) -> Option<SelectionView> {
        let view = self.view();
        if self.published_view.as_ref() == Some(&view) {
            return None;
        }
        self.published_view = Some(view.clone());
        Some(view)
    }
}
