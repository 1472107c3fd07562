//! The defect analysis panel model.
//!
//! The panel is rebuilt from scratch on every run: the previous cards
//! are dropped and one new card is created per detection, in the order
//! the model returned them. There is no incremental diffing.

use serde::Serialize;

use crate::catalog::DefectCatalog;
use crate::types::Detection;

/// Placeholder shown when a run finished without detections.
pub const NO_DEFECTS_PLACEHOLDER: &str = "No defects found";

/// Placeholder shown before any run and after a clear.
pub const IDLE_PLACEHOLDER: &str = "Upload an image to see the defect analysis.";

/// One rendered detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultCard {
    pub class_name: String,
    /// Confidence as an integer percentage, e.g. `"95%"`.
    pub confidence: String,
    pub description: String,
    pub remedy: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum PanelState {
    #[default]
    Idle,
    Built(Vec<ResultCard>),
}

/// Cards for the detections of the most recent completed run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultsPanel {
    state: PanelState,
}

impl ResultsPanel {
    /// An empty panel showing [`IDLE_PLACEHOLDER`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all cards and build one per detection.
    pub fn rebuild(&mut self, detections: &[Detection], catalog: &DefectCatalog) {
        let cards = detections
            .iter()
            .map(|detection| {
                let entry = catalog.lookup(&detection.class_name);
                ResultCard {
                    class_name: detection.class_name.clone(),
                    confidence: format_confidence(detection.confidence),
                    description: entry.description.to_owned(),
                    remedy: entry.remedy.to_owned(),
                }
            })
            .collect();
        self.state = PanelState::Built(cards);
    }

    /// Drop all cards and go back to the idle placeholder.
    pub fn clear(&mut self) {
        self.state = PanelState::Idle;
    }

    #[must_use]
    pub fn cards(&self) -> &[ResultCard] {
        match &self.state {
            PanelState::Idle => &[],
            PanelState::Built(cards) => cards,
        }
    }

    /// The placeholder text to show instead of cards, if any.
    #[must_use]
    pub fn placeholder(&self) -> Option<&'static str> {
        match &self.state {
            PanelState::Idle => Some(IDLE_PLACEHOLDER),
            PanelState::Built(cards) if cards.is_empty() => Some(NO_DEFECTS_PLACEHOLDER),
            PanelState::Built(_) => None,
        }
    }

    /// Returns `true` before any run and after a clear.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, PanelState::Idle)
    }
}

/// Format a confidence in `[0, 1]` as a whole percentage.
///
/// ```
/// assert_eq!(pcb_inspect_core::results::format_confidence(0.947), "95%");
/// ```
#[must_use]
pub fn format_confidence(confidence: f32) -> String {
    format!("{:.0}%", f64::from(confidence) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    fn detection(class_name: &str, confidence: f32) -> Detection {
        Detection {
            class_name: class_name.to_owned(),
            confidence,
            bounding_box: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
        }
    }

    #[test]
    fn new_panel_is_idle() {
        let panel = ResultsPanel::new();
        assert!(panel.is_idle());
        assert!(panel.cards().is_empty());
        assert_eq!(panel.placeholder(), Some(IDLE_PLACEHOLDER));
    }

    #[test]
    fn rebuild_empty_shows_no_defects() {
        let mut panel = ResultsPanel::new();
        panel.rebuild(&[], &DefectCatalog::builtin());
        assert!(panel.cards().is_empty());
        assert_eq!(panel.placeholder(), Some(NO_DEFECTS_PLACEHOLDER));
        assert!(!panel.is_idle());
    }

    #[test]
    fn rebuild_keeps_model_order() {
        let mut panel = ResultsPanel::new();
        let detections = [
            detection("spur", 0.81),
            detection("short", 0.60),
            detection("spur", 0.99),
        ];
        panel.rebuild(&detections, &DefectCatalog::builtin());

        let cards = panel.cards();
        assert_eq!(cards.len(), 3);
        assert_eq!(panel.placeholder(), None);
        let summary: Vec<_> = cards
            .iter()
            .map(|c| (c.class_name.as_str(), c.confidence.as_str()))
            .collect();
        assert_eq!(summary, [("spur", "81%"), ("short", "60%"), ("spur", "99%")]);
        assert_eq!(
            cards[1].remedy,
            "Cut the bridging material or use desoldering tools to separate."
        );
    }

    #[test]
    fn rebuild_replaces_previous_cards() {
        let catalog = DefectCatalog::builtin();
        let mut panel = ResultsPanel::new();
        panel.rebuild(&[detection("spur", 0.5), detection("short", 0.5)], &catalog);
        panel.rebuild(&[detection("missing_hole", 0.7)], &catalog);
        assert_eq!(panel.cards().len(), 1);
        assert_eq!(panel.cards()[0].class_name, "missing_hole");
    }

    #[test]
    fn rebuild_is_idempotent() {
        let catalog = DefectCatalog::builtin();
        let detections = [detection("Open_Circuit", 0.42), detection("mouse_bite", 0.9)];
        let mut a = ResultsPanel::new();
        a.rebuild(&detections, &catalog);
        let mut b = a.clone();
        b.rebuild(&detections, &catalog);
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_class_uses_na() {
        let mut panel = ResultsPanel::new();
        panel.rebuild(&[detection("via_crack", 0.33)], &DefectCatalog::builtin());
        let card = &panel.cards()[0];
        assert_eq!(card.class_name, "via_crack");
        assert_eq!(card.description, "N/A");
        assert_eq!(card.remedy, "N/A");
    }

    #[test]
    fn catalog_lookup_ignores_case_but_card_keeps_model_name() {
        let mut panel = ResultsPanel::new();
        panel.rebuild(&[detection("Short", 0.5)], &DefectCatalog::builtin());
        let card = &panel.cards()[0];
        assert_eq!(card.class_name, "Short");
        assert_eq!(card.description, "Unintended connection between two conductors.");
    }

    #[test]
    fn clear_returns_to_idle() {
        let mut panel = ResultsPanel::new();
        panel.rebuild(&[detection("spur", 0.5)], &DefectCatalog::builtin());
        panel.clear();
        assert!(panel.is_idle());
        assert!(panel.cards().is_empty());
    }

    #[test]
    fn confidence_formatting() {
        assert_eq!(format_confidence(0.947), "95%");
        assert_eq!(format_confidence(0.81), "81%");
        assert_eq!(format_confidence(0.6), "60%");
        assert_eq!(format_confidence(0.99), "99%");
        assert_eq!(format_confidence(1.0), "100%");
        assert_eq!(format_confidence(0.0), "0%");
        assert_eq!(format_confidence(0.004), "0%");
    }
}
