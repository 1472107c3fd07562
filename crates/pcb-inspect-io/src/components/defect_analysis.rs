//! Scrollable list of result cards.

use dioxus::prelude::*;
use pcb_inspect_core::ResultsPanel;

#[derive(Props, Clone, PartialEq)]
pub struct DefectAnalysisProps {
    panel: ResultsPanel,
}

/// Renders a [`ResultsPanel`]: either its placeholder or one card per
/// detection, in model order.
#[component]
pub fn DefectAnalysis(props: DefectAnalysisProps) -> Element {
    let placeholder = props.panel.placeholder();
    let cards = props.panel.cards();

    rsx! {
        section { class: "card analysis",
            h2 { class: "card-title", "Defect Analysis" }
            div { class: "analysis-scroll",
                if let Some(text) = placeholder {
                    p { class: "status muted placeholder", "{text}" }
                }
                for (i, card) in cards.iter().enumerate() {
                    div { key: "{i}", class: "defect-card",
                        div { class: "defect-header",
                            span { class: "defect-name", "{card.class_name}" }
                            span { class: "defect-confidence", "{card.confidence}" }
                        }
                        p { class: "defect-description", "{card.description}" }
                        p { class: "defect-remedy", "Remedy: {card.remedy}" }
                    }
                }
            }
        }
    }
}
