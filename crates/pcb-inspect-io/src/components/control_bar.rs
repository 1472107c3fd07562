//! Upload and Clear buttons with the busy indicator.

use dioxus::prelude::*;

use super::upload::FileUpload;

#[derive(Props, Clone, PartialEq)]
pub struct ControlBarProps {
    /// `false` while a run is in flight.
    enabled: bool,
    on_upload: EventHandler<(Vec<u8>, String)>,
    on_clear: EventHandler<()>,
}

#[component]
pub fn ControlBar(props: ControlBarProps) -> Element {
    let busy = !props.enabled;
    let clear_class = if busy { "btn disabled" } else { "btn" };

    rsx! {
        div { class: "controls",
            FileUpload {
                on_upload: props.on_upload,
                disabled: busy,
            }
            button {
                class: "{clear_class}",
                disabled: busy,
                onclick: move |_| props.on_clear.call(()),
                "Clear"
            }
            if busy {
                div { class: "progress", role: "progressbar",
                    div { class: "progress-bar" }
                }
            }
        }
    }
}
