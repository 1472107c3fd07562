//! One titled image card: the surface bitmap plus its status line.

use dioxus::prelude::*;
use pcb_inspect_core::{ImageSurface, StatusLine, StatusTone};
use tracing::warn;

use crate::raster::rgb_image_to_data_url;

/// CSS class for a status tone.
#[must_use]
pub const fn tone_class(tone: StatusTone) -> &'static str {
    match tone {
        StatusTone::Muted => "status muted",
        StatusTone::Normal => "status",
        StatusTone::Accent => "status accent",
        StatusTone::Error => "status error",
    }
}

#[derive(Props, Clone, PartialEq)]
pub struct ImagePanelProps {
    #[props(into)]
    title: String,
    surface: ImageSurface,
    status: StatusLine,
}

/// Shows an [`ImageSurface`].
///
/// Props compare the surface by bitmap identity, so the PNG encode only
/// runs when the surface was actually updated or reset.
#[component]
pub fn ImagePanel(props: ImagePanelProps) -> Element {
    let src = match rgb_image_to_data_url(props.surface.image()) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(error = %e, panel = %props.title, "failed to encode panel image");
            None
        }
    };
    let dims = props.surface.dimensions();
    let status_class = tone_class(props.status.tone);

    rsx! {
        section { class: "card",
            h2 { class: "card-title", "{props.title}" }
            div { class: "image-frame",
                if let Some(src) = src {
                    img {
                        src: "{src}",
                        width: "{dims.width}",
                        height: "{dims.height}",
                        alt: "{props.title}",
                    }
                }
            }
            p { class: "{status_class}", "{props.status.text}" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_tone_is_distinct() {
        assert_eq!(tone_class(StatusTone::Error), "status error");
        assert_ne!(tone_class(StatusTone::Accent), tone_class(StatusTone::Muted));
    }
}
