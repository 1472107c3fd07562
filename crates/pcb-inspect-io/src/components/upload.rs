//! Image picker with drag-and-drop.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;

/// Allowed file extensions for board images.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Check whether a filename has an allowed image extension.
#[must_use]
pub fn has_allowed_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ext))
    })
}

/// Props for the [`FileUpload`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FileUploadProps {
    /// Called with the raw file bytes and filename once a file is read.
    on_upload: EventHandler<(Vec<u8>, String)>,
    /// Ignore picks and drops while a run is in flight.
    #[props(default)]
    disabled: bool,
}

/// The "Upload Image" button, also accepting a dropped file.
///
/// A cancelled picker does nothing. A file with a disallowed extension
/// is reported inline and never reaches `on_upload`.
#[component]
pub fn FileUpload(props: FileUploadProps) -> Element {
    let mut dragging = use_signal(|| false);
    let mut error = use_signal(|| Option::<String>::None);
    let disabled = props.disabled;

    let process_files = move |files: Vec<FileData>| async move {
        if disabled {
            return;
        }
        let Some(file) = files.first() else {
            return;
        };
        let name = file.name();
        if !has_allowed_extension(&name) {
            error.set(Some(format!("Unsupported file type: {name}")));
            return;
        }
        match file.read_bytes().await {
            Ok(bytes) => {
                error.set(None);
                props.on_upload.call((bytes.to_vec(), name));
            }
            Err(e) => {
                error.set(Some(format!("Failed to read file: {e}")));
            }
        }
    };

    let handle_files = move |evt: FormEvent| async move {
        process_files(evt.files()).await;
    };

    let handle_drop = move |evt: DragEvent| async move {
        evt.prevent_default();
        dragging.set(false);
        process_files(evt.files()).await;
    };

    let zone_class = if dragging() && !disabled {
        "upload-zone dragging"
    } else {
        "upload-zone"
    };
    let button_class = if disabled { "btn primary disabled" } else { "btn primary" };

    rsx! {
        div {
            class: "{zone_class}",
            ondragover: move |evt| {
                evt.prevent_default();
                dragging.set(true);
            },
            ondragleave: move |_| {
                dragging.set(false);
            },
            ondrop: handle_drop,

            label { class: "{button_class}",
                input {
                    r#type: "file",
                    accept: ".jpg,.jpeg,.png",
                    class: "hidden",
                    disabled,
                    onchange: handle_files,
                }
                "Upload Image"
            }

            if let Some(ref err) = error() {
                p { class: "status error", "{err}" }
            }
        }
    }
}
