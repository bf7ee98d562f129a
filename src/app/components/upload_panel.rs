use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dragdrop::{dropped_file, DropZone};
use leptos_toast::{Notification, ToastKind};
use wasm_bindgen_futures::JsFuture;

use crate::app::error::AppError;
use crate::app::polling::{refresh_uploads, start_upload_polling};
use crate::app::state::AppState;
use crate::app::types::UploadRecord;
use crate::app::uploads::{apply_deletion, details_href, status_class, status_label, validate_file_name, validate_header};

async fn read_text(file: &web_sys::File) -> Result<String, AppError> {
    let text = JsFuture::from(file.text())
        .await
        .map_err(|_| AppError::Validation("Could not read the file".into()))?;
    text.as_string().ok_or_else(|| AppError::Validation("Could not read the file".into()))
}

async fn upload(state: AppState, file: web_sys::File) -> Result<(), AppError> {
    validate_file_name(&file.name())?;
    validate_header(&read_text(&file).await?)?;

    let api = state.api.get_value();
    let file_id = api.upload_csv(&file).await?;
    log::info!("uploaded {} as {}", file.name(), file_id);
    state.toaster.info("File uploaded, processing started");

    if state.with_uploads(|u| u.record_upload(&file_id)).unwrap_or(false) {
        refresh_uploads(state).await;
        start_upload_polling(state);
    }
    Ok(())
}

fn handle_file(state: AppState, file: web_sys::File) {
    spawn_local(async move {
        if let Err(e) = upload(state, file).await {
            log::warn!("upload failed: {}", e);
            let kind = if matches!(e, AppError::Transport(_)) { ToastKind::Error } else { ToastKind::Warning };
            state.toaster.show(Notification::new("", e.user_message(), kind));
        }
    });
}

fn delete_upload(state: AppState, file_id: String) {
    let confirmed = web_sys::window()
        .and_then(|w| {
            w.confirm_with_message("Delete this file? Its books and comments will be deleted as well.")
                .ok()
        })
        .unwrap_or(false);
    if !confirmed {
        return;
    }
    let api = state.api.get_value();
    spawn_local(async move {
        match api.delete_upload(&file_id).await {
            Ok(summary) => {
                let mut message = String::new();
                state.upload_rows.update(|rows| message = apply_deletion(rows, &file_id, &summary));
                state.toaster.info(message);
                refresh_uploads(state).await;
            }
            Err(e) => {
                log::warn!("delete of {} failed: {}", file_id, e);
                state.toaster.show(Notification::new("", e.user_message(), ToastKind::Error));
            }
        }
    });
}

fn upload_row(state: AppState, record: UploadRecord) -> impl IntoView {
    let href = details_href(&record.file_id);
    let file_id = record.file_id.clone();
    view! {
        <tr>
            <td>{record.filename.clone()}</td>
            <td>{record.size.clone()}</td>
            <td><span class=status_class(record.status)>{status_label(&record)}</span></td>
            <td>{record.upload_time.clone()}</td>
            <td>{record.last_updated.clone()}</td>
            <td>{record.total_records.unwrap_or(0)}</td>
            <td>{record.error_message.clone().unwrap_or_else(|| "-".to_string())}</td>
            <td>
                <a class="btn btn-xs" href=href>"Details"</a>
                <button class="btn btn-xs btn-danger" on:click=move |_| delete_upload(state, file_id.clone())>
                    "Delete"
                </button>
            </td>
        </tr>
    }
}

/// CSV upload area and the session's upload history table.
#[component]
pub fn UploadPanel(state: AppState) -> impl IntoView {
    let zone = DropZone::new();
    let rows = state.upload_rows;

    spawn_local(async move {
        if refresh_uploads(state).await != Some(true) {
            start_upload_polling(state);
        }
    });

    view! {
        <section class="upload-panel">
            <div
                id="uploadArea"
                class=move || if zone.hovering.get() { "upload-area drag-over" } else { "upload-area" }
                on:dragover=move |ev: web_sys::DragEvent| zone.drag_over(&ev)
                on:dragleave=move |ev: web_sys::DragEvent| zone.drag_leave(&ev)
                on:drop=move |ev: web_sys::DragEvent| {
                    zone.drop(&ev);
                    if let Some(file) = dropped_file(&ev) {
                        handle_file(state, file);
                    }
                }
            >
                <p>"Drop a CSV file here, or"</p>
                <input
                    type="file"
                    accept=".csv"
                    on:change=move |ev| {
                        let input = event_target::<web_sys::HtmlInputElement>(&ev);
                        if let Some(file) = input.files().and_then(|files| files.item(0)) {
                            handle_file(state, file);
                        }
                        input.set_value("");
                    }
                />
                <p class="hint">"Required columns: book_id, book_title, comment_id, content"</p>
            </div>
            <div class="panel-header">
                <h3>"Uploads this session"</h3>
                <button
                    class="refresh-btn"
                    on:click=move |_| {
                        spawn_local(async move {
                            if let Some(finished) = refresh_uploads(state).await {
                                state.toaster.info("Upload history refreshed");
                                if !finished {
                                    start_upload_polling(state);
                                }
                            }
                        });
                    }
                >
                    "Refresh"
                </button>
            </div>
            <table id="uploadHistory" class="upload-table">
                <thead>
                    <tr>
                        <th>"File"</th>
                        <th>"Size"</th>
                        <th>"Status"</th>
                        <th>"Uploaded"</th>
                        <th>"Updated"</th>
                        <th>"Records"</th>
                        <th>"Error"</th>
                        <th>"Actions"</th>
                    </tr>
                </thead>
                <tbody>
                    {move || {
                        let records = rows.get();
                        if records.is_empty() {
                            view! { <tr><td colspan="8" class="empty-row">"No uploads yet"</td></tr> }.into_any()
                        } else {
                            records.into_iter().map(|r| upload_row(state, r)).collect_view().into_any()
                        }
                    }}
                </tbody>
            </table>
        </section>
    }
}
