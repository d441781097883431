//! ドキュメント詳細
//!
//! The page owns the annotation state through a [`DocumentSession`]; every
//! edit in the viewer or the label panel is saved to the backend.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use score_scan_common::command;
use score_scan_common::routes::Route;
use score_scan_common::{DocumentSession, Viewer};

use crate::app::AppContext;
use crate::components::label_panel::LabelPanel;
use crate::components::pdf_viewer::PdfViewer;

#[component]
pub fn DocumentDetailPage(task_id: String) -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let viewer = RwSignal::new(Viewer::new(Box::new(DocumentSession::new(task_id.clone()))));
    let (handle, commands) = command::channel();
    let handle = StoredValue::new(handle);
    let error = RwSignal::new(None::<String>);

    {
        let api = ctx.api.clone();
        let task_id = task_id.clone();
        spawn_local(async move {
            match api.pages(&task_id).await {
                Ok(response) => {
                    viewer.try_update(|v| v.load_pages(response.pages));
                }
                Err(e) => {
                    error.try_set(Some(format!("ページの取得に失敗しました: {e}")));
                }
            }
        });
    }

    let navigate = ctx.navigate;

    view! {
        <div class="document-detail">
            <div class="page-header">
                <button class="secondary" on:click=move |_| navigate.run(Route::Documents)>
                    "← 一覧へ"
                </button>
                <h2>{format!("ドキュメント #{task_id}")}</h2>
                <button
                    class="primary"
                    on:click=move |_| {
                        handle.with_value(|h| h.recognize_text());
                    }
                >
                    "テキスト認識"
                </button>
            </div>
            {move || error.get().map(|message| view! { <p class="error-message">{message}</p> })}
            <div class="detail-layout">
                <PdfViewer viewer=viewer commands=commands />
                <LabelPanel viewer=viewer />
            </div>
        </div>
    }
}
