//! パート検出
//!
//! Pick a processed document (or upload one), label Title and Voice on a
//! page, detect the voices across the score and export them as PDFs. The
//! viewer keeps its state in memory here; nothing is saved.

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use score_scan_common::command::{self, ViewerHandle};
use score_scan_common::export::ExportFormat;
use score_scan_common::voices::{self, voice_pdf_url, zip_download_url};
use score_scan_common::{
    ExportMeta, InternalModel, Result, TaskStatus, TaskSummary, Viewer, VoiceTable,
};

use crate::api::ApiClient;
use crate::app::AppContext;
use crate::components::label_panel::LabelPanel;
use crate::components::pdf_viewer::PdfViewer;
use crate::components::toast::Toasts;
use crate::components::upload_area::UploadArea;
use crate::components::voices_table::VoicesTable;
use crate::download;

/// State shared by the handlers of this page.
#[derive(Clone, Copy)]
struct ScanState {
    viewer: RwSignal<Viewer>,
    handle: StoredValue<ViewerHandle>,
    table: RwSignal<VoiceTable>,
    exported: RwSignal<Vec<String>>,
    busy: RwSignal<bool>,
    toasts: Toasts,
}

impl ScanState {
    fn meta(&self) -> ExportMeta {
        self.viewer.with_untracked(|v| ExportMeta::from_labels(&v.label_texts()))
    }

    /// Switches the viewer to another document.
    fn open(&self, api: &ApiClient, task_id: String, pages: Option<Vec<String>>) {
        let mut model = InternalModel::new();
        model.set_task(Some(task_id.clone()));
        self.viewer.set(Viewer::new(Box::new(model)));
        self.table.set(VoiceTable::default());
        self.exported.set(Vec::new());

        let state = *self;
        if let Some(pages) = pages {
            state.viewer.update(|v| v.load_pages(pages));
            return;
        }
        let api = api.clone();
        spawn_local(async move {
            match api.pages(&task_id).await {
                Ok(response) => {
                    // 別の文書に切り替わった後の応答は捨てる
                    state.viewer.try_update(|v| {
                        if v.shows_task(&task_id) {
                            v.load_pages(response.pages);
                        }
                    });
                }
                Err(e) => state.toasts.error(format!("ページの取得に失敗しました: {e}")),
            }
        });
    }

    /// Runs an export request with the busy flag set.
    fn run<F, Fut>(&self, task: F)
    where
        F: FnOnce() -> Fut + 'static,
        Fut: std::future::Future<Output = Result<String>> + 'static,
    {
        let state = *self;
        state.busy.set(true);
        spawn_local(async move {
            let result = task().await;
            state.busy.try_set(false);
            match result {
                Ok(message) => state.toasts.success(message),
                Err(e) => state.toasts.error(e.to_string()),
            }
        });
    }
}

#[component]
pub fn VoiceScanPage() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let api = ctx.api.clone();
    let (handle, commands) = command::channel();
    let state = ScanState {
        viewer: RwSignal::new(Viewer::new(Box::new(InternalModel::new()))),
        handle: StoredValue::new(handle),
        table: RwSignal::new(VoiceTable::default()),
        exported: RwSignal::new(Vec::new()),
        busy: RwSignal::new(false),
        toasts: ctx.toasts,
    };
    let documents = RwSignal::new(Vec::<TaskSummary>::new());

    {
        let api = api.clone();
        spawn_local(async move {
            match api.list_tasks().await {
                Ok(list) => {
                    let done = list.into_iter().filter(|t| t.status == TaskStatus::Done).collect();
                    documents.try_set(done);
                }
                Err(e) => leptos::logging::warn!("タスク一覧の取得に失敗: {}", e),
            }
        });
    }

    let on_uploaded = {
        let api = api.clone();
        move |task_id: String, pages: Vec<String>| state.open(&api, task_id, Some(pages))
    };

    let on_pick = {
        let api = api.clone();
        move |ev: web_sys::Event| {
            let task_id = event_target_value(&ev);
            if !task_id.is_empty() {
                state.open(&api, task_id, None);
            }
        }
    };

    let on_detect = {
        let api = api.clone();
        move |_| {
            let (request, task_id) = state.viewer.with_untracked(|v| {
                (
                    voices::detect_request(v.model().store()),
                    v.model().task_id().map(str::to_string),
                )
            });
            let request = match request {
                Ok(request) => request,
                Err(e) => {
                    state.toasts.error(e.to_string());
                    return;
                }
            };
            let api = api.clone();
            state.run(move || async move {
                let response = api.detect_voices(&request).await?;
                let current = state
                    .viewer
                    .try_with_untracked(|v| task_id.as_deref().map_or(true, |id| v.shows_task(id)))
                    .unwrap_or(false);
                if !current {
                    return Err(score_scan_common::Error::UserInput(
                        "文書が切り替わったため検出結果を破棄しました".into(),
                    ));
                }
                let count = response.voices.len();
                state.table.try_set(VoiceTable::new(response.voices));
                Ok(format!("{count} パートを検出しました"))
            });
        }
    };

    let on_export_all = {
        let api = api.clone();
        move |_| {
            let request = match state.table.with_untracked(|t| t.split_all(&state.meta())) {
                Ok(request) => request,
                Err(e) => return state.toasts.error(e.to_string()),
            };
            let api = api.clone();
            state.run(move || async move {
                let response = api.split(&request).await?;
                if !response.is_success() {
                    return Err(score_scan_common::Error::Export(format!(
                        "PDF分割に失敗しました ({})",
                        response.status
                    )));
                }
                let urls: Vec<String> = response
                    .pdf_files
                    .iter()
                    .map(|f| voice_pdf_url(api.server_url(), f))
                    .collect();
                let count = urls.len();
                state.exported.try_set(urls);
                Ok(format!("{count} 件のPDFを作成しました"))
            });
        }
    };

    let on_export_one = {
        let api = api.clone();
        move |index: usize| {
            let request = match state.table.with_untracked(|t| t.split_one(index, &state.meta())) {
                Ok(request) => request,
                Err(e) => return state.toasts.error(e.to_string()),
            };
            let api = api.clone();
            state.run(move || async move {
                let response = api.split(&request).await?;
                if !response.is_success() {
                    return Err(score_scan_common::Error::Export(format!(
                        "PDF分割に失敗しました ({})",
                        response.status
                    )));
                }
                for file in &response.pdf_files {
                    download::open_url(&voice_pdf_url(api.server_url(), file))?;
                }
                Ok("PDFを作成しました".to_string())
            });
        }
    };

    let on_zip = {
        let api = api.clone();
        move |_| {
            let request = match state.table.with_untracked(|t| t.split_all(&state.meta())) {
                Ok(request) => request,
                Err(e) => return state.toasts.error(e.to_string()),
            };
            let api = api.clone();
            state.run(move || async move {
                let response = api.split_zip(&request).await?;
                let zip_url = response
                    .zip_url
                    .ok_or_else(|| score_scan_common::Error::Export("ZIPのURLがありません".into()))?;
                download::open_url(&zip_download_url(api.server_url(), &zip_url))?;
                Ok("ZIPを作成しました".to_string())
            });
        }
    };

    let export_table = move |format: ExportFormat| {
        let result = state
            .table
            .with_untracked(|t| download::export_rows(t.rows(), format, "stimmen", "Stimmen"));
        if let Err(e) = result {
            state.toasts.error(e.to_string());
        }
    };

    let has_voices = move || state.table.with(|t| !t.is_empty());
    let busy = state.busy;

    view! {
        <div class="voice-scan-page">
            <h2>"パート検出"</h2>
            <div class="document-picker">
                <select on:change=on_pick>
                    <option value="">"ドキュメントを選択..."</option>
                    {move || {
                        documents
                            .get()
                            .into_iter()
                            .map(|t| view! { <option value=t.id>{t.filename}</option> })
                            .collect_view()
                    }}
                </select>
                <UploadArea on_done=on_uploaded />
            </div>

            <div class="scan-actions">
                <button
                    on:click=move |_| {
                        state.handle.with_value(|h| h.recognize_text());
                    }
                >
                    "テキスト認識"
                </button>
                <button class="primary" disabled=move || busy.get() on:click=on_detect>
                    "パート検出"
                </button>
                <button disabled=move || busy.get() || !has_voices() on:click=on_export_all>
                    "全パートをPDF出力"
                </button>
                <button disabled=move || busy.get() || !has_voices() on:click=on_zip>
                    "ZIPでダウンロード"
                </button>
                <button disabled=move || !has_voices() on:click=move |_| export_table(ExportFormat::Csv)>
                    "CSV"
                </button>
                <button disabled=move || !has_voices() on:click=move |_| export_table(ExportFormat::Json)>
                    "JSON"
                </button>
            </div>

            <div class="detail-layout">
                <PdfViewer viewer=state.viewer commands=commands trigger_ocr=true />
                <div class="side-panel">
                    <LabelPanel viewer=state.viewer />
                    <Show when=has_voices>
                        <VoicesTable
                            table=state.table
                            busy=busy
                            on_select=move |page| {
                                state.handle.with_value(|h| h.set_page(page));
                            }
                            on_export=on_export_one.clone()
                        />
                    </Show>
                    <Show when=move || state.exported.with(|e| !e.is_empty())>
                        <ul class="exported-files">
                            {move || {
                                state
                                    .exported
                                    .get()
                                    .into_iter()
                                    .map(|url| {
                                        let name = url
                                            .rsplit('/')
                                            .next()
                                            .and_then(decode_segment)
                                            .unwrap_or_else(|| url.clone());
                                        view! {
                                            <li>
                                                <a href=url target="_blank">{name}</a>
                                            </li>
                                        }
                                    })
                                    .collect_view()
                            }}
                        </ul>
                    </Show>
                </div>
            </div>
        </div>
    }
}

fn decode_segment(segment: &str) -> Option<String> {
    js_sys::decode_uri_component(segment).ok().and_then(|s| s.as_string())
}
