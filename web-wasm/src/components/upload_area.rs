//! アップロードエリアコンポーネント
//!
//! Takes one PDF (drop or file dialog), uploads it and polls the task until
//! the backend has rendered its pages.

use gloo::timers::future::TimeoutFuture;
use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{DragEvent, File, FileList, HtmlInputElement};

use score_scan_common::poller::{Generation, POLL_INTERVAL_MS};
use score_scan_common::{PollState, PollStep, TaskPoller};

use crate::api::ApiClient;
use crate::app::AppContext;

fn is_pdf(file: &File) -> bool {
    file.type_() == "application/pdf" || file.name().to_lowercase().ends_with(".pdf")
}

fn first_pdf(files: &FileList) -> Option<File> {
    (0..files.length()).filter_map(|i| files.get(i)).find(is_pdf)
}

/// Polls until the task is done or failed. Stops quietly once the poller
/// signal is gone or a newer upload took over.
async fn poll(api: ApiClient, poller: RwSignal<TaskPoller>, generation: Generation) {
    loop {
        TimeoutFuture::new(POLL_INTERVAL_MS).await;
        let task_id = poller
            .try_with_untracked(|p| match p.state() {
                PollState::Processing(task) if p.is_current(generation) => Some(task.task_id.clone()),
                _ => None,
            })
            .flatten();
        let Some(task_id) = task_id else {
            return;
        };

        let status = api.status(&task_id).await;
        match poller.try_update(|p| p.on_status(generation, status)) {
            Some(PollStep::Wait) => continue,
            Some(PollStep::FetchPages(task_id)) => {
                let pages = api.pages(&task_id).await;
                poller.try_update(|p| p.on_pages(generation, pages));
                return;
            }
            Some(PollStep::Stop) | Some(PollStep::Ignored) | None => return,
        }
    }
}

fn status_text(state: &PollState) -> String {
    match state {
        PollState::Idle => String::new(),
        PollState::Processing(task) => match task.num_pages {
            Some(n) => format!("処理中... ({} ページ)", n),
            None => "処理中...".to_string(),
        },
        PollState::Done { pages, .. } => format!("✔ 完了 ({} ページ)", pages.len()),
        PollState::Error { message, .. } => format!("✘ エラー: {}", message),
    }
}

#[component]
pub fn UploadArea<F>(
    /// 処理完了時に task_id とページURLを受け取る
    on_done: F,
) -> impl IntoView
where
    F: Fn(String, Vec<String>) + 'static + Clone + Send + Sync,
{
    let ctx = expect_context::<AppContext>();
    let poller = RwSignal::new(TaskPoller::new());
    let (is_dragover, set_is_dragover) = signal(false);
    let input_ref = NodeRef::<leptos::html::Input>::new();

    on_cleanup(move || {
        poller.try_update(|p| p.cancel());
    });

    // 完了通知は一度だけ
    Effect::new({
        let on_done = on_done.clone();
        move |notified: Option<Option<String>>| {
            let finished = poller.with(|p| match p.state() {
                PollState::Done { task, pages } => Some((task.task_id.clone(), pages.clone())),
                _ => None,
            });
            match finished {
                Some((task_id, pages)) => {
                    if notified.flatten().as_deref() != Some(task_id.as_str()) {
                        on_done(task_id.clone(), pages);
                    }
                    Some(task_id)
                }
                None => None,
            }
        }
    });

    let start_upload = {
        let api = ctx.api.clone();
        let toasts = ctx.toasts;
        move |file: File| {
            let api = api.clone();
            spawn_local(async move {
                match api.upload(&file).await {
                    Ok(response) => match response.task_id {
                        Some(task_id) => {
                            let Some(generation) = poller.try_update(|p| p.start(task_id)) else {
                                return;
                            };
                            poll(api, poller, generation).await;
                        }
                        None => {
                            poller.try_update(|p| p.fail_upload("no task id in upload response"));
                        }
                    },
                    Err(e) => {
                        toasts.error(format!("アップロードに失敗しました: {e}"));
                        poller.try_update(|p| p.fail_upload(e.to_string()));
                    }
                }
            });
        }
    };

    let handle_files = {
        let start_upload = start_upload.clone();
        let toasts = ctx.toasts;
        move |files: FileList| match first_pdf(&files) {
            Some(file) => start_upload(file),
            None => toasts.error("PDFファイルを選択してください"),
        }
    };

    let on_drop = {
        let handle_files = handle_files.clone();
        move |ev: DragEvent| {
            ev.prevent_default();
            set_is_dragover.set(false);
            if let Some(files) = ev.data_transfer().and_then(|dt| dt.files()) {
                handle_files(files);
            }
        }
    };

    let on_input_change = {
        let handle_files = handle_files.clone();
        move |ev: web_sys::Event| {
            let input = ev
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok());
            if let Some(input) = input {
                if let Some(files) = input.files() {
                    handle_files(files);
                }
                // 同じファイルを再選択できるように
                input.set_value("");
            }
        }
    };

    let busy = move || poller.with(|p| p.state().is_processing());

    view! {
        <div
            class=move || {
                let mut classes = vec!["upload-area"];
                if is_dragover.get() {
                    classes.push("dragover");
                }
                if busy() {
                    classes.push("disabled");
                }
                classes.join(" ")
            }
            on:drop=on_drop
            on:dragover=move |ev: DragEvent| {
                ev.prevent_default();
                set_is_dragover.set(true);
            }
            on:dragleave=move |_: DragEvent| set_is_dragover.set(false)
            on:click=move |_| {
                if busy() {
                    return;
                }
                if let Some(input) = input_ref.get_untracked() {
                    input.click();
                }
            }
        >
            <input
                type="file"
                accept="application/pdf,.pdf"
                style="display: none"
                node_ref=input_ref
                on:change=on_input_change
            />
            <div class="upload-icon">"📄"</div>
            <p>"PDFをドラッグ&ドロップ または クリックして選択"</p>
            <p class="upload-status">{move || poller.with(|p| status_text(p.state()))}</p>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use score_scan_common::AsyncTask;

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(&PollState::Idle), "");

        let mut task = AsyncTask::new("7");
        assert_eq!(status_text(&PollState::Processing(task.clone())), "処理中...");
        task.num_pages = Some(12);
        assert_eq!(status_text(&PollState::Processing(task.clone())), "処理中... (12 ページ)");

        let done = PollState::Done { task, pages: vec!["a.png".into(), "b.png".into()] };
        assert_eq!(status_text(&done), "✔ 完了 (2 ページ)");

        let failed = PollState::Error { task_id: None, message: "HTTP 500".into() };
        assert_eq!(status_text(&failed), "✘ エラー: HTTP 500");
    }
}
