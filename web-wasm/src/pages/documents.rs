//! ドキュメント一覧・アップロード
//!
//! The task list is refreshed every few seconds while this page is shown; a
//! task that finishes meanwhile raises a toast.

use gloo::timers::future::TimeoutFuture;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use score_scan_common::export::ExportFormat;
use score_scan_common::poller::TASK_LIST_INTERVAL_MS;
use score_scan_common::routes::Route;
use score_scan_common::{TaskListWatcher, TaskStatus, TaskSummary};

use crate::app::AppContext;
use crate::components::upload_area::UploadArea;
use crate::download;

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "待機中",
        TaskStatus::Processing => "処理中",
        TaskStatus::Done => "完了",
        TaskStatus::Error => "エラー",
    }
}

#[component]
pub fn DocumentsPage() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let tasks = RwSignal::new(Vec::<TaskSummary>::new());
    let loading = RwSignal::new(true);

    {
        let api = ctx.api.clone();
        let toasts = ctx.toasts;
        spawn_local(async move {
            let mut watcher = TaskListWatcher::new();
            // ページが破棄されたら終了
            while tasks.try_with_untracked(|_| ()).is_some() {
                match api.list_tasks().await {
                    Ok(list) => {
                        let snapshot = list.clone();
                        let (finished, changed) = watcher.observe(list);
                        if changed {
                            tasks.try_set(snapshot);
                        }
                        for task in finished {
                            toasts.success(format!("{} の処理が完了しました", task.filename));
                        }
                    }
                    Err(e) => leptos::logging::warn!("タスク一覧の取得に失敗: {}", e),
                }
                loading.try_set(false);
                TimeoutFuture::new(TASK_LIST_INTERVAL_MS).await;
            }
        });
    }

    let navigate = ctx.navigate;
    let on_done = move |task_id: String, _pages: Vec<String>| {
        navigate.run(Route::DocumentDetail(task_id));
    };

    let export = {
        let toasts = ctx.toasts;
        move |format: ExportFormat| {
            let result = tasks.with_untracked(|t| {
                download::export_rows(t, format, "dokumente", "Dokumente")
            });
            if let Err(e) = result {
                toasts.error(e.to_string());
            }
        }
    };

    view! {
        <div class="documents-page">
            <h2>"ドキュメント"</h2>
            <UploadArea on_done=on_done />

            <div class="table-actions">
                <button
                    disabled=move || tasks.with(Vec::is_empty)
                    on:click={
                        let export = export.clone();
                        move |_| export(ExportFormat::Csv)
                    }
                >
                    "CSV出力"
                </button>
                <button
                    disabled=move || tasks.with(Vec::is_empty)
                    on:click=move |_| export(ExportFormat::Json)
                >
                    "JSON出力"
                </button>
            </div>

            <Show
                when=move || !loading.get()
                fallback=|| view! { <p class="text-muted">"読み込み中..."</p> }
            >
                <Show
                    when=move || !tasks.with(Vec::is_empty)
                    fallback=|| view! { <p class="text-muted">"ドキュメントはまだありません"</p> }
                >
                    <table class="documents-table">
                        <thead>
                            <tr>
                                <th>"ファイル名"</th>
                                <th>"状態"</th>
                                <th>"ページ"</th>
                                <th>"作成日時"</th>
                            </tr>
                        </thead>
                        <tbody>
                            <For
                                each=move || tasks.get()
                                key=|t| (t.id.clone(), t.status)
                                children=move |task| {
                                    let done = task.status == TaskStatus::Done;
                                    let id = task.id.clone();
                                    view! {
                                        <tr
                                            class=if done { "task-row clickable" } else { "task-row" }
                                            title=task.error_message.clone().unwrap_or_default()
                                            on:click=move |_| {
                                                if done {
                                                    navigate.run(Route::DocumentDetail(id.clone()));
                                                }
                                            }
                                        >
                                            <td>{task.filename}</td>
                                            <td class=format!("status {}", task.status)>{status_label(task.status)}</td>
                                            <td>{task.num_pages.map(|n| n.to_string()).unwrap_or_default()}</td>
                                            <td>{task.created_at.unwrap_or_default()}</td>
                                        </tr>
                                    }
                                }
                            />
                        </tbody>
                    </table>
                </Show>
            </Show>
        </div>
    }
}
