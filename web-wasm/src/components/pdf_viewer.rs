//! PDFページビューアー
//!
//! Page image with OCR boxes on top. Boxes can be selected (click), moved
//! (drag), resized (eight grips) and labelled or removed from the context
//! menu. All state lives in the shared [`Viewer`]; whether edits are
//! persisted is decided by the model the host built it with.
//!
//! The host drives the viewer through [`ViewerCommands`] (recognize text,
//! jump to page).

use futures::StreamExt;
use gloo::timers::callback::Timeout;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlImageElement, MouseEvent, PointerEvent};

use score_scan_common::command::{ViewerCommand, ViewerCommands};
use score_scan_common::deskew::{cache_bust, task_id_from_page_url, DeskewDialog};
use score_scan_common::navigation::{MAX_ZOOM, MIN_ZOOM};
use score_scan_common::viewer::{BoxOverlay, GestureKind, MenuAction, ResizeHandle, MENU_CLOSE_DELAY_MS};
use score_scan_common::{EditOutcome, LoadOutcome, OcrLoad, Size, Viewer};

use crate::api::{self, ApiClient};
use crate::app::AppContext;
use crate::components::context_menu::BoxContextMenu;
use crate::components::deskew_dialog::DeskewDialogView;
use crate::components::toast::Toasts;

/// Signals shared by the async helpers below.
#[derive(Clone, Copy)]
struct ViewerSignals {
    viewer: RwSignal<Viewer>,
    no_ocr: RwSignal<bool>,
    busy: RwSignal<bool>,
    toasts: Toasts,
}

fn task_of(v: &Viewer) -> Option<String> {
    v.model()
        .task_id()
        .map(str::to_string)
        .or_else(|| {
            v.state
                .current_page_url()
                .and_then(task_id_from_page_url)
                .map(str::to_string)
        })
}

/// Loads the OCR state of `page`. With `trigger` the backend runs OCR if
/// needed and the result goes through suggestion resolution.
async fn fetch_ocr(api: ApiClient, s: ViewerSignals, page: usize, trigger: bool) {
    let Some(task_id) = s.viewer.try_with_untracked(task_of).flatten() else {
        return;
    };
    if trigger {
        s.busy.try_set(true);
    }
    let result = api.load_ocr(&task_id, page, trigger).await;
    if trigger {
        s.busy.try_set(false);
    }

    match result {
        Ok(OcrLoad::Loaded(response)) if trigger => {
            let saved = s
                .viewer
                .try_update(|v| {
                    if v.current_page() == page {
                        v.model_mut().apply_ocr_result(response)
                    } else {
                        None
                    }
                })
                .flatten();
            s.no_ocr.try_set(false);
            api::persist(&api, saved);
        }
        Ok(OcrLoad::NotRunYet) if trigger => {
            s.toasts.error("テキスト認識の結果がありません");
        }
        Ok(load) => match s.viewer.try_update(|v| v.model_mut().apply_load(page, load)) {
            Some(LoadOutcome::Loaded) => {
                s.no_ocr.try_set(false);
            }
            Some(LoadOutcome::NoOcrYet) => {
                s.no_ocr.try_set(true);
            }
            Some(LoadOutcome::Stale) | None => {}
        },
        Err(e) => {
            leptos::logging::warn!("OCR読込失敗 (task {}, page {}): {}", task_id, page + 1, e);
            s.toasts.error(format!("テキスト認識に失敗しました: {e}"));
        }
    }
}

/// Persists a finished gesture and re-OCRs the moved box.
fn commit(api: &ApiClient, viewer: RwSignal<Viewer>, outcome: EditOutcome) {
    api::persist(api, outcome.save);
    let Some((id, request)) = outcome.reocr else {
        return;
    };
    let api = api.clone();
    spawn_local(async move {
        match api.extract_text(&request).await {
            Ok(response) => {
                let saved = viewer
                    .try_update(|v| v.model_mut().apply_extracted_text(id, response))
                    .flatten();
                api::persist(&api, saved);
            }
            Err(e) => leptos::logging::warn!("再OCR失敗: {}", e),
        }
    });
}

fn begin_gesture(viewer: RwSignal<Viewer>, ev: &PointerEvent, index: usize, kind: GestureKind) {
    if ev.button() != 0 {
        return;
    }
    ev.stop_propagation();
    ev.prevent_default();
    let pointer = (f64::from(ev.client_x()), f64::from(ev.client_y()));
    viewer.update(|v| v.pointer_down(index, kind, pointer));
}

fn box_style(o: &BoxOverlay) -> String {
    format!(
        "left: {}px; top: {}px; width: {}px; height: {}px; border-color: {};",
        o.rect.x, o.rect.y, o.rect.width, o.rect.height, o.color
    )
}

#[component]
fn BoxView(viewer: RwSignal<Viewer>, overlays: Memo<Vec<BoxOverlay>>, index: usize) -> impl IntoView {
    let overlay = move || overlays.with(|all| all.get(index).cloned());
    let selected = move || overlay().is_some_and(|o| o.selected);

    let on_context_menu = move |ev: MouseEvent| {
        ev.prevent_default();
        ev.stop_propagation();
        let (x, y) = (f64::from(ev.client_x()), f64::from(ev.client_y()));
        viewer.update(|v| v.open_menu(x, y, index));
    };

    view! {
        <div
            class=move || if selected() { "ocr-box selected" } else { "ocr-box" }
            style=move || overlay().map(|o| box_style(&o)).unwrap_or_default()
            title=move || overlay().map(|o| o.text).unwrap_or_default()
            on:pointerdown=move |ev: PointerEvent| begin_gesture(viewer, &ev, index, GestureKind::Drag)
            on:contextmenu=on_context_menu
        >
            {move || {
                overlay()
                    .and_then(|o| o.label.map(|l| (l, o.color)))
                    .map(|(label, color)| {
                        view! {
                            <span class="box-label" style=format!("background: {color}")>
                                {label.display_name()}
                            </span>
                        }
                    })
            }}
            <Show when=selected>
                {ResizeHandle::ALL
                    .into_iter()
                    .map(|handle| {
                        let (fx, fy) = handle.anchor();
                        let style = format!(
                            "left: {}%; top: {}%; cursor: {};",
                            fx * 100.0,
                            fy * 100.0,
                            handle.cursor()
                        );
                        view! {
                            <div
                                class="resize-handle"
                                style=style
                                on:pointerdown=move |ev: PointerEvent| {
                                    begin_gesture(viewer, &ev, index, GestureKind::Resize(handle))
                                }
                            />
                        }
                    })
                    .collect_view()}
            </Show>
        </div>
    }
}

/// PDFビューアー
#[component]
pub fn PdfViewer(
    viewer: RwSignal<Viewer>,
    commands: ViewerCommands,
    /// 表示時にOCRを実行する（パート検出ページ）
    #[prop(optional)]
    trigger_ocr: bool,
) -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let api = ctx.api.clone();
    let s = ViewerSignals {
        viewer,
        no_ocr: RwSignal::new(false),
        busy: RwSignal::new(false),
        toasts: ctx.toasts,
    };
    let dialog = RwSignal::new(DeskewDialog::default());
    let container = NodeRef::<leptos::html::Div>::new();

    // ページが変わったらOCR状態を読み込む
    let page_key = Memo::new(move |_| {
        viewer.with(|v| (v.current_page(), v.state.current_page_url().map(str::to_string)))
    });
    Effect::new({
        let api = api.clone();
        move |_| {
            let (page, url) = page_key.get();
            if url.is_none() {
                return;
            }
            s.no_ocr.set(false);
            spawn_local(fetch_ocr(api.clone(), s, page, trigger_ocr));
        }
    });

    // ホストからのコマンド
    {
        let api = api.clone();
        let mut commands = commands;
        spawn_local(async move {
            while let Some(command) = commands.next().await {
                let Some(page) = viewer.try_with_untracked(|v| v.current_page()) else {
                    break;
                };
                match command {
                    ViewerCommand::RecognizeText => fetch_ocr(api.clone(), s, page, true).await,
                    ViewerCommand::SetPage(target) => {
                        viewer.try_update(|v| v.go_to(target));
                    }
                }
            }
        });
    }

    // ジェスチャーはウィンドウ全体で追跡する
    let moved = window_event_listener(leptos::ev::pointermove, move |ev| {
        if viewer.try_with_untracked(|v| v.interaction.is_idle()).unwrap_or(true) {
            return;
        }
        let pointer = (f64::from(ev.client_x()), f64::from(ev.client_y()));
        viewer.update(|v| {
            v.pointer_move(pointer);
        });
    });
    let released = window_event_listener(leptos::ev::pointerup, {
        let api = api.clone();
        move |_| {
            if viewer.try_with_untracked(|v| v.interaction.is_idle()).unwrap_or(true) {
                return;
            }
            if let Some(outcome) = viewer.try_update(|v| v.pointer_up()) {
                commit(&api, viewer, outcome);
            }
        }
    });
    let cancelled = window_event_listener(leptos::ev::pointercancel, move |_| {
        viewer.try_update(|v| v.interaction.cancel());
    });
    // メニュー外クリックで閉じる
    let outside = window_event_listener(leptos::ev::pointerdown, move |_| {
        let Some(menu) = viewer.try_with_untracked(|v| v.menu) else {
            return;
        };
        if !menu.visible {
            return;
        }
        Timeout::new(MENU_CLOSE_DELAY_MS, move || {
            viewer.try_update(|v| {
                if v.menu == menu {
                    v.menu.close();
                }
            });
        })
        .forget();
    });
    on_cleanup(move || {
        moved.remove();
        released.remove();
        cancelled.remove();
        outside.remove();
    });

    let overlays = Memo::new(move |_| viewer.with(|v| v.overlays()));
    let menu = Memo::new(move |_| viewer.with(|v| v.menu));
    let src = Memo::new(move |_| {
        viewer.with(|v| {
            v.state.current_page_url().map(|url| match v.state.zoom.reload_key() {
                0 => url.to_string(),
                key => cache_bust(url, key),
            })
        })
    });

    let on_image_load = move |ev: web_sys::Event| {
        let Some(img) = ev.target().and_then(|t| t.dyn_into::<HtmlImageElement>().ok()) else {
            return;
        };
        let container_width = container
            .get_untracked()
            .map(|c| f64::from(c.client_width()))
            .unwrap_or_default();
        let natural = Size::new(f64::from(img.natural_width()), f64::from(img.natural_height()));
        viewer.update(|v| v.image_loaded(natural, container_width));
    };

    let image_style = move || {
        let size = viewer.with(|v| v.rendered_size());
        let mut style = if size.is_known() {
            format!("width: {}px; height: {}px;", size.width, size.height)
        } else {
            "max-width: 100%;".to_string()
        };
        if let Some(transform) = dialog.with(|d| d.preview_transform()) {
            style.push_str(&format!(" transform: {transform};"));
        }
        style
    };
    let layer_style = move || {
        let size = viewer.with(|v| v.rendered_size());
        format!("width: {}px; height: {}px;", size.width, size.height)
    };

    let on_choose = {
        let api = api.clone();
        move |action: MenuAction| {
            let saved = viewer.try_update(|v| v.choose(action)).flatten();
            api::persist(&api, saved);
        }
    };

    let on_deskew_save = {
        let api = api.clone();
        move || {
            let target = viewer.with_untracked(|v| {
                v.state
                    .current_page_url()
                    .map(|url| (url.to_string(), v.current_page()))
            });
            let Some((url, page)) = target else {
                return;
            };
            let request = match dialog.try_update(|d| d.save_request(&url, page)) {
                Some(Ok(request)) => request,
                Some(Err(e)) => {
                    s.toasts.error(e.to_string());
                    return;
                }
                None => return,
            };
            let api = api.clone();
            spawn_local(async move {
                let result = api.deskew(&request).await;
                dialog.try_update(|d| d.finish_save(result.is_ok()));
                match result {
                    Ok(()) => {
                        viewer.try_update(|v| v.state.zoom.bump_reload());
                        s.toasts.success("傾きを補正しました");
                    }
                    Err(e) => s.toasts.error(format!("傾き補正に失敗しました: {e}")),
                }
            });
        }
    };

    let on_recognize = {
        let api = api.clone();
        move |_| {
            let page = viewer.with_untracked(|v| v.current_page());
            spawn_local(fetch_ocr(api.clone(), s, page, true));
        }
    };

    view! {
        <div class="pdf-viewer">
            <div class="viewer-toolbar">
                <button
                    disabled=move || !viewer.with(|v| v.state.nav.has_prev())
                    on:click=move |_| {
                        viewer.update(|v| {
                            v.prev_page();
                        });
                    }
                >
                    "‹"
                </button>
                <input
                    type="text"
                    class="page-input"
                    prop:value=move || viewer.with(|v| v.state.nav.input_text())
                    on:change=move |ev| {
                        let text = event_target_value(&ev);
                        viewer.update(|v| {
                            let page = v.state.nav.parse_input(&text);
                            v.go_to(page);
                        });
                    }
                />
                <span class="page-count">{move || format!("/ {}", viewer.with(|v| v.state.nav.count()))}</span>
                <button
                    disabled=move || !viewer.with(|v| v.state.nav.has_next())
                    on:click=move |_| {
                        viewer.update(|v| {
                            v.next_page();
                        });
                    }
                >
                    "›"
                </button>

                <input
                    type="range"
                    class="zoom-slider"
                    min={MIN_ZOOM * 100.0}
                    max={MAX_ZOOM * 100.0}
                    step=5
                    prop:value=move || viewer.with(|v| v.state.zoom.percent().to_string())
                    on:input=move |ev| {
                        if let Ok(percent) = event_target_value(&ev).parse::<f64>() {
                            viewer.update(|v| v.state.zoom.set_manual(percent / 100.0));
                        }
                    }
                />
                <span class="zoom-percent">{move || format!("{}%", viewer.with(|v| v.state.zoom.percent()))}</span>
                <button on:click=move |_| viewer.update(|v| v.state.zoom.reset())>"ズームリセット"</button>
                <button on:click=move |_| dialog.update(|d| d.open())>"傾き補正"</button>
            </div>

            <Show when=move || s.no_ocr.get()>
                <div class="viewer-notice">
                    <span>"このページはまだテキスト認識されていません"</span>
                    <button disabled=move || s.busy.get() on:click=on_recognize.clone()>
                        {move || if s.busy.get() { "認識中..." } else { "テキスト認識" }}
                    </button>
                </div>
            </Show>

            <div class="page-container" node_ref=container>
                <Show
                    when=move || src.with(Option::is_some)
                    fallback=|| view! { <p class="text-muted">"ページがありません"</p> }
                >
                    <div class="page-stage">
                        <img
                            class="page-image"
                            src=move || src.get().unwrap_or_default()
                            style=image_style
                            draggable="false"
                            on:load=on_image_load
                        />
                        <div class="box-layer" style=layer_style>
                            <For
                                each=move || overlays.with(|all| all.iter().map(|o| o.index).collect::<Vec<_>>())
                                key=|index| *index
                                children=move |index| view! { <BoxView viewer=viewer overlays=overlays index=index /> }
                            />
                        </div>
                    </div>
                </Show>
            </div>

            <BoxContextMenu menu=menu on_choose=on_choose />
            <DeskewDialogView dialog=dialog on_save=on_deskew_save />
        </div>
    }
}
