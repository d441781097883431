//! メインアプリケーションコンポーネント
//!
//! Shell (sidebar + content), client-side routing over the History API and
//! the app-wide context: API client, navigation and toasts.

use leptos::prelude::*;
use score_scan_common::prefs::{self, SIDEBAR_COLLAPSED};
use score_scan_common::routes::Route;
use wasm_bindgen::JsValue;

use crate::api::ApiClient;
use crate::components::{
    sidebar::Sidebar,
    toast::{ToastHost, Toasts},
};
use crate::pages::{
    document_detail::DocumentDetailPage, documents::DocumentsPage, not_found::NotFoundPage,
    placeholder::PlaceholderPage, voice_scan::VoiceScanPage,
};
use crate::storage::{self, LocalStore};

/// アプリ全体で共有する状態
#[derive(Clone)]
pub struct AppContext {
    pub api: ApiClient,
    pub navigate: Callback<Route>,
    pub toasts: Toasts,
}

fn current_route() -> Route {
    let path = web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_default();
    Route::parse(&path)
}

fn push_history(route: &Route) {
    let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
        return;
    };
    if history
        .push_state_with_url(&JsValue::NULL, "", Some(&route.path()))
        .is_err()
    {
        leptos::logging::warn!("history.pushState に失敗: {}", route);
    }
}

/// メインアプリケーションコンポーネント
#[component]
pub fn App() -> impl IntoView {
    let route = RwSignal::new(current_route());
    let toasts = Toasts::new();

    let navigate = Callback::new(move |next: Route| {
        if route.get_untracked() != next {
            push_history(&next);
            route.set(next);
        }
    });

    // ブラウザの戻る/進む
    let _ = window_event_listener(leptos::ev::popstate, move |_| {
        route.set(current_route());
    });

    provide_context(AppContext {
        api: ApiClient::from_window(),
        navigate,
        toasts,
    });

    let collapsed = RwSignal::new(prefs::initial_sidebar_collapsed(
        &LocalStore,
        storage::viewport_width(),
        false,
    ));
    let on_toggle = move || {
        collapsed.update(|c| *c = !*c);
        SIDEBAR_COLLAPSED.set(&LocalStore, &collapsed.get_untracked());
    };

    view! {
        <div class=move || if collapsed.get() { "app-shell collapsed" } else { "app-shell" }>
            <Sidebar
                collapsed=collapsed
                route=route
                on_toggle=on_toggle
            />
            <main class="content">
                {move || match route.get() {
                    Route::Documents => view! { <DocumentsPage /> }.into_any(),
                    Route::DocumentDetail(id) => view! { <DocumentDetailPage task_id=id /> }.into_any(),
                    Route::VoiceScan => view! { <VoiceScanPage /> }.into_any(),
                    Route::Users(id) => view! { <PlaceholderPage title="ユーザー" id=id /> }.into_any(),
                    Route::Organisations(id) => {
                        view! { <PlaceholderPage title="組織" id=id /> }.into_any()
                    }
                    Route::NotFound => view! { <NotFoundPage /> }.into_any(),
                }}
            </main>
            <ToastHost toasts=toasts />
        </div>
    }
}
