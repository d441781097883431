//! 404

use leptos::prelude::*;
use score_scan_common::routes::Route;

use crate::app::AppContext;

#[component]
pub fn NotFoundPage() -> impl IntoView {
    let navigate = expect_context::<AppContext>().navigate;
    view! {
        <div class="not-found">
            <h2>"ページが見つかりません"</h2>
            <button on:click=move |_| navigate.run(Route::Documents)>"ドキュメント一覧へ"</button>
        </div>
    }
}
