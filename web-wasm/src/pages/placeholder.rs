//! ユーザー・組織（共有ライブラリ側の画面）

use leptos::prelude::*;

#[component]
pub fn PlaceholderPage(title: &'static str, id: Option<String>) -> impl IntoView {
    view! {
        <div class="placeholder-page">
            <h2>{title}</h2>
            {id.map(|id| view! { <p class="text-muted">{format!("ID: {id}")}</p> })}
            <p class="text-muted">"この画面は管理コンソールで提供されます"</p>
        </div>
    }
}
