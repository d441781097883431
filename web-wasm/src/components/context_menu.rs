//! ボックスのコンテキストメニュー

use leptos::prelude::*;
use score_scan_common::viewer::{ContextMenu, MenuAction};
use score_scan_common::LabelKey;

#[component]
pub fn BoxContextMenu<F>(#[prop(into)] menu: Signal<ContextMenu>, on_choose: F) -> impl IntoView
where
    F: Fn(MenuAction) + 'static + Clone + Send + Sync,
{
    let items = move || {
        let on_choose = on_choose.clone();
        let mut actions: Vec<(String, MenuAction)> = LabelKey::ALL
            .into_iter()
            .map(|key| (format!("{} に設定", key.display_name()), MenuAction::Assign(key)))
            .collect();
        actions.push(("ボックスを削除".to_string(), MenuAction::Remove));
        actions
            .into_iter()
            .map(|(text, action)| {
                let on_choose = on_choose.clone();
                let class = match action {
                    MenuAction::Remove => "menu-item danger",
                    MenuAction::Assign(_) => "menu-item",
                };
                view! {
                    <li class=class on:click=move |_| on_choose(action)>{text}</li>
                }
            })
            .collect_view()
    };

    view! {
        <Show when=move || menu.with(|m| m.visible)>
            <ul
                class="context-menu"
                style=move || menu.with(|m| format!("left: {}px; top: {}px", m.x, m.y))
                // 外側クリック判定から除外
                on:pointerdown=|ev| ev.stop_propagation()
                on:contextmenu=|ev| ev.prevent_default()
            >
                {items.clone()}
            </ul>
        </Show>
    }
}
