//! サイドバー

use leptos::prelude::*;
use score_scan_common::routes::Route;

use crate::app::AppContext;

fn is_active(current: &Route, target: &Route) -> bool {
    match (current, target) {
        (Route::DocumentDetail(_), Route::Documents) => true,
        (Route::Users(_), Route::Users(_)) => true,
        (Route::Organisations(_), Route::Organisations(_)) => true,
        (a, b) => a == b,
    }
}

#[component]
pub fn Sidebar<F>(
    collapsed: RwSignal<bool>,
    route: RwSignal<Route>,
    on_toggle: F,
) -> impl IntoView
where
    F: Fn() + 'static + Clone,
{
    let ctx = expect_context::<AppContext>();
    let entries = [
        ("📄", "ドキュメント", Route::Documents),
        ("🎼", "パート検出", Route::VoiceScan),
        ("👤", "ユーザー", Route::Users(None)),
        ("🏢", "組織", Route::Organisations(None)),
    ];

    view! {
        <nav class="sidebar">
            <button class="sidebar-toggle" on:click=move |_| on_toggle()>
                {move || if collapsed.get() { "»" } else { "«" }}
            </button>
            <ul>
                {entries
                    .into_iter()
                    .map(|(icon, label, target)| {
                        let navigate = ctx.navigate;
                        let active = {
                            let target = target.clone();
                            move || route.with(|r| is_active(r, &target))
                        };
                        view! {
                            <li
                                class=move || if active() { "nav-item active" } else { "nav-item" }
                                title=label
                                on:click=move |_| navigate.run(target.clone())
                            >
                                <span class="nav-icon">{icon}</span>
                                <Show when=move || !collapsed.get()>
                                    <span class="nav-label">{label}</span>
                                </Show>
                            </li>
                        }
                    })
                    .collect_view()}
            </ul>
        </nav>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_highlights_documents() {
        let detail = Route::DocumentDetail("5".into());
        assert!(is_active(&detail, &Route::Documents));
        assert!(!is_active(&detail, &Route::VoiceScan));
    }

    #[test]
    fn test_sub_routes_highlight_section() {
        assert!(is_active(&Route::Users(Some("3".into())), &Route::Users(None)));
        assert!(is_active(&Route::Organisations(None), &Route::Organisations(None)));
        assert!(!is_active(&Route::NotFound, &Route::Documents));
    }
}
