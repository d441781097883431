//! ラベル割り当てパネル

use leptos::prelude::*;
use score_scan_common::label_panel::{self, LabelChange};
use score_scan_common::Viewer;

use crate::api;
use crate::app::AppContext;

#[component]
pub fn LabelPanel(viewer: RwSignal<Viewer>) -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let rows = move || viewer.with(|v| label_panel::rows(v.model().store()));

    view! {
        <div class="label-panel">
            <h3>"ラベル"</h3>
            {move || {
                let api = ctx.api.clone();
                rows()
                    .into_iter()
                    .map(|row| {
                        let key = row.key;
                        let api = api.clone();
                        let on_change = move |ev: web_sys::Event| {
                            let value = event_target_value(&ev);
                            let change = viewer
                                .with_untracked(|v| label_panel::parse_selection(v.model().store(), key, &value));
                            let Some(change) = change else {
                                return;
                            };
                            let saved = viewer
                                .try_update(|v| match change {
                                    LabelChange::Assign(key, index) => v.model_mut().assign_label(key, index),
                                    LabelChange::Clear(key) => v.model_mut().clear_label(key),
                                })
                                .flatten();
                            api::persist(&api, saved);
                        };
                        let current = row.value.clone();
                        view! {
                            <label class="label-row">
                                <span class="label-swatch" style=format!("background: {}", row.color)></span>
                                <span class="label-name">{key.display_name()}</span>
                                <select on:change=on_change>
                                    <option value="" selected=current.is_empty()>"未設定"</option>
                                    {row
                                        .options
                                        .into_iter()
                                        .map(|o| {
                                            let selected = o.value == current;
                                            view! {
                                                <option value=o.value selected=selected>{o.text}</option>
                                            }
                                        })
                                        .collect_view()}
                                </select>
                            </label>
                        }
                    })
                    .collect_view()
            }}
        </div>
    }
}
