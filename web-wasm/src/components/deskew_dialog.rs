//! 傾き補正ダイアログ

use leptos::prelude::*;
use score_scan_common::deskew::{DeskewDialog, FINE_RANGE, FINE_STEP};

#[component]
pub fn DeskewDialogView<F>(dialog: RwSignal<DeskewDialog>, on_save: F) -> impl IntoView
where
    F: Fn() + 'static + Clone + Send + Sync,
{
    let angle_text = move || format!("{:.1}°", dialog.with(|d| d.angle()));

    view! {
        <Show when=move || dialog.with(|d| d.is_open())>
            <div class="dialog deskew-dialog">
                <h3>"傾き補正"</h3>
                <div class="deskew-quick">
                    <button on:click=move |_| dialog.update(|d| d.rotate_left())>"⟲ 90°"</button>
                    <span class="deskew-angle">{angle_text}</span>
                    <button on:click=move |_| dialog.update(|d| d.rotate_right())>"⟳ 90°"</button>
                </div>
                <input
                    type="range"
                    min={-FINE_RANGE}
                    max=FINE_RANGE
                    step=FINE_STEP
                    prop:value=move || dialog.with(|d| d.angle().clamp(-FINE_RANGE, FINE_RANGE))
                    on:input=move |ev| {
                        if let Ok(value) = event_target_value(&ev).parse::<f64>() {
                            dialog.update(|d| d.set_fine(value));
                        }
                    }
                />
                <div class="dialog-actions">
                    <button
                        class="secondary"
                        disabled=move || dialog.with(|d| d.is_saving())
                        on:click=move |_| dialog.update(|d| d.cancel())
                    >
                        "キャンセル"
                    </button>
                    {
                        let on_save = on_save.clone();
                        view! {
                            <button
                                class="primary"
                                disabled=move || dialog.with(|d| d.is_saving())
                                on:click=move |_| on_save()
                            >
                                {move || if dialog.with(|d| d.is_saving()) { "保存中..." } else { "保存" }}
                            </button>
                        }
                    }
                </div>
            </div>
        </Show>
    }
}
