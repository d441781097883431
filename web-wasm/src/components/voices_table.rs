//! パート一覧テーブル

use leptos::prelude::*;
use score_scan_common::VoiceTable;

#[component]
pub fn VoicesTable<F, G>(
    #[prop(into)] table: Signal<VoiceTable>,
    /// 行クリック: 0始まりのページへ移動
    on_select: F,
    /// 単一パートのPDF出力
    on_export: G,
    #[prop(into)] busy: Signal<bool>,
) -> impl IntoView
where
    F: Fn(usize) + 'static + Clone + Send + Sync,
    G: Fn(usize) + 'static + Clone + Send + Sync,
{
    view! {
        <table class="voices-table">
            <thead>
                <tr>
                    <th>"ページ"</th>
                    <th>"ページ数"</th>
                    <th>"タイトル"</th>
                    <th>"パート"</th>
                    <th></th>
                </tr>
            </thead>
            <tbody>
                {move || {
                    let on_select = on_select.clone();
                    let on_export = on_export.clone();
                    table
                        .with(|t| t.rows().to_vec())
                        .into_iter()
                        .enumerate()
                        .map(|(i, row)| {
                            let on_select = on_select.clone();
                            let on_export = on_export.clone();
                            let page_index = row.page_index();
                            view! {
                                <tr class="voice-row" on:click=move |_| on_select(page_index)>
                                    <td>{row.page}</td>
                                    <td>{row.num_pages.map(|n| n.to_string()).unwrap_or_default()}</td>
                                    <td>{if row.title_found { "✔" } else { "✘" }}</td>
                                    <td>{row.voice}</td>
                                    <td>
                                        <button
                                            disabled=move || busy.get()
                                            on:click=move |ev| {
                                                ev.stop_propagation();
                                                on_export(i);
                                            }
                                        >
                                            "PDF"
                                        </button>
                                    </td>
                                </tr>
                            }
                        })
                        .collect_view()
                }}
            </tbody>
        </table>
    }
}
