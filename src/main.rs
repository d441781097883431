use clap::Parser;
use score_scan::{annotate, cli, client, config, deskew, error, export, interactive, preview, scanner, voices, workflow};
use cli::{Cli, Commands};
use client::{Backend, HttpBackend};
use config::Config;
use error::{Result, ScoreScanError};
use score_scan_common::session::AnnotationModel;
use score_scan_common::{BoxPatch, TaskSummary};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "score_scan=debug,score_scan_common=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn backend(config: &Config, server: Option<String>) -> Result<HttpBackend> {
    let server_url = server.unwrap_or_else(|| config.server_url());
    HttpBackend::new(&server_url, &config.get_token()?)
}

fn print_tasks(tasks: &[TaskSummary]) {
    if tasks.is_empty() {
        println!("タスクはありません");
        return;
    }
    println!("{:<10} {:<12} {:>6}  {}", "ID", "状態", "ページ", "ファイル名");
    for task in tasks {
        println!(
            "{:<10} {:<12} {:>6}  {}",
            task.id,
            task.status.to_string(),
            task.num_pages.map(|n| n.to_string()).unwrap_or_else(|| "-".into()),
            task.filename
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;
    let interval = Duration::from_millis(config.poll_interval_ms);

    match cli.command {
        Commands::Upload { path, no_wait } => {
            println!("🎼 score-scan - アップロード\n");
            let backend = backend(&config, cli.server)?;

            println!("[1/2] PDFをスキャン中...");
            let pdfs = scanner::scan_pdfs(&path)?;
            if pdfs.is_empty() {
                return Err(ScoreScanError::NoPdfsFound(path.display().to_string()));
            }
            println!("✔ {}件のPDFを検出\n", pdfs.len());

            println!("[2/2] アップロード・処理中...");
            let mut failed = 0;
            for pdf in &pdfs {
                if no_wait {
                    let bytes = tokio::fs::read(&pdf.path).await?;
                    let response = backend.upload(&pdf.file_name, bytes).await?;
                    println!(
                        "✔ {} → タスク {}",
                        pdf.file_name,
                        response.task_id.unwrap_or_else(|| "?".into())
                    );
                    continue;
                }
                let progress = workflow::spinner(&pdf.file_name);
                let result = workflow::upload_and_wait(&backend, &pdf.path, interval, &progress).await;
                progress.finish_and_clear();
                match result {
                    Ok(done) => println!(
                        "✔ {} → タスク {} ({}ページ)",
                        pdf.file_name,
                        done.task.task_id,
                        done.pages.len()
                    ),
                    Err(e) => {
                        failed += 1;
                        println!("✘ {}: {}", pdf.file_name, e);
                    }
                }
            }

            if failed > 0 {
                println!("\n⚠ {}件が失敗しました", failed);
            } else {
                println!("\n✅ 完了");
            }
        }

        Commands::Tasks { watch, export: format, output } => {
            let backend = backend(&config, cli.server)?;

            if watch {
                println!("👀 タスクを監視中... (Ctrl+Cで終了)\n");
                let list_interval = Duration::from_millis(u64::from(
                    score_scan_common::poller::TASK_LIST_INTERVAL_MS,
                ));
                workflow::watch_tasks(&backend, list_interval, None, |tasks, finished| {
                    for task in finished {
                        println!("🔔 {} の処理が完了しました", task.filename);
                    }
                    print_tasks(tasks);
                    println!();
                })
                .await?;
                return Ok(());
            }

            let tasks = backend.list_tasks().await?;
            print_tasks(&tasks);

            if let Some(format) = format {
                let output = output.unwrap_or_else(|| PathBuf::from("."));
                let title = export::default_title("dokumente", "alle");
                export::export_rows(&tasks, format, &output, &title, "Dokumente")?;
            }
        }

        Commands::Status { task_id } => {
            let backend = backend(&config, cli.server)?;
            let status = backend.status(&task_id).await?;
            println!("タスク {}: {}", task_id, status.status);
            if let Some(pages) = status.num_pages {
                println!("  ページ数: {}", pages);
            }
            if let Some(message) = status.error_message {
                println!("  エラー: {}", message);
            }
        }

        Commands::Pages { task_id } => {
            let backend = backend(&config, cli.server)?;
            let pages = backend.pages(&task_id).await?.pages;
            for (i, url) in pages.iter().enumerate() {
                println!("{:>4}: {}", i + 1, client::absolute_url(backend.server_url(), url));
            }
        }

        Commands::Ocr { task_id, page, trigger } => {
            let backend = backend(&config, cli.server)?;
            let session = if trigger {
                let progress = workflow::spinner("OCR実行中...");
                let result = annotate::recognize(&backend, &task_id, page).await;
                progress.finish_and_clear();
                result?
            } else {
                annotate::open_page(&backend, &task_id, page).await?
            };

            if !session.has_ocr() {
                println!("{}ページはまだOCRされていません（--triggerで実行）", page);
                return Ok(());
            }
            println!("📄 タスク {} / {}ページ: {}ボックス\n", task_id, page, session.session.store().len());
            for line in annotate::describe_boxes(&session) {
                println!("{line}");
            }
            let suggestions = session.session.suggestions();
            if !suggestions.is_empty() {
                println!("\n候補:");
                for (label, text) in suggestions {
                    println!("  {}: {}", label, text);
                }
            }
        }

        Commands::Label { task_id, page, key, index, clear, interactive: is_interactive } => {
            let backend = backend(&config, cli.server)?;
            let mut session = annotate::open_page(&backend, &task_id, page).await?;

            if is_interactive {
                println!("🏷  タスク {} / {}ページ - ラベル割り当て\n", task_id, page);
                let changes = interactive::run_interactive_labels(&backend, &mut session).await?;
                println!("\n✓ {}件を変更しました", changes);
                return Ok(());
            }

            let key = key.ok_or_else(|| {
                ScoreScanError::CliExecution("ラベルを指定してください (title/composer/arranger/voice/genre)".into())
            })?;
            let saved = if clear {
                annotate::clear_label(&backend, &mut session, key).await?
            } else {
                let index = index.ok_or_else(|| {
                    ScoreScanError::CliExecution("ボックス番号を指定してください".into())
                })?;
                annotate::assign_label(&backend, &mut session, key, index).await?
            };
            if saved {
                println!("✔ {} を更新しました", key);
            } else {
                println!("⚠ {} を更新しましたが保存に失敗しました", key);
            }
        }

        Commands::EditBox { task_id, page, index, x, y, width, height } => {
            let backend = backend(&config, cli.server)?;
            let mut session = annotate::open_page(&backend, &task_id, page).await?;
            let patch = BoxPatch { x, y, width, height, text: None };
            let saved = annotate::edit_box(&backend, &mut session, index, patch).await?;
            if let Some(b) = session.session.store().get(index) {
                println!("✔ ボックス {}: {} ({:.0}, {:.0}, {:.0}×{:.0})", index, b.text, b.x, b.y, b.width, b.height);
            }
            if !saved {
                println!("⚠ 保存に失敗しました");
            }
        }

        Commands::RemoveBox { task_id, page, index } => {
            let backend = backend(&config, cli.server)?;
            let mut session = annotate::open_page(&backend, &task_id, page).await?;
            let saved = annotate::remove_box(&backend, &mut session, index).await?;
            println!("✔ ボックス {} を削除しました（残り{}）", index, session.session.store().len());
            if !saved {
                println!("⚠ 保存に失敗しました");
            }
        }

        Commands::Deskew { task_id, page, angle, right, left } => {
            let backend = backend(&config, cli.server)?;
            let quarter_turns = i32::from(right) - i32::from(left);
            let applied = deskew::deskew_page(&backend, &task_id, page, angle, quarter_turns).await?;
            println!("✔ {}ページを {:.1}° 回転しました", page, applied);
        }

        Commands::Voices { task_id, page, export: format, output } => {
            println!("🎺 score-scan - 声部検出\n");
            let backend = backend(&config, cli.server)?;
            let session = annotate::open_page(&backend, &task_id, page).await?;

            let progress = workflow::spinner("声部を検出中...");
            let result = voices::detect(&backend, &session).await;
            progress.finish_and_clear();
            let table = result?;

            println!("{:>3}  {:>5}  {:>6}  {:<6}  {}", "#", "ページ", "枚数", "タイトル", "声部");
            for (i, row) in table.rows().iter().enumerate() {
                println!(
                    "{:>3}  {:>5}  {:>6}  {:<6}  {}",
                    i,
                    row.page,
                    row.num_pages.map(|n| n.to_string()).unwrap_or_else(|| "-".into()),
                    if row.title_found { "✓" } else { "" },
                    row.voice
                );
            }

            if let Some(format) = format {
                let output = output.unwrap_or_else(|| PathBuf::from("."));
                let title = export::default_title("stimmen", &task_id);
                export::export_rows(table.rows(), format, &output, &title, "Stimmen")?;
            }
        }

        Commands::Split { task_id, page, zip, voice, output } => {
            println!("✂ score-scan - PDF分割\n");
            let backend = backend(&config, cli.server)?;
            let session = annotate::open_page(&backend, &task_id, page).await?;

            println!("[1/2] 声部を検出中...");
            let table = voices::detect(&backend, &session).await?;
            println!("✔ {}声部を検出\n", table.len());

            println!("[2/2] 分割中...");
            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
            let result = if zip {
                voices::split_zip(&backend, &session, &table, &output_dir).await?
            } else {
                voices::split(&backend, &session, &table, voice).await?
            };

            match result {
                voices::SplitOutput::Zip(path) => println!("✔ ZIP保存: {}", path.display()),
                voices::SplitOutput::Files { export_dir, urls } => {
                    if let Some(dir) = export_dir {
                        println!("✔ サーバー出力先: {}", dir);
                    }
                    let written = voices::download_all(&backend, &urls, &output_dir).await?;
                    for path in written {
                        println!("✔ {}", path.display());
                    }
                }
            }
            println!("\n✅ 分割完了");
        }

        Commands::Preview { task_id, page, zoom, width, select, output } => {
            let backend = backend(&config, cli.server)?;
            let options = preview::PreviewOptions { page, zoom, container_width: width, selected: select };
            let image = preview::render(&backend, &task_id, options).await?;
            preview::save(&image, &output)?;
            println!("✔ プレビュー出力: {} ({}×{})", output.display(), image.width(), image.height());
        }

        Commands::Config { set_token, set_server, show } => {
            let mut config = config;

            if let Some(token) = set_token {
                config.set_token(token)?;
                println!("✔ トークンを設定しました");
            }

            if let Some(server) = set_server {
                config.set_server_url(server)?;
                println!("✔ サーバーURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  サーバー: {}", config.server_url());
                println!("  ポーリング間隔: {}ms", config.poll_interval_ms);
                println!("  トークン: {}", if config.get_token().is_ok() { "設定済み" } else { "未設定" });
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}
