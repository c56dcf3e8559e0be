use anyhow::{bail, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use exifrename_core::{
    app_paths, load_config, rename_files, AppConfig, BatchReport, Overrides, RenameStatus,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "exifrename", version)]
#[command(about = "写真のファイル名を撮影日時で一括リネームします")]
struct Cli {
    /// リネームするファイル
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,
    /// ファイル名の先頭に付与するプレフィックス
    #[arg(long)]
    prefix: Option<String>,
    /// ファイル名の末尾(拡張子の前)に付与するサフィックス
    #[arg(long)]
    suffix: Option<String>,
    /// カウンタ部分の桁数 [既定: 2]
    #[arg(long = "cl", value_name = "DIGITS")]
    counter_width: Option<usize>,
    /// 日付時刻部分のフォーマット(strftime形式) [既定: %Y%m%d_%H%M%S]
    #[arg(long, value_name = "FORMAT")]
    datetime_format: Option<String>,
    /// 実際に実行せずに実行結果を表示します
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// 失敗したファイルがあっても残りのファイルを処理します
    #[arg(long, default_value_t = false)]
    continue_on_error: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
    /// 設定ファイル(TOML)のパス
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// 読み込んだ設定を表示して終了します
    #[arg(long, default_value_t = false)]
    show_config: bool,
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.files.is_empty() && !cli.show_config {
        Cli::command().print_help()?;
        return Ok(());
    }

    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    if cli.show_config {
        return cmd_config_show(&cli, &config);
    }

    cmd_rename(cli, &config)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_rename(cli: Cli, config: &AppConfig) -> Result<()> {
    let (naming, options) = config.resolve(Overrides {
        prefix: cli.prefix,
        suffix: cli.suffix,
        datetime_format: cli.datetime_format,
        counter_width: cli.counter_width,
        continue_on_error: cli.continue_on_error,
        dry_run: cli.dry_run,
    })?;

    let report = match rename_files(&cli.files, &naming, &options) {
        Ok(report) => report,
        Err(err) => {
            // 取り残しで打ち切った場合も、それまでの結果は出力する
            render_report(cli.output, &err.report)?;
            return Err(err.source.into());
        }
    };
    render_report(cli.output, &report)?;

    if !report.is_success() {
        bail!("{}件のファイルを処理できませんでした", report.failed);
    }
    Ok(())
}

fn render_report(output: OutputFormat, report: &BatchReport) -> Result<()> {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => print_summary(report),
    }
    Ok(())
}

fn cmd_config_show(cli: &Cli, config: &AppConfig) -> Result<()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => app_paths()?.config_path,
    };
    println!("設定ファイル: {}", path.display());
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn print_summary(report: &BatchReport) {
    for outcome in &report.outcomes {
        if outcome.status == RenameStatus::Failed {
            eprintln!(
                "失敗: {} ({})",
                outcome.source_path.display(),
                outcome.error_detail.as_deref().unwrap_or("原因不明")
            );
        }
    }

    eprintln!(
        "集計: renamed={} unchanged={} failed={}",
        report.renamed, report.skipped, report.failed
    );
    if report.aborted {
        eprintln!("失敗したファイルがあったため処理を中止しました。続行するには --continue-on-error を指定してください。");
    }
    if report.dry_run {
        eprintln!("dry-runモード: 実ファイルは変更していません。");
    }
}
