use clap::Parser;
use daily_menus::utils::error::{ErrorSeverity, MenuError};
use daily_menus::utils::logger;
use daily_menus::{CliConfig, DocxRenderer, LocalStorage, MenuEngine, MenuPipeline, ZipPackager};

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,      // 警告，但成功
        ErrorSeverity::Medium => 2,   // 部分日期失敗
        ErrorSeverity::High => 1,     // 輸入或配置錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    }
}

fn report_error(e: &MenuError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Menu generation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(exit_code(e.severity()))
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting daily-menus CLI");
    tracing::debug!("CLI config: {:?}", cli);

    // 合併並驗證配置
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            report_error(&e);
        }
    };

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }
    let dry_run = config.dry_run;

    // 相對路徑以目前工作目錄為準
    let storage = LocalStorage::new(".");
    let renderer = DocxRenderer::new(config.banner_marker.clone());
    let pipeline = MenuPipeline::new(storage, config, renderer, ZipPackager::new());
    let engine = MenuEngine::new_with_monitoring(pipeline, monitor_enabled);

    if dry_run {
        match engine.preview().await {
            Ok(preview) => match serde_json::to_string_pretty(&preview) {
                Ok(json) => println!("{}", json),
                Err(e) => report_error(&MenuError::from(e)),
            },
            Err(e) => report_error(&e),
        }
        return;
    }

    match engine.run().await {
        Ok(result) => {
            for path in &result.archives {
                println!("📦 {}", path);
            }
            if result.failures.is_empty() {
                tracing::info!("✅ All selected days generated");
                println!("✅ Generated {} archive(s)", result.archives.len());
                return;
            }

            // 部分日期失敗：成功的已寫出，逐一列出失敗日期
            eprintln!("⚠️ {} day(s) could not be generated:", result.failures.len());
            for failure in &result.failures {
                tracing::error!("❌ {}", failure);
                eprintln!("  ❌ {}", failure);
                eprintln!("     💡 {}", failure.source.recovery_suggestion());
            }
            std::process::exit(exit_code(ErrorSeverity::Medium));
        }
        Err(e) => report_error(&e),
    }
}
