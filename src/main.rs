// ==========================================
// 学员档案系统 - 命令行入口
// ==========================================
// 子命令: init-db / import / get / list / delete / set-config
// 数据库: --db → STUDENT_REGISTRY_DB → 用户数据目录
// 输出: 命令结果以 JSON 写到 stdout，日志写到 stderr
// ==========================================

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use student_registry::app::{get_default_db_path, AppState};
use student_registry::domain::{StudentFilters, StudentStatus};
use student_registry::{logging, APP_NAME, VERSION};

#[derive(Parser)]
#[command(
    name = "student-registry",
    version,
    about = "Student records backend with bulk CSV/XLSX import"
)]
struct Cli {
    /// SQLite database file (default: $STUDENT_REGISTRY_DB or the user data directory).
    #[arg(long = "db", value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database schema (idempotent).
    InitDb,

    /// Import students from a .csv or .xlsx file.
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// User recorded as creator of the imported students.
        #[arg(long = "acting-user", value_name = "UUID")]
        acting_user: Option<Uuid>,
    },

    /// Show one student.
    Get {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// List students.
    List {
        #[arg(long)]
        status: Option<StudentStatus>,

        #[arg(long)]
        cohort: Option<String>,

        #[arg(long = "residence-country-id", value_name = "UUID")]
        residence_country_id: Option<Uuid>,

        /// Substring matched against first and last names.
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value_t = 0)]
        limit: i64,

        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    /// Soft-delete a student.
    Delete {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(long = "acting-user", value_name = "UUID")]
        acting_user: Option<Uuid>,
    },

    /// Store a configuration value (e.g. import.residence_country_fallback=false).
    SetConfig {
        #[arg(value_name = "KEY")]
        key: String,

        #[arg(value_name = "VALUE")]
        value: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    tracing::info!("{} {}", APP_NAME, VERSION);

    let db_path = match cli.db {
        Some(path) => path.to_string_lossy().to_string(),
        None => get_default_db_path(),
    };
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path)
        .map_err(anyhow::Error::msg)
        .context("failed to initialize application state")?;

    match cli.command {
        Command::InitDb => {
            println!("database ready: {}", state.db_path);
        }
        Command::Import { file, acting_user } => {
            let file_name = file.to_string_lossy().to_string();
            let data = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file_name))?;

            // Ctrl-C 停止后续行，已处理的行保留
            let cancel = Arc::new(AtomicBool::new(false));
            let flag = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("收到中断信号，停止导入");
                    flag.store(true, Ordering::SeqCst);
                }
            });

            let response = state
                .import_api
                .import_students_cancellable(&file_name, &data, acting_user, Some(cancel.as_ref()))
                .await?;
            print_json(&response)?;
        }
        Command::Get { id } => {
            let student = state.student_api.get_student(&id).await?;
            print_json(&student)?;
        }
        Command::List {
            status,
            cohort,
            residence_country_id,
            search,
            limit,
            offset,
        } => {
            let filters = StudentFilters {
                status,
                cohort,
                residence_country_id,
                search,
                limit,
                offset,
            };
            let page = state.student_api.list_students(filters).await?;
            print_json(&page)?;
        }
        Command::Delete { id, acting_user } => {
            state.student_api.delete_student(&id, acting_user).await?;
            println!("deleted {}", id);
        }
        Command::SetConfig { key, value } => {
            state.config_manager.set_config_value(&key, &value)?;
            println!("{} = {}", key, value);
        }
    }

    Ok(())
}
