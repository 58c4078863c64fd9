//! 스토어프론트 운영 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 스키마 마이그레이션
//! shop migrate
//!
//! # 샘플 카탈로그 시드 (기존 상품 삭제)
//! shop seed
//!
//! # 기존 상품을 유지한 채 시드
//! shop seed --keep
//!
//! # admin 계정 생성 또는 승격
//! shop create-admin --name Admin --email admin@example.com --password changeme
//! ```

use clap::{Parser, Subcommand};
use tracing::{error, info};

use shop_cli::commands::{
    connect,
    create_admin::{create_admin, AdminOutcome, CreateAdminConfig},
    migrate::migrate,
    seed::seed,
};
use shop_core::{init_logging, AppConfig, LogConfig};

#[derive(Parser)]
#[command(name = "shop")]
#[command(about = "Storefront CLI - 마이그레이션, 시드, admin 계정 관리", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일
    #[arg(short, long, global = true, default_value = shop_core::DEFAULT_CONFIG_PATH)]
    config: String,

    /// 데이터베이스 URL (기본: DATABASE_URL 환경변수)
    #[arg(long, global = true)]
    db_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 스키마 마이그레이션 적용
    Migrate,

    /// 샘플 상품 카탈로그 시드
    Seed {
        /// 기존 상품을 삭제하지 않음
        #[arg(long, default_value = "false")]
        keep: bool,
    },

    /// admin 계정 생성 (이미 있으면 승격)
    CreateAdmin {
        /// 표시 이름
        #[arg(short, long)]
        name: String,

        /// 이메일
        #[arg(short, long)]
        email: String,

        /// 비밀번호 (6자 이상)
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)?;
    init_logging(LogConfig::from(&config.logging)).map_err(|e| anyhow::anyhow!("{e}"))?;

    let pool = connect(cli.db_url, config.database.url.as_deref()).await?;

    let result = match cli.command {
        Commands::Migrate => migrate(&pool).await.map(|()| {
            println!("\n✅ 마이그레이션 완료");
        }),

        Commands::Seed { keep } => seed(&pool, keep).await.map(|report| {
            info!(
                removed = report.removed,
                created = report.created,
                failed = report.failed,
                "Seeding completed"
            );
            println!("\n🌱 시드 완료: {} 상품 생성", report.created);
            if report.failed > 0 {
                println!("⚠️  실패: {} 상품", report.failed);
            }
        }),

        Commands::CreateAdmin {
            name,
            email,
            password,
        } => {
            let config = CreateAdminConfig {
                name,
                email,
                password,
            };
            create_admin(&pool, config).await.map(|(user, outcome)| {
                let action = match outcome {
                    AdminOutcome::Created => "생성됨",
                    AdminOutcome::Promoted => "승격됨",
                    AdminOutcome::AlreadyAdmin => "이미 admin",
                };
                println!("\n✅ admin 계정 {}: {} (id={})", action, user.email, user.id);
            })
        }
    };

    pool.close().await;

    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }
    result
}
