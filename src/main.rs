mod audit;
mod gateway;
mod http_client;
mod model;
mod ollama;
mod service;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use audit::AuditSink;
use gateway::{AppState, create_router};
use model::arg::Args;
use model::config::Config;
use ollama::OllamaClient;
use service::GenerationService;

#[tokio::main]
async fn main() {
    // 解析命令行参数
    let args = Args::parse();

    // 加载配置
    let config_path = args
        .config
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let mut config = Config::load(&config_path).unwrap_or_else(|e| {
        eprintln!("加载配置失败 {}: {}", config_path, e);
        std::process::exit(1);
    });
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // 初始化日志，RUST_LOG 优先于配置
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},hyper=warn,reqwest=warn", config.log_level))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // 上游客户端
    let client = OllamaClient::from_config(&config).unwrap_or_else(|e| {
        tracing::error!("创建上游客户端失败: {}", e);
        std::process::exit(1);
    });
    tracing::info!(
        "上游: {} (默认模型 {}, 非流式超时 {}s, 流式超时 {}s)",
        config.upstream_base_url,
        config.default_model,
        config.once_timeout_secs,
        config.stream_timeout_secs
    );

    // 审计 sink
    let audit = Arc::new(AuditSink::open(&config.audit));
    let destinations = audit.destination_names();
    if destinations.is_empty() {
        tracing::warn!("未启用任何审计目标，请求摘要不会落盘");
    } else {
        tracing::info!("审计目标: {}", destinations.join(", "));
    }

    let state = AppState::new(GenerationService::new(Arc::new(client)), audit)
        .with_default_model(config.default_model.clone());
    let app = create_router(state);

    // 启动服务器
    let addr = config.bind_addr();
    tracing::info!("启动 HTTP 服务器: {}", addr);
    tracing::info!("可用端点:");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /ready");
    tracing::info!("  POST /generate");
    tracing::info!("  POST /generate/stream");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("监听 {} 失败: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("服务器异常退出: {}", e);
        std::process::exit(1);
    }
    tracing::info!("服务器已停止");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("监听退出信号失败: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，正在关闭");
}
