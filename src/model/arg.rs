use clap::Parser;

/// 本地 LLM 网关
#[derive(Parser, Debug)]
#[command(name = "llm-gateway-rs")]
#[command(about = "Local HTTP gateway for an Ollama-compatible inference daemon", long_about = None)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<String>,

    /// 覆盖监听地址
    #[arg(long)]
    pub host: Option<String>,

    /// 覆盖监听端口
    #[arg(short, long)]
    pub port: Option<u16>,
}
