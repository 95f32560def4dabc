use capture_metrics::{
    config::Config,
    output::{JsonRenderer, OutputFormat, Renderer, TextRenderer},
    pcap_engine::PcapEngine,
    ui::App,
    RunOptions,
};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "capture-metrics")]
#[command(about = "Compare packet size, timing, TCP window/flags and protocol mix across capture files")]
struct Cli {
    #[arg(short, long, help = "Capture file extension to look for (default: pcapng)")]
    ext: Option<String>,

    #[arg(short = 'C', long, help = "Directory to search for capture files (default: .)")]
    dir: Option<PathBuf>,

    #[arg(short, long, help = "Configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Tui, help = "Where to send the results")]
    output: OutputFormat,

    #[arg(long, help = "Include per-packet series in JSON output")]
    series: bool,

    #[arg(long, help = "Print the effective configuration as TOML and exit")]
    print_config: bool,

    #[arg(short, long, help = "Enable debug logging")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    }

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    }
    .with_overrides(cli.ext.clone(), cli.dir.clone());

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let mut renderer: Box<dyn Renderer> = match cli.output {
        OutputFormat::Tui => Box::new(App::new(config.ui.clone())),
        OutputFormat::Text => Box::new(TextRenderer::new(io::stdout())),
        OutputFormat::Json => Box::new(JsonRenderer::new(io::stdout()).with_series(cli.series)),
    };

    let options = RunOptions::from(&config);
    log::debug!("run options: {:?}", options);

    match capture_metrics::run(options, Arc::new(PcapEngine::new()), renderer.as_mut()).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_expected() => {
            println!("{}", e);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Application error: {}", e);
            process::exit(1);
        }
    }
}
