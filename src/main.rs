// src/main.rs

use launchwatch::errors::Result;
use launchwatch::{cli, logging, run};

#[tokio::main]
async fn main() {
    let code = match run_main().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("launchwatch error: {err:?}");
            1
        }
    };

    std::process::exit(code);
}

async fn run_main() -> Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
