use clap::Parser;
use drone_gemini::cli::{Cli, OutputFormat};
use drone_gemini::{AppError, Plugin, logging, report};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = cli.format;
    let log_format = cli.log_format;

    let settings = match cli.into_settings() {
        Ok(settings) => settings,
        Err(e) => return fail(AppError::from(e)),
    };

    logging::init(log_format, settings.debug);

    let summary = match report::validated_summary(&settings) {
        Ok(summary) => summary,
        Err(e) => return fail(AppError::from(e)),
    };

    if format == OutputFormat::Human {
        println!("{}", summary);
        println!("Executing AI analysis...\n");
    }

    let plugin = match Plugin::new(settings) {
        Ok(plugin) => plugin,
        Err(e) => return fail(e),
    };

    let analysis = match plugin.exec().await {
        Ok(analysis) => analysis,
        Err(e) => return fail(e),
    };

    match format {
        OutputFormat::Human => print!("{}", report::render_human(&analysis)),
        OutputFormat::Json => match report::render_json(&analysis) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: failed to encode result: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

fn fail(error: AppError) -> ExitCode {
    tracing::error!(error = %error, "plugin failed");
    eprintln!("Error: {}", error);
    ExitCode::from(error.exit_code())
}
