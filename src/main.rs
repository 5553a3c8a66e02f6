mod cli;

use heifpress::server;
use heifpress_core::config;
use heifpress_convert::{catalog_names, check_all, is_known_tool, ConversionRequest};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "heifpress=trace,heifpress_convert=trace,heifpress_core=debug,tower_http=debug"
                .to_string()
        } else {
            "heifpress=debug,heifpress_convert=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Convert { input, output } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_batch(
                &input,
                output.as_deref(),
                cli.config.as_deref(),
            ))
        }
        Commands::CheckTools => check_tools(),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("heifpress {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    tracing::info!("Starting heifpress server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

async fn convert_batch(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let preferred = config.converter.preferred.as_deref();

    let sources = collect_sources(input)?;
    if sources.is_empty() {
        println!("No HEIC/HEIF files found to convert.");
        return Ok(());
    }

    println!(
        "Found {} HEIC/HEIF file(s). Starting conversion...",
        sources.len()
    );

    // --output names the result file only for a single input with a .jpg path;
    // otherwise it is a destination directory.
    let explicit_jpg = sources.len() == 1
        && output
            .and_then(|p| p.extension())
            .map(|e| e.eq_ignore_ascii_case("jpg"))
            .unwrap_or(false);

    for source in &sources {
        let (output_dir, output_file_name) = match output {
            Some(out) if explicit_jpg => (
                out.parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from(".")),
                out.file_name().map(|n| n.to_string_lossy().into_owned()),
            ),
            Some(dir) => (dir.to_path_buf(), None),
            None => (
                source
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("converted"),
                None,
            ),
        };

        let request = ConversionRequest {
            source_path: source.clone(),
            output_dir,
            output_file_name,
        };
        let result = heifpress_convert::convert(&request, preferred).await?;
        println!(
            "Converted {} -> {} using {}",
            source.display(),
            result.output_path.display(),
            result.command
        );
    }

    println!("All conversions completed.");
    Ok(())
}

fn collect_sources(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_dir() {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(input)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| heifpress_convert::is_heif_path(p))
            .collect();
        files.sort();
        return Ok(files);
    }

    if heifpress_convert::is_heif_path(input) {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {:?}", input);
        }
        return Ok(vec![input.to_path_buf()]);
    }

    anyhow::bail!(
        "Input must be a HEIC/HEIF file or a directory containing them: {:?}",
        input
    )
}

fn check_tools() -> Result<()> {
    println!("Checking converter tools...\n");

    let infos = check_all();
    let mut any_available = false;

    for info in &infos {
        let status = if info.available {
            any_available = true;
            "✓"
        } else {
            "✗"
        };

        print!("{} {} ({})", status, info.name, info.description);

        if let Some(ref version) = info.version {
            print!(" - {version}");
        }

        if let Some(ref path) = info.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if any_available {
        println!("A converter is available.");
    } else {
        println!(
            "No converter found. Install ImageMagick (`magick`/`convert`) or libheif (`heif-convert`)."
        );
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            heifpress_core::Config::default()
        }
    };

    let mut warnings = config.validate();
    if let Some(ref preferred) = config.converter.preferred {
        if !is_known_tool(preferred) {
            warnings.push(format!(
                "converter.preferred '{}' is not in the tool catalog ({})",
                preferred,
                catalog_names().join(", ")
            ));
        }
    }

    for warning in &warnings {
        println!("  warning: {warning}");
    }

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Upload dir: {}", config.storage.upload_dir.display());
    println!("  Converted dir: {}", config.storage.converted_dir.display());
    println!(
        "  Preferred converter: {}",
        config.converter.preferred.as_deref().unwrap_or("(auto)")
    );

    Ok(())
}
