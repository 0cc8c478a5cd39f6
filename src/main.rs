//! # zplgrid CLI
//!
//! Command-line interface for compiling label templates and running the
//! HTTP service.
//!
//! ## Usage
//!
//! ```bash
//! # Compile a template to ZPL on stdout
//! zplgrid compile template.json --width-mm 74 --height-mm 26 --var asset_id=A1
//!
//! # Compile and send to a configured printer
//! zplgrid print template.json --printer shipping --printers printers.json
//!
//! # Run the HTTP service
//! zplgrid serve --listen 0.0.0.0:8080 --data-dir ./data
//! ```

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use zplgrid::compiler::{CompileOptions, Compiler};
use zplgrid::printer::{apply_printer_settings, PrinterRegistry};
use zplgrid::server::{serve, ServerConfig};
use zplgrid::template::{RenderTarget, Template};
use zplgrid::transport::TcpTransport;
use zplgrid::vars::macros::{now_with_offset, parse_offset};
use zplgrid::vars::MacroContext;
use zplgrid::ZplgridError;

/// zplgrid - compile JSON label templates to ZPL II
#[derive(Parser, Debug)]
#[command(name = "zplgrid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct TargetArgs {
    /// Label width in millimetres
    #[arg(long)]
    width_mm: f64,

    /// Label height in millimetres
    #[arg(long)]
    height_mm: f64,

    /// Printer density in dots per inch
    #[arg(long, default_value = "203")]
    dpi: u32,

    /// Horizontal origin offset in millimetres
    #[arg(long, default_value = "0")]
    origin_x_mm: f64,

    /// Vertical origin offset in millimetres
    #[arg(long, default_value = "0")]
    origin_y_mm: f64,
}

impl TargetArgs {
    fn to_target(&self) -> RenderTarget {
        RenderTarget {
            width_mm: self.width_mm,
            height_mm: self.height_mm,
            dpi: self.dpi,
            origin_x_mm: self.origin_x_mm,
            origin_y_mm: self.origin_y_mm,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a template file to ZPL
    Compile {
        /// Template JSON file
        template: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        /// Template variable as name=value (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Draw debug frames around leaf content rects
        #[arg(long)]
        debug: bool,

        /// Write the program to a file instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Compile a template and send it to a configured printer
    Print {
        /// Template JSON file
        template: PathBuf,

        /// Printer id from the printers config
        #[arg(long)]
        printer: String,

        /// Printers config file
        #[arg(long, default_value = "printers.json")]
        printers: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        /// Template variable as name=value (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
    },

    /// Run the HTTP service
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        /// Root directory for templates, drafts, and counters
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Printers config file (defaults to <data-dir>/printers.json)
        #[arg(long)]
        printers: Option<PathBuf>,

        /// Draft lifetime in minutes
        #[arg(long, default_value = "30")]
        draft_ttl_minutes: i64,

        /// Fixed timezone offset for macro timestamps, e.g. +02:00
        #[arg(long)]
        timezone: Option<String>,
    },
}

fn parse_vars(pairs: &[String]) -> Result<HashMap<String, String>, ZplgridError> {
    let mut variables = HashMap::new();
    for pair in pairs {
        let (name, value) = pair.split_once('=').ok_or_else(|| {
            ZplgridError::Schema {
                path: "variables".into(),
                message: format!("expected NAME=VALUE, got {:?}", pair),
            }
        })?;
        variables.insert(name.to_string(), value.to_string());
    }
    Ok(variables)
}

fn load_template(path: &PathBuf) -> Result<Template, ZplgridError> {
    let text = std::fs::read_to_string(path)?;
    Template::from_json(&text)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ZplgridError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { template, target, vars, debug, output } => {
            let template = load_template(&template)?;
            let variables = parse_vars(&vars)?;
            let options = CompileOptions { debug, missing_variables_override: None };
            let zpl = template.compile(&target.to_target(), &variables, &options)?;
            match output {
                Some(path) => std::fs::write(path, zpl)?,
                None => print!("{}", zpl),
            }
            Ok(())
        }

        Commands::Print { template, printer, printers, target, vars } => {
            let template = load_template(&template)?;
            let variables = parse_vars(&vars)?;
            let registry = PrinterRegistry::load(&printers)?;
            let printer = registry.get(&printer)?;

            let ctx = MacroContext {
                template_name: Some(&template.name),
                printer_id: Some(&printer.id),
                draft_id: None,
                now: now_with_offset(None),
                counters: None,
            };
            let options = CompileOptions::default();
            let zpl = Compiler::new().compile(
                &template,
                &target.to_target(),
                &variables,
                &ctx,
                &options,
            )?;
            let payload = apply_printer_settings(&zpl, printer);
            let bytes = TcpTransport::for_printer(printer).send(payload.as_bytes())?;
            println!("sent {} bytes to {}", bytes, printer.id);
            Ok(())
        }

        Commands::Serve { listen, data_dir, printers, draft_ttl_minutes, timezone } => {
            let mut config = ServerConfig::new(listen, data_dir);
            if let Some(printers) = printers {
                config.printers_path = printers;
            }
            config.draft_ttl_minutes = draft_ttl_minutes;
            if let Some(tz) = timezone {
                config.timezone = Some(parse_offset(&tz).ok_or_else(|| ZplgridError::Schema {
                    path: "timezone".into(),
                    message: format!("expected +HH:MM or -HH:MM, got {:?}", tz),
                })?);
            }
            serve(config).await
        }
    }
}
