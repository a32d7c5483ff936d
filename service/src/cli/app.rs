//! `SchemaSheets` CLI application

use super::commands::{Linkml2SheetsCommand, Sheets2LinkmlCommand};
use super::commands::sheets2linkml::format_for;
use super::types::{FormatArg, SchemaSheetsCli, SchemaSheetsCommand};
use crate::config::{config_path, load_config};
use crate::schemasheets::config::{OutputFormat, SchemaSheetsConfig};
use clap::Parser;
use schemasheets_core::Result;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Main `SchemaSheets` CLI application
pub struct SchemaSheetsApp {
    cli: SchemaSheetsCli,
}

impl SchemaSheetsApp {
    /// Create the application from command line arguments
    #[must_use]
    pub fn from_args() -> Self {
        Self {
            cli: SchemaSheetsCli::parse(),
        }
    }

    /// Create the application from parsed arguments
    #[must_use]
    pub fn new(cli: SchemaSheetsCli) -> Self {
        Self { cli }
    }

    /// Run the application
    ///
    /// # Errors
    ///
    /// Returns the error of the failing command
    pub fn run(self) -> Result<()> {
        self.init_logging();
        match self.execute_command() {
            Ok(()) => {
                debug!("command completed");
                Ok(())
            }
            Err(err) => {
                error!("[{:?}] {}", err.category(), err);
                Err(err)
            }
        }
    }

    /// Install a stderr subscriber; `RUST_LOG` overrides the flags
    fn init_logging(&self) {
        let level = if self.cli.quiet {
            "error"
        } else {
            match self.cli.verbose {
                0 => "warn",
                1 => "info",
                _ => "debug",
            }
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .is_err()
        {
            debug!("logging already initialised");
        }
    }

    /// Configuration file settings, or defaults when there is none
    fn load_config(&self) -> Result<SchemaSheetsConfig> {
        match config_path(self.cli.config.as_deref()) {
            Some(path) => {
                info!("loading configuration {}", path.display());
                load_config(&path)
            }
            None => Ok(SchemaSheetsConfig::default()),
        }
    }

    fn execute_command(&self) -> Result<()> {
        let mut config = self.load_config()?;
        match &self.cli.command {
            SchemaSheetsCommand::Sheets2Linkml {
                sheets,
                output,
                name,
                table_config_path,
                use_attributes,
                unique_slots,
                no_repair,
                base_schema_path,
                sort_keys,
                format,
            } => {
                let maker = &mut config.maker;
                if name.is_some() {
                    maker.schema_name.clone_from(name);
                }
                if table_config_path.is_some() {
                    maker.table_config_path.clone_from(table_config_path);
                }
                if base_schema_path.is_some() {
                    maker.base_schema_path.clone_from(base_schema_path);
                }
                maker.use_attributes |= *use_attributes;
                maker.unique_slots |= *unique_slots;
                if *no_repair {
                    maker.repair = false;
                }
                config.output.sort_keys |= *sort_keys;
                if let Some(format) = format
                    .map(output_format)
                    .or_else(|| output.as_deref().and_then(format_for))
                {
                    config.output.format = format;
                }
                Sheets2LinkmlCommand::new(sheets.clone(), output.clone())
                    .with_config(config)
                    .execute()
            }
            SchemaSheetsCommand::Linkml2Sheets {
                schema,
                template,
                output,
            } => Linkml2SheetsCommand::new(schema.clone(), template.clone(), output.clone())
                .with_config(config)
                .execute(),
        }
    }
}

fn output_format(format: FormatArg) -> OutputFormat {
    match format {
        FormatArg::Yaml => OutputFormat::Yaml,
        FormatArg::Json => OutputFormat::Json,
    }
}
