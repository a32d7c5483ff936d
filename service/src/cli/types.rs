//! CLI type definitions

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// `SchemaSheets` command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "schemasheets",
    version,
    about = "Convert between LinkML schemas and schema sheets"
)]
pub struct SchemaSheetsCli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to $SCHEMASHEETS_CONFIG)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: SchemaSheetsCommand,
}

/// Schema document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// YAML document
    Yaml,
    /// JSON document
    Json,
}

/// `SchemaSheets` subcommands
#[derive(Subcommand, Debug)]
pub enum SchemaSheetsCommand {
    /// Build a LinkML schema from one or more sheets
    ///
    /// # Examples
    ///
    /// ```bash
    /// schemasheets sheets2linkml classes.tsv slots.tsv -o personinfo.yaml
    ///
    /// # Sheets without descriptor lines
    /// schemasheets sheets2linkml data.csv -C table_config.yaml -n personinfo
    /// ```
    #[command(name = "sheets2linkml")]
    Sheets2Linkml {
        /// Sheet files (.tsv, .csv, .xlsx, .ods); merged in order
        #[arg(required = true, value_name = "SHEET")]
        sheets: Vec<PathBuf>,

        /// Output schema file (defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Schema name
        #[arg(short = 'n', long, value_name = "NAME")]
        name: Option<String>,

        /// Table configuration applied to every sheet
        #[arg(short = 'C', long, value_name = "FILE")]
        table_config_path: Option<PathBuf>,

        /// Class+slot rows create attributes instead of slot usages
        #[arg(long)]
        use_attributes: bool,

        /// Class+slot rows adorn the top-level slot
        #[arg(long)]
        unique_slots: bool,

        /// Do not declare missing prefixes and subsets
        #[arg(long)]
        no_repair: bool,

        /// Schema whose elements fill in what the sheets leave undefined
        #[arg(long, value_name = "FILE")]
        base_schema_path: Option<PathBuf>,

        /// Sort mapping keys in the output
        #[arg(long)]
        sort_keys: bool,

        /// Output format (defaults to the output file extension, else yaml)
        #[arg(short = 'f', long)]
        format: Option<FormatArg>,
    },

    /// Write a LinkML schema as a sheet shaped by a template
    ///
    /// # Examples
    ///
    /// ```bash
    /// schemasheets linkml2sheets personinfo.yaml -s template.tsv -o classes.tsv
    /// ```
    #[command(name = "linkml2sheets")]
    Linkml2Sheets {
        /// Schema file (.yaml, .yml, .json)
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Template sheet whose header is reused
        #[arg(short = 's', long, value_name = "FILE")]
        template: PathBuf,

        /// Output sheet (defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}
