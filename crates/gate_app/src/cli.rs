use clap::{Parser, Subcommand, ValueEnum};
use gate_core::PolicyMode;
use gate_shield::DetectionLevel;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "promptgate",
    version,
    about = "Detect private information in AI-chat prompts and manage the prompt gate"
)]
pub struct Cli {
    /// Settings file (defaults to ~/.promptgate/settings.json)
    #[arg(long, global = true)]
    pub settings_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse text and print the detection result as JSON
    Scan {
        /// Text to analyse; read from stdin when omitted
        text: Option<String>,
        /// Detection level (defaults to the configured level)
        #[arg(long, value_enum)]
        level: Option<LevelArg>,
    },
    /// Print the text with every finding replaced by a placeholder
    Redact {
        text: Option<String>,
        #[arg(long, value_enum)]
        level: Option<LevelArg>,
    },
    /// Show or change gate settings
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommand>,
    },
    /// Manage trusted sites
    Trust {
        #[command(subcommand)]
        command: TrustCommand,
    },
    /// Follow the settings file and print the settings after each change
    Watch,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print the effective settings as JSON
    Show,
    /// Update one or more settings
    Set {
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        #[arg(long, value_enum)]
        level: Option<LevelArg>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TrustCommand {
    /// List trusted hosts
    List,
    /// Trust a host or the host of a URL
    Add { site: String },
    /// Stop trusting a host
    Remove { host: String },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelArg {
    Strict,
    Balanced,
    Lenient,
}

impl From<LevelArg> for DetectionLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Strict => DetectionLevel::Strict,
            LevelArg::Balanced => DetectionLevel::Balanced,
            LevelArg::Lenient => DetectionLevel::Lenient,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Block,
    Warn,
}

impl From<ModeArg> for PolicyMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Block => PolicyMode::Block,
            ModeArg::Warn => PolicyMode::Warn,
        }
    }
}
