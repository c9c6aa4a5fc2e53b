use clap::{Parser, Subcommand, ValueEnum};
use genai::adapter::AdapterKind;
use std::path::PathBuf;

/// Converts Maven projects to Gradle
#[derive(Parser, Debug)]
#[command(
    name = "pom2gradle",
    about = "Converts Maven projects to Gradle builds",
    version,
    author,
    long_about = "pom2gradle translates pom.xml files into build.gradle and settings.gradle, \
                  runs the Gradle build, asks an LLM to repair the build file when it fails, \
                  and opens a pull request with the result. It supports multiple AI backends \
                  (Ollama, OpenAI, Claude, Gemini, Grok, Groq)."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Verbose output (debug logging)")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Generate Gradle files from pom.xml (offline)",
        long_about = "Translates the root pom.xml and every module's pom.xml, then writes \
                      build.gradle files, settings.gradle and .gitignore. Nothing is built.\n\n\
                      Examples:\n  \
                      pom2gradle convert\n  \
                      pom2gradle convert /path/to/project\n  \
                      pom2gradle convert --main-class com.example.App --stdout"
    )]
    Convert(ConvertArgs),

    #[command(
        about = "List the modules of a multi-module project",
        long_about = "Prints the <modules> declared by the root pom.xml.\n\n\
                      Examples:\n  \
                      pom2gradle modules\n  \
                      pom2gradle modules /path/to/project --absolute"
    )]
    Modules(ModulesArgs),

    #[command(
        about = "Run the full migration: convert, build, repair, open a pull request",
        long_about = "Clones the configured GitHub repository (or uses --local), converts the \
                      build, runs Gradle with LLM repairs on failure and publishes the result \
                      as a pull request.\n\n\
                      Examples:\n  \
                      pom2gradle migrate\n  \
                      pom2gradle migrate --local . --no-publish\n  \
                      pom2gradle migrate --backend ollama --model qwen2.5-coder:7b"
    )]
    Migrate(MigrateArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ConvertArgs {
    #[arg(value_name = "PATH", help = "Project root (defaults to current directory)")]
    pub path: Option<PathBuf>,

    #[arg(long, value_name = "CLASS", help = "Main class for the root project")]
    pub main_class: Option<String>,

    #[arg(long, help = "Print the root build.gradle instead of writing files")]
    pub stdout: bool,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ModulesArgs {
    #[arg(value_name = "PATH", help = "Project root (defaults to current directory)")]
    pub path: Option<PathBuf>,

    #[arg(long, help = "Print canonical paths, dropping modules that do not exist")]
    pub absolute: bool,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct MigrateArgs {
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with = "workdir",
        help = "Migrate an existing checkout instead of cloning"
    )]
    pub local: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Clone destination (defaults to ./<repository name>)"
    )]
    pub workdir: Option<PathBuf>,

    #[arg(long, num_args = 1.., value_name = "TASK", help = "Gradle tasks to run")]
    pub tasks: Option<Vec<String>>,

    #[arg(long, value_name = "N", help = "Total build attempts, repairs included")]
    pub max_attempts: Option<u32>,

    #[arg(long, value_name = "SECS", help = "Timeout for one Gradle run (0 disables)")]
    pub build_timeout: Option<u64>,

    #[arg(long, value_name = "CLASS", help = "Main class for the root project")]
    pub main_class: Option<String>,

    #[arg(long, help = "Skip commit, push and pull request")]
    pub no_publish: bool,

    #[arg(
        short = 'b',
        long,
        value_parser = parse_adapter_kind,
        help = "LLM provider for build repairs"
    )]
    pub backend: Option<AdapterKind>,

    #[arg(short = 'm', long, value_name = "MODEL", help = "Model name (provider-specific)")]
    pub model: Option<String>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_adapter_kind(s: &str) -> Result<AdapterKind, String> {
    crate::config::parse_provider(s).map_err(|e| e.to_string())
}
