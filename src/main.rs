use argh::FromArgs;
use infernum_cad::{
    ClientConfig, ConnectionConfig, ConsoleSink, DEFAULT_HOST, DEFAULT_MAX_VERIFICATION_ATTEMPTS,
    DEFAULT_MODEL, DEFAULT_PORT, GenerationLoop, GenerationOutcome, InferenceClient,
    InstructionTemplates, LoopConfig, PresentationSink,
};
use std::{
    io,
    path::{Path, PathBuf},
    process::ExitCode,
    str::FromStr,
};

const CONNECTION_FAILURE_MESSAGE: &str = "Failed to connect to Ollama API.";

#[derive(FromArgs)]
/// Generate OpenSCAD source from a text prompt using a local inference server
struct CliArgs {
    /// the host of the inference server
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port of the inference server
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// the model used for generation and verification
    #[argh(option, default = "DEFAULT_MODEL.to_string()")]
    model: String,

    /// command to execute: "check" or "generate"
    #[argh(subcommand)]
    command: CliCommands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum CliCommands {
    Check(CheckCommand),
    Generate(GenerateCommand),
}

#[derive(FromArgs)]
/// Check that the inference server answers
#[argh(subcommand, name = "check")]
struct CheckCommand {}

#[derive(FromArgs)]
/// Generate and verify OpenSCAD source for a prompt
#[argh(subcommand, name = "generate")]
struct GenerateCommand {
    /// maximum number of verification calls
    #[argh(option, short = 'n', default = "DEFAULT_MAX_VERIFICATION_ATTEMPTS")]
    max_attempts: usize,

    /// file to write the final source to
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// output format: "scad" or "stl"
    #[argh(option, short = 'f', default = "OutputFormat::Scad")]
    format: OutputFormat,

    /// the prompt describing the object
    #[argh(option, short = 'p')]
    prompt: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Scad,
    Stl,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scad" => Ok(OutputFormat::Scad),
            "stl" => Ok(OutputFormat::Stl),
            other => Err(format!("unsupported output format: {}", other)),
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    env_logger::init();
    let args: CliArgs = argh::from_env();

    let client = InferenceClient::new(ClientConfig {
        connection: ConnectionConfig::new(args.host, args.port),
        model: args.model,
        ..ClientConfig::default()
    });

    match args.command {
        CliCommands::Check(_) => {
            if client.check_connection() {
                println!("Connected to {}", client.config().connection.base_url());
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("{}", CONNECTION_FAILURE_MESSAGE);
                Ok(ExitCode::FAILURE)
            }
        }
        CliCommands::Generate(command) => run_generate(client, command),
    }
}

fn run_generate(
    client: InferenceClient,
    command: GenerateCommand,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut sink = ConsoleSink::stdio();

    // a failed probe is reported but does not stop the attempt
    if !client.check_connection() {
        sink.show_failure(CONNECTION_FAILURE_MESSAGE);
    }

    let mut engine = GenerationLoop::new(
        client,
        InstructionTemplates::default(),
        LoopConfig {
            max_verification_attempts: command.max_attempts,
            ..LoopConfig::default()
        },
    );

    let outcome = engine.generate(prepare_prompt(&command.prompt), &mut sink);
    log::info!(
        "Generation ended after {} verification call(s)",
        outcome.verification_calls()
    );

    if let Some(path) = command.output {
        write_output(&path, command.format, &outcome)?;
    }

    Ok(ExitCode::from(exit_status(&outcome)))
}

// the loop sends prompts unchanged, so surrounding whitespace is stripped here
fn prepare_prompt(raw: &str) -> &str {
    raw.trim()
}

/// Writes the final source to `path`. Returns whether anything was written.
fn write_output(
    path: &Path,
    format: OutputFormat,
    outcome: &GenerationOutcome,
) -> io::Result<bool> {
    let Some(code) = outcome.code() else {
        log::warn!("No code produced; {} left untouched", path.display());
        return Ok(false);
    };

    match format {
        OutputFormat::Scad => {
            std::fs::write(path, code)?;
            log::info!("Wrote {}", path.display());
            Ok(true)
        }
        OutputFormat::Stl => {
            log::warn!("STL export requested for {}", path.display());
            eprintln!("STL output is not supported; nothing was written");
            Ok(false)
        }
    }
}

fn exit_status(outcome: &GenerationOutcome) -> u8 {
    if outcome.is_verified() { 0 } else { 1 }
}
