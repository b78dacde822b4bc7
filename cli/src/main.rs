mod audio;
mod chat;
mod error;
mod modem;
mod server;

use clap::{Args, Parser, Subcommand};
use error::{CliError, Result};
use fskmodem_core::{optimal_rx_delay, Mode, DEFAULT_BLOCK_SIZE, DEFAULT_PREAMBLE, DEFAULT_TAIL};
use modem::{MessageReport, ModemSettings};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fskmodem")]
#[command(about = "Bell 103/202 FSK audio modem")]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct ModemArgs {
    /// Modem standard
    #[arg(short, long, default_value = "bell103")]
    mode: Mode,

    /// Output sample rate in Hz
    #[arg(short = 'r', long, default_value_t = 48000)]
    sample_rate: u32,

    /// Mark tone held before each message (seconds)
    #[arg(long, default_value_t = DEFAULT_PREAMBLE)]
    preamble: f64,

    /// Mark tone held after each message (seconds)
    #[arg(long, default_value_t = DEFAULT_TAIL)]
    tail: f64,

    /// Samples per processing block
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,
}

impl ModemArgs {
    fn settings(&self) -> ModemSettings {
        ModemSettings {
            mode: self.mode,
            sample_rate: self.sample_rate,
            preamble: self.preamble,
            tail: self.tail,
            block_size: self.block_size,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Encode messages to a WAV audio file
    Encode {
        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Text messages, each sent as a separate transmission
        #[arg(value_name = "TEXT")]
        text: Vec<String>,

        /// Send the contents of a file as one more message
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Prefix text messages with "SENDER: " for the chat client
        #[arg(short, long)]
        sender: Option<String>,

        #[command(flatten)]
        modem: ModemArgs,
    },

    /// Decode messages from a WAV audio file
    Decode {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Modem standard
        #[arg(short, long, default_value = "bell103")]
        mode: Mode,

        /// Samples per processing block
        #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,

        /// Print messages as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the built-in modem standards
    Modes,

    /// Search for the receive delay that best separates two tones
    OptimizeDelay {
        /// Symbol rate
        baud: f64,
        /// First tone (Hz)
        f1: f64,
        /// Second tone (Hz)
        f2: f64,
    },

    /// Serve the encoder and decoder over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Encode {
            output,
            text,
            input,
            sender,
            modem,
        } => encode_command(&output, text, input, sender.as_deref(), &modem)?,
        Commands::Decode {
            input,
            mode,
            block_size,
            json,
        } => decode_command(&input, mode, block_size, json)?,
        Commands::Modes => modes_command(),
        Commands::OptimizeDelay { baud, f1, f2 } => optimize_delay_command(baud, f1, f2)?,
        Commands::Serve { bind } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(bind))?;
        }
    }

    Ok(())
}

fn encode_command(
    output_path: &PathBuf,
    text: Vec<String>,
    input_path: Option<PathBuf>,
    sender: Option<&str>,
    modem: &ModemArgs,
) -> Result<()> {
    let mut messages = Vec::new();
    for line in text {
        let line = match sender {
            Some(sender) => chat::format_line(sender, &line)?,
            None => line,
        };
        messages.push(line.into_bytes());
    }
    if let Some(path) = input_path {
        let data = std::fs::read(&path)?;
        println!("Read {} bytes from {}", data.len(), path.display());
        messages.push(data);
    }
    if messages.is_empty() {
        return Err(CliError::InvalidInput(
            "nothing to send, pass TEXT or --input".to_string(),
        ));
    }

    let settings = modem.settings();
    let samples = modem::encode(&settings, &messages)?;
    println!(
        "Encoded {} messages to {} audio samples ({:.2} s, {})",
        messages.len(),
        samples.len(),
        samples.len() as f64 / f64::from(settings.sample_rate),
        settings.mode
    );

    let file = BufWriter::new(File::create(output_path)?);
    audio::write_wav(file, &samples, settings.sample_rate)?;
    println!("Wrote {}", output_path.display());
    Ok(())
}

fn decode_command(input_path: &PathBuf, mode: Mode, block_size: usize, json: bool) -> Result<()> {
    let recording = audio::read_wav(BufReader::new(File::open(input_path)?))?;
    tracing::info!(
        "read {} samples at {} Hz from {}",
        recording.samples.len(),
        recording.sample_rate,
        input_path.display()
    );

    let messages = modem::decode(mode, block_size, &recording)?;
    let reports: Vec<MessageReport> = messages.iter().map(MessageReport::from).collect();

    if json {
        let out = serde_json::to_string_pretty(&reports)
            .map_err(|e| CliError::InvalidInput(e.to_string()))?;
        println!("{}", out);
        return Ok(());
    }

    println!("Decoded {} messages", reports.len());
    for report in &reports {
        match chat::parse_line(&report.text) {
            Some(line) => println!(
                "[{:>8.3}s] <{}> {}",
                report.start_seconds, line.sender, line.text
            ),
            None => println!("[{:>8.3}s] {}", report.start_seconds, report.text),
        }
    }
    Ok(())
}

fn modes_command() {
    println!(
        "{:<10} {:>6} {:>8} {:>8} {:>16}",
        "mode", "baud", "mark", "space", "rx delay (s)"
    );
    for mode in Mode::ALL {
        let plan = mode.params();
        println!(
            "{:<10} {:>6} {:>8} {:>8} {:>16.12}",
            mode.name(),
            plan.baud,
            plan.mark,
            plan.space,
            plan.rx_delay
        );
    }
}

fn optimize_delay_command(baud: f64, f1: f64, f2: f64) -> Result<()> {
    if !(baud.is_finite() && baud > 0.0) {
        return Err(CliError::InvalidInput(format!(
            "baud must be positive, got {}",
            baud
        )));
    }

    let estimate = optimal_rx_delay(baud, f1, f2);
    println!("delay: {:.12} s", estimate.delay);
    println!("score: {:.12}", estimate.score);
    Ok(())
}
