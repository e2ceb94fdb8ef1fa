use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nexo_envelope::cli::{handle_derive_key, handle_envelope_command, EnvelopeCommands};
use nexo_envelope::config::{paths::EnvelopePaths, settings::Settings};
use nexo_envelope::crypto::KeyBundle;

#[derive(Parser)]
#[command(
    name = "nexo-envelope",
    author = "Kaylee Beyene",
    version,
    about = "Secure message envelope for payment-terminal protocol messages",
    long_about = "nexo-envelope seals payment-terminal protocol messages with \
                  AES-256-CBC and HMAC-SHA256 and opens them again, carrying \
                  the MAC, nonce and key identity in a security trailer."
)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Envelope(EnvelopeCommands),

    /// Derive a new 80-byte key block from a passphrase
    DeriveKey {
        /// Read the passphrase from this environment variable instead of prompting
        #[arg(long)]
        passphrase_env: Option<String>,
    },

    /// Write default settings
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let paths = EnvelopePaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Envelope(cmd)) => {
            let keys = KeyBundle::install(KeyBundle::from_settings(&settings.key)?)?;
            handle_envelope_command(keys, &settings, cmd)?;
        }
        Some(Commands::DeriveKey { passphrase_env }) => {
            handle_derive_key(passphrase_env.as_deref())?;
        }
        Some(Commands::Init) => {
            settings.save(&paths)?;
            println!("Settings written to: {}", paths.settings_file().display());
        }
        Some(Commands::Config) => {
            println!("nexo-envelope Configuration");
            println!("===========================");
            println!("Settings file: {}", paths.settings_file().display());
            println!("Initialized:   {}", paths.is_initialized());
            println!();
            println!("Settings:");
            println!("  Encryption enabled: {}", settings.encryption_enabled);
            println!("  Crypto version:     {}", settings.crypto_version);
            println!("  Key identifier:     {}", settings.key.identifier);
            println!("  Key version:        {}", settings.key.version);
            println!("  Key source:         {}", settings.key.source.describe());
        }
        None => {
            println!("nexo-envelope - Secure envelope for payment-terminal messages");
            println!();
            println!("Run 'nexo-envelope --help' for usage information.");
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("nexo_envelope=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
