use btcbridge::commands::{address, init, reset, Cli, Commands};
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    let filter = EnvFilter::new("info").add_directive("btcbridge=debug".parse().unwrap());
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter) // Enable log filtering through environment variable
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    match &cli.command {
        Commands::Init { network } => {
            init::execute(&cli, network.to_owned());
        }
        Commands::Address {
            pubkey,
            key_id,
            recipient_chain,
            recipient_address,
        } => {
            address::execute(&cli, pubkey, key_id, recipient_chain, recipient_address);
        }
        Commands::Reset => {
            reset::execute(&cli);
        }
    }
}
