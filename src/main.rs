use clap::Parser;

use music_dl_lib::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    music_dl_lib::init_tracing(verbose);

    if let Err(e) = music_dl_lib::run(cli).await {
        if verbose {
            eprintln!("\nError: {:?}", e);
        } else {
            eprintln!("\nError: {:#}", e);
        }
        std::process::exit(1);
    }
}
