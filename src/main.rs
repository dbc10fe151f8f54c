use clap::Parser;
use lockbox::cli::commands;
use lockbox::cli::{init_logging, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::SetKey { ref key, force } => commands::set_key::execute(&cli, key, force),
        Commands::RevealKey => commands::reveal_key::execute(&cli),
        Commands::DeleteKey { force } => commands::delete_key::execute(&cli, force),
        Commands::Add { ref paths, force } => commands::add::execute(&cli, paths, force),
        Commands::Rm { ref paths } => commands::rm::execute(&cli, paths),
        Commands::Status => commands::status::execute(&cli),
        Commands::Commit => commands::commit::execute(&cli),
        Commands::Open { force } => commands::open::execute(&cli, force),
        Commands::Close { force } => commands::close::execute(&cli, force),
        Commands::Ls => commands::ls::execute(&cli),
        Commands::Globs => commands::globs::execute(&cli),
        Commands::Completions { ref shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        lockbox::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
