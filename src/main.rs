use clap::Parser;
use miette::Result;
use onboardify::cli::{logging, Cli, Commands};
use onboardify::core::Config;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let config = Config::load();
    logging::init_tracing(cli.global.verbose, config.log.as_deref());

    let mut global = cli.global;
    global.format = global.format.resolve(config.default_format.as_deref());

    match cli.command {
        Commands::Map(args) => onboardify::cli::commands::map::run(args, &global),
        Commands::Validate(args) => onboardify::cli::commands::validate::run(args, &global),
        Commands::Preview(args) => onboardify::cli::commands::preview::run(args, &global),
        Commands::Submit(args) => onboardify::cli::commands::submit::run(args, &global),
        Commands::Onboard(args) => onboardify::cli::commands::onboard::run(args, &global),
        Commands::Template(args) => onboardify::cli::commands::template::run(args),
        Commands::Completions(args) => onboardify::cli::commands::completions::run(args),
    }
}
