use clap::Parser;
use miette::Result;
use comply::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    // Piping into `head` and friends must end quietly instead of panicking
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
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
    let global = cli.global;
    comply::logging::init(global.verbose);

    match cli.command {
        Commands::Init(args) => commands::init::run(args, &global),
        Commands::Checklist(cmd) => commands::checklist::run(cmd, &global),
        Commands::Risk(cmd) => commands::risk::run(cmd, &global),
        Commands::Training(cmd) => commands::training::run(cmd, &global),
        Commands::Notify(cmd) => commands::notify::run(cmd, &global),
        Commands::Audit(cmd) => commands::audit::run(cmd, &global),
        Commands::Dashboard(args) => commands::dashboard::run(args, &global),
        Commands::Config(cmd) => commands::config::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
