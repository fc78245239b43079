use clap::Parser;
use hyprforge_installer::cli::Cli;
use hyprforge_installer::errors::InstallError;
use hyprforge_installer::logging;
use hyprforge_installer::ui::style;

fn main() {
    let cli = Cli::parse();
    logging::init_with(cli.log_file.clone());

    if let Err(err) = hyprforge_installer::run(&cli) {
        log::error!("{:#}", err);
        if InstallError::is_abort(&err) {
            eprintln!("{}", style::cancelled(&format!("{err:#}")));
        } else {
            eprintln!("{}", style::error(&format!("{err:#}")));
        }
        std::process::exit(1);
    }
}
