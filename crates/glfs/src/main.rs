mod bootstrap;
mod cli;
mod paths;
mod run;

use std::process::ExitCode;

use anyhow::Result;
use paths::AppPaths;

fn main() -> Result<ExitCode> {
    let cli = cli::parse();
    run::initialise_tracing();

    let paths = AppPaths::discover()?;
    let store = bootstrap::bootstrap_filesystem(&paths)?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        data = %paths.data_dir().display(),
        share = %paths.share_dir().display(),
        "resolved glfs paths"
    );

    let report = run::execute(cli.command, &paths, &store);
    println!("{}", report.render(cli.json));

    if report.outcome.is_error() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
