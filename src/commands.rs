// src/commands.rs
//! Command handler for the aptpip CLI

use crate::cli::Cli;
use anyhow::{Context, Result};
use aptpip::{
    AptCacheProber, Config, Error, InstallPlan, Installer, NameMapper, PypiClient, Requirement,
    ResolutionResult, Resolver, SystemRunner, Verbosity, interrupt, read_requirements,
};
use std::time::Instant;
use tracing::{info, warn};

/// Collect root requirements from the positional argument and `-r`
///
/// Fails before any network or subprocess work when there is nothing to do.
pub fn collect_roots(cli: &Cli) -> Result<Vec<Requirement>> {
    if cli.package_name.is_none() && cli.requirements.is_none() {
        return Err(Error::Usage(
            "no package name or requirements file given (see --help)".to_string(),
        )
        .into());
    }

    let mut roots = Vec::new();
    if let Some(name) = &cli.package_name {
        let root = Requirement::parse(name)
            .map_err(|e| Error::Usage(format!("invalid package name '{name}': {e}")))?;
        roots.push(root);
    }
    if let Some(path) = &cli.requirements {
        roots.extend(read_requirements(path)?);
    }
    Ok(roots)
}

/// Resolve and install; returns the process exit code
pub fn cmd_install(cli: &Cli) -> Result<i32> {
    let roots = collect_roots(cli)?;
    let config = Config::load_or_default(cli.config.as_deref())?;
    interrupt::install_handler()?;

    let start = Instant::now();
    let root_names: Vec<&str> = roots.iter().map(|r| r.raw.as_str()).collect();
    info!("Starting installation process for {}", root_names.join(", "));
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    if verbosity > Verbosity::Quiet {
        println!("Starting installation process for {}", root_names.join(", "));
    }

    let index = PypiClient::new(&config.index).context("Failed to set up package index client")?;
    let prober = AptCacheProber::new(&config.os);
    if !prober.is_available() {
        warn!(
            "{} not found; every package will use the fallback installer",
            config.os.query_command.join(" ")
        );
    }

    let resolver = Resolver::new(index, prober, NameMapper::new(&config.os.prefix), verbosity)
        .include_dev(cli.dev);
    let result = resolver.resolve(&roots)?;

    print_summary(&result);

    let plan = InstallPlan::from_config(&result, &config);
    let code = if plan.is_empty() {
        println!("Nothing to install.");
        0
    } else {
        let outcome = Installer::new(SystemRunner)
            .dry_run(cli.dry_run)
            .execute(&plan)?;
        outcome.exit_code()
    };

    let elapsed = start.elapsed().as_secs_f64();
    info!("Installation process completed in {:.2} seconds", elapsed);
    println!("Completed in {:.2} seconds.", elapsed);
    Ok(code)
}

fn print_summary(result: &ResolutionResult) {
    println!();
    println!("OS packages ({}):", result.os_packages.len());
    for node in &result.os_packages {
        println!("  {} <- {}", node.os_name().unwrap_or(&node.name), node.provenance_display());
    }
    println!("Fallback packages ({}):", result.fallback_packages.len());
    for node in &result.fallback_packages {
        println!("  {} <- {}", node.install_spec, node.provenance_display());
    }
    if result.stats.failed_fetches > 0 {
        println!(
            "Note: {} index lookup(s) failed; those packages were not expanded.",
            result.stats.failed_fetches
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("aptpip").chain(args.iter().copied())).unwrap()
    }

    fn usage_exit_code(err: anyhow::Error) -> i32 {
        err.downcast_ref::<Error>().map(Error::exit_code).unwrap_or(1)
    }

    #[test]
    fn test_no_roots_is_usage_error() {
        let err = collect_roots(&parse(&[])).unwrap_err();
        assert_eq!(usage_exit_code(err), aptpip::EXIT_USAGE);
    }

    #[test]
    fn test_invalid_package_is_usage_error() {
        let err = collect_roots(&parse(&["--", "-rf"])).unwrap_err();
        assert_eq!(usage_exit_code(err), aptpip::EXIT_USAGE);
    }

    #[test]
    fn test_package_and_requirements_combine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requirements.txt");
        std::fs::write(&path, "attrs\npyyaml>=5\n").unwrap();

        let cli = parse(&["gphotos-sync", "-r", path.to_str().unwrap(), "--dev"]);
        assert!(cli.dev);
        let roots = collect_roots(&cli).unwrap();
        let names: Vec<&str> = roots.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["gphotos-sync", "attrs", "pyyaml"]);
    }

    #[test]
    fn test_empty_requirements_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requirements.txt");
        std::fs::write(&path, "# nothing\n\n").unwrap();

        let err = collect_roots(&parse(&["-r", path.to_str().unwrap()])).unwrap_err();
        assert_eq!(usage_exit_code(err), aptpip::EXIT_INPUT);
    }

    #[test]
    fn test_log_file_help_says_it_replaces_stderr() {
        use clap::CommandFactory;

        let command = Cli::command();
        let arg = command
            .get_arguments()
            .find(|a| a.get_id() == "log_file")
            .unwrap();
        let help = arg.get_help().unwrap().to_string();
        assert!(help.contains("instead of stderr"), "{help}");
    }

    #[test]
    fn test_flags() {
        let cli = parse(&["--debug", "-n", "-q", "--log-file", "/tmp/x.log", "attrs"]);
        assert!(cli.debug && cli.dry_run && cli.quiet);
        assert_eq!(cli.package_name.as_deref(), Some("attrs"));
        assert_eq!(cli.log_file.unwrap().to_str(), Some("/tmp/x.log"));
    }
}
