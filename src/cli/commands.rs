//! Command dispatch: one function per subcommand.

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::service_container::STDIO;
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Fix {
            file,
            output,
            keep_menus,
        } => fix(file.as_deref(), output.as_deref(), *keep_menus),
        Commands::Check { file } => check(file.as_deref()),
        Commands::Tree { file } => tree(file.as_deref()),
        Commands::Config { dir } => config_show(dir.as_deref()),
        Commands::Completion { shell } => completion(*shell),
    }
}

/// Directory whose `.prepinfo.toml` applies: the document's, or cwd for stdin.
fn document_dir(file: Option<&Path>) -> Option<PathBuf> {
    match file.filter(|p| p.as_os_str() != STDIO) {
        Some(path) => path
            .parent()
            .map(|dir| if dir.as_os_str().is_empty() { Path::new(".") } else { dir })
            .map(Path::to_path_buf),
        None => std::env::current_dir().ok(),
    }
}

fn load_settings(file: Option<&Path>) -> CliResult<Settings> {
    let settings = Settings::load(document_dir(file).as_deref())?;
    debug!(?settings, "effective settings");
    Ok(settings)
}

/// The second pass rereads the input, so writing over it would destroy it.
fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[instrument]
fn fix(file: Option<&Path>, output: Option<&Path>, keep_menus: bool) -> CliResult<()> {
    if let (Some(input), Some(out)) = (file, output) {
        if input.as_os_str() != STDIO && same_file(input, out) {
            return Err(CliError::InvalidArgs(format!(
                "output would overwrite input: {}",
                out.display()
            )));
        }
    }

    let mut settings = load_settings(file)?;
    if keep_menus {
        settings.keep_menus = true;
    }
    let container = ServiceContainer::new(settings);

    let mut source = container.open_input(file)?;
    // a failed run drops the sink, so an existing output file stays as it was
    let mut sink = container.open_output(output)?;
    let summary = container
        .restructure
        .run(&mut source, &mut sink, container.reporter.as_ref())?;
    container.commit_output(sink)?;
    debug!(?summary, "fix done");
    Ok(())
}

#[instrument]
fn check(file: Option<&Path>) -> CliResult<()> {
    let container = ServiceContainer::new(load_settings(file)?);

    let mut source = container.open_input(file)?;
    let summary = container
        .restructure
        .run(&mut source, &mut io::sink(), container.reporter.as_ref())?;

    let text = format!(
        "{} nodes, {} menu entries, {} warnings",
        summary.nodes, summary.menu_entries, summary.diagnostics
    );
    if summary.diagnostics == 0 {
        output::success(&text);
    } else {
        output::warning(&text);
    }
    Ok(())
}

#[instrument]
fn tree(file: Option<&Path>) -> CliResult<()> {
    let container = ServiceContainer::new(load_settings(file)?);

    let mut source = container.open_input(file)?;
    let linked = container.restructure.inspect(&mut source)?;
    output::info(&linked.tree.to_termtree());
    Ok(())
}

#[instrument]
fn config_show(dir: Option<&Path>) -> CliResult<()> {
    let dir = match dir {
        Some(dir) if !dir.is_dir() => {
            return Err(CliError::Usage(format!("not a directory: {}", dir.display())))
        }
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|e| CliError::Usage(e.to_string()))?,
    };
    let settings = Settings::load(Some(dir.as_path()))?;

    output::header("Config files");
    match global_config_path() {
        Some(path) => output::detail(&format!("global: {}", path.display())),
        None => output::detail("global: (no config directory)"),
    }
    output::detail(&format!("local:  {}", local_config_path(&dir).display()));
    output::header("Effective settings");
    output::info(&settings.to_toml()?);
    Ok(())
}

fn completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_dir_of_bare_file_name_is_cwd() {
        assert_eq!(
            document_dir(Some(Path::new("manual.texi"))),
            Some(PathBuf::from("."))
        );
        assert_eq!(
            document_dir(Some(Path::new("doc/manual.texi"))),
            Some(PathBuf::from("doc"))
        );
    }

    #[test]
    fn test_fix_refuses_to_overwrite_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.texi");
        std::fs::write(&path, "@node Top\n").unwrap();

        let err = fix(Some(&path), Some(&path), false).unwrap_err();

        assert!(matches!(err, CliError::InvalidArgs(_)), "{:?}", err);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "@node Top\n");
    }
}
