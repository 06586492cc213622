//! Shell completion scripts for the `subdirector` binary.

use anyhow::{Context, Result, bail};
use clap_complete::{Generator, Shell};
use std::fs;
use std::path::{Path, PathBuf};

const BIN_NAME: &str = "subdirector";

/// Render the completion script for `shell` from the live CLI definition.
pub fn render(shell: Shell) -> Result<String> {
    let mut command = crate::cli_command();
    let mut script = Vec::new();
    clap_complete::generate(shell, &mut command, BIN_NAME, &mut script);
    String::from_utf8(script).context("completion script is not valid UTF-8")
}

/// Where `install` writes when no target is given. Fish reads its own
/// completions directory; every other shell gets a file under the data dir.
pub fn default_target(shell: Shell) -> Result<PathBuf> {
    let file = shell.file_name(BIN_NAME);
    let path = match shell {
        Shell::Fish => dirs::config_dir()
            .context("no config directory for this user")?
            .join("fish")
            .join("completions")
            .join(file),
        _ => dirs::data_dir()
            .context("no data directory for this user")?
            .join(BIN_NAME)
            .join("completions")
            .join(file),
    };
    Ok(path)
}

/// Write the script for `shell`, refusing to replace an existing file unless
/// `force` is set. Returns the path written.
pub fn install(shell: Shell, target: Option<PathBuf>, force: bool) -> Result<PathBuf> {
    let target = match target {
        Some(path) => path,
        None => default_target(shell)?,
    };
    if target.exists() && !force {
        bail!("{} already exists, pass --force to overwrite", target.display());
    }

    let script = render(shell)?;
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    fs::write(&target, script)
        .with_context(|| format!("writing completion script to {}", target.display()))?;
    Ok(target)
}

/// One-line hint for loading an installed script, if the shell needs one.
pub fn activation_hint(shell: Shell, path: &Path) -> Option<String> {
    let shown = path.display();
    match shell {
        Shell::Bash => Some(format!("Add to ~/.bashrc: source \"{shown}\"")),
        Shell::Zsh => path.parent().map(|dir| {
            format!(
                "Add to ~/.zshrc before compinit: fpath=(\"{}\" $fpath)",
                dir.display()
            )
        }),
        Shell::Fish => None,
        Shell::PowerShell => Some(format!("Add to your $PROFILE: . \"{shown}\"")),
        Shell::Elvish => Some(format!("Add to rc.elv: eval (slurp < \"{shown}\")")),
        _ => None,
    }
}
