// src/installer/runner.rs

//! Running installer commands

use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, error};

/// Exit code reported when the installer binary cannot be found
pub const EXIT_NOT_FOUND: i32 = 127;

/// Exit code reported when the installer cannot be started for another reason
pub const EXIT_CANNOT_EXECUTE: i32 = 126;

/// Runs an argument vector and reports its exit code
pub trait CommandRunner {
    /// Run `argv[0]` with `argv[1..]` and return its exit code
    fn run(&self, argv: &[String]) -> i32;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, argv: &[String]) -> i32 {
        (**self).run(argv)
    }
}

/// Spawns real processes with the terminal's stdio
///
/// Package managers prompt and draw progress, so output is not captured.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> i32 {
        let Some((program, args)) = argv.split_first() else {
            error!("Refusing to run an empty command");
            return EXIT_CANNOT_EXECUTE;
        };

        debug!("Executing: {}", display_command(argv));
        match Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
        {
            Ok(status) => exit_code(status),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                error!("Command not found: {}", program);
                EXIT_NOT_FOUND
            }
            Err(e) => {
                error!("Failed to run {}: {}", program, e);
                EXIT_CANNOT_EXECUTE
            }
        }
    }
}

/// Map an exit status to a shell-style exit code (128+N for signal N)
pub fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}

/// Render an argument vector for display, single-quoting where needed
pub fn display_command(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            let plain = !arg.is_empty()
                && arg.chars().all(|c| {
                    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '=' | ':' | ',' | '+')
                });
            if plain {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', r"'\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_system_runner_exit_codes() {
        assert_eq!(SystemRunner.run(&argv(&["true"])), 0);
        assert_eq!(SystemRunner.run(&argv(&["sh", "-c", "exit 3"])), 3);
        assert_eq!(
            SystemRunner.run(&argv(&["aptpip-definitely-not-a-real-binary"])),
            EXIT_NOT_FOUND
        );
        assert_eq!(SystemRunner.run(&[]), EXIT_CANNOT_EXECUTE);
    }

    #[test]
    fn test_signal_exit_code() {
        assert_eq!(SystemRunner.run(&argv(&["sh", "-c", "kill -9 $$"])), 128 + 9);
    }

    #[test]
    fn test_display_command() {
        assert_eq!(
            display_command(&argv(&["pip3", "install", "coverage[toml]", "it's"])),
            r"pip3 install 'coverage[toml]' 'it'\''s'"
        );
        assert_eq!(display_command(&argv(&["apt", "install", "-y"])), "apt install -y");
    }
}
