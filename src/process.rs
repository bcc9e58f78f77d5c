// src/process.rs

//! External process invocation
//!
//! Macro evaluation, `rpmbuild` and signing all run external programs to
//! completion and capture their output. They go through [`CommandRunner`]
//! so tests can substitute canned results. Long-running builds use
//! [`CommandRunner::run_logged`], which forwards output lines to the log as
//! the program prints them.

use crate::error::{Error, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, info};

/// Captured result of a finished process
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs an external program and waits for it
pub trait CommandRunner {
    fn run(&self, workdir: &Path, program: &str, args: &[String]) -> Result<CommandOutput>;

    /// Run a program and turn a non-zero exit into [`Error::CommandFailed`]
    fn run_checked(&self, workdir: &Path, program: &str, args: &[String]) -> Result<CommandOutput> {
        let output = self.run(workdir, program, args)?;
        ensure_success(program, args, output)
    }

    /// Run a program, logging every stdout and stderr line
    ///
    /// Runners that cannot stream log the captured output once the program
    /// has exited.
    fn run_logged(&self, workdir: &Path, program: &str, args: &[String]) -> Result<CommandOutput> {
        let output = self.run(workdir, program, args)?;
        let name = program_name(program);
        for line in output.stdout.lines().chain(output.stderr.lines()) {
            info!("{}: {}", name, line);
        }
        Ok(output)
    }
}

/// Turn a non-zero exit into [`Error::CommandFailed`]
pub fn ensure_success(program: &str, args: &[String], output: CommandOutput) -> Result<CommandOutput> {
    if !output.success() {
        return Err(Error::CommandFailed {
            command: command_line(program, args),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output)
}

/// Runs programs with `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, workdir: &Path, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!("Running: {} (in {})", command_line(program, args), workdir.display());

        let output = Command::new(program)
            .args(args)
            .current_dir(workdir)
            .output()
            .map_err(|e| Error::io(workdir.join(program), e))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn run_logged(&self, workdir: &Path, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!("Running: {} (in {})", command_line(program, args), workdir.display());

        let mut child = Command::new(program)
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::io(workdir.join(program), e))?;

        let name = program_name(program);
        // stderr drains on its own thread while stdout is read here
        let stderr = child.stderr.take().map(|pipe| {
            let name = name.clone();
            thread::spawn(move || forward_lines(&name, pipe))
        });
        let stdout = child
            .stdout
            .take()
            .map(|pipe| forward_lines(&name, pipe))
            .unwrap_or_default();
        let status = child.wait().map_err(|e| Error::io(workdir.join(program), e))?;
        let stderr = stderr
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();

        Ok(CommandOutput {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Log each line read from `pipe` and return everything read
fn forward_lines(name: &str, pipe: impl Read) -> String {
    let mut collected = String::new();
    for line in BufReader::new(pipe).lines().map_while(|line| line.ok()) {
        info!("{}: {}", name, line);
        collected.push_str(&line);
        collected.push('\n');
    }
    collected
}

/// Base name of a program path, used as the log prefix
fn program_name(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| program.to_string())
}

/// Render a program and its arguments for error messages
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(|a| a.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}
