//! Handing conversion results to the desktop.
//!
//! Two independent actions: put every output on the clipboard as file
//! references (one multi-item entry, production order kept) and reveal
//! the first output in the file manager. Either may fail without
//! affecting the other.
//!
//! The host is reached through a [`ScriptRunner`], which runs one OS
//! command and returns its output. [`SystemPublisher`] builds the
//! platform-specific commands on top of it.

use crate::error::{Error, Result};
use log::{debug, warn};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use url::Url;

/// Runs host automation commands.
pub trait ScriptRunner: Send + Sync {
    /// Run `program` to completion and return its standard output.
    ///
    /// When `stdin` is given it is written to the process and only the
    /// exit status is checked; the returned string is empty.
    fn run(&self, program: &str, args: &[String], stdin: Option<&str>) -> io::Result<String>;

    /// Start `program` without waiting for it.
    fn launch(&self, program: &str, args: &[String]) -> io::Result<()> {
        self.run(program, args, None).map(|_| ())
    }
}

/// [`ScriptRunner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ScriptRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], stdin: Option<&str>) -> io::Result<String> {
        debug!("running {} {:?}", program, args);
        let mut cmd = Command::new(program);
        cmd.args(args);

        let Some(input) = stdin else {
            let output = cmd.output()?;
            if !output.status.success() {
                return Err(io::Error::other(format!(
                    "{} exited with {}: {}",
                    program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        };

        // Clipboard owners such as xclip fork and keep running; holding
        // their stdout would block until the selection is replaced.
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(input.as_bytes())?;
        }
        let status = child.wait()?;
        if !status.success() {
            return Err(io::Error::other(format!("{} exited with {}", program, status)));
        }
        Ok(String::new())
    }

    fn launch(&self, program: &str, args: &[String]) -> io::Result<()> {
        debug!("launching {} {:?}", program, args);
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        std::thread::spawn(move || child.wait());
        Ok(())
    }
}

/// Exposes produced files to the user.
pub trait ResultPublisher: Send + Sync {
    /// Place all `paths` on the clipboard as one multi-file entry.
    fn publish(&self, paths: &[PathBuf]) -> Result<()>;

    /// Open the directory containing `path` in the file manager.
    fn reveal_directory(&self, path: &Path) -> Result<()>;
}

/// Desktop flavour the publisher targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// macOS: JXA via `osascript`, Finder via `open -R`
    MacOs,
    /// Linux/BSD under Wayland (`wl-copy`) or X11 (`xclip`)
    Unix {
        /// Whether a Wayland session is active
        wayland: bool,
    },
    /// Windows: PowerShell and Explorer
    Windows,
}

impl Platform {
    /// Detect the platform of the running process.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Unix {
                wayland: std::env::var_os("WAYLAND_DISPLAY").is_some(),
            }
        }
    }
}

/// Publisher that drives the OS through a [`ScriptRunner`].
#[derive(Debug, Clone)]
pub struct SystemPublisher<R = SystemRunner> {
    runner: R,
    platform: Platform,
}

impl SystemPublisher<SystemRunner> {
    /// Publisher for the current platform.
    pub fn new() -> Self {
        Self::with_runner(SystemRunner, Platform::current())
    }
}

impl Default for SystemPublisher<SystemRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ScriptRunner> SystemPublisher<R> {
    /// Publisher using `runner` for `platform`.
    pub fn with_runner(runner: R, platform: Platform) -> Self {
        Self { runner, platform }
    }

    /// The underlying runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }
}

impl<R: ScriptRunner> ResultPublisher for SystemPublisher<R> {
    fn publish(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Err(Error::Clipboard("no files to copy".into()));
        }

        match self.platform {
            Platform::MacOs => {
                let script = pasteboard_script(paths)?;
                let args = vec![
                    "-l".to_string(),
                    "JavaScript".to_string(),
                    "-e".to_string(),
                    script,
                ];
                let reply = self
                    .runner
                    .run("osascript", &args, None)
                    .map_err(|e| Error::Clipboard(e.to_string()))?;
                if reply.trim() != "ok" {
                    return Err(Error::Clipboard(format!(
                        "pasteboard rejected file references: {}",
                        reply.trim()
                    )));
                }
            }
            Platform::Unix { wayland } => {
                let payload = uri_list(paths)?;
                let (program, args): (&str, &[&str]) = if wayland {
                    ("wl-copy", &["--type", "text/uri-list"][..])
                } else {
                    ("xclip", &["-selection", "clipboard", "-t", "text/uri-list"][..])
                };
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                self.runner
                    .run(program, &args, Some(&payload))
                    .map_err(|e| Error::Clipboard(format!("{}: {}", program, e)))?;
            }
            Platform::Windows => {
                let quoted: Vec<String> = paths
                    .iter()
                    .map(|p| format!("'{}'", p.display().to_string().replace('\'', "''")))
                    .collect();
                let args = vec![
                    "-NoProfile".to_string(),
                    "-Command".to_string(),
                    format!("Set-Clipboard -LiteralPath {}", quoted.join(",")),
                ];
                self.runner
                    .run("powershell", &args, None)
                    .map_err(|e| Error::Clipboard(e.to_string()))?;
            }
        }

        debug!("copied {} file reference(s) to the clipboard", paths.len());
        Ok(())
    }

    fn reveal_directory(&self, path: &Path) -> Result<()> {
        let (program, args) = match self.platform {
            Platform::MacOs => ("open", vec!["-R".to_string(), path.display().to_string()]),
            Platform::Unix { .. } => {
                let dir = path.parent().unwrap_or(path);
                ("xdg-open", vec![dir.display().to_string()])
            }
            // Explorer wants the path as its own argument after "/select,".
            Platform::Windows => (
                "explorer",
                vec!["/select,".to_string(), path.display().to_string()],
            ),
        };
        self.runner
            .launch(program, &args)
            .map_err(|e| Error::Reveal(format!("{}: {}", program, e)))
    }
}

/// Outcome of handing a result to the desktop; each action stands alone.
#[derive(Debug)]
pub struct HandOff {
    /// Clipboard outcome, `None` if skipped
    pub clipboard: Option<Result<()>>,
    /// Reveal outcome, `None` if skipped
    pub reveal: Option<Result<()>>,
}

/// Run the clipboard and reveal actions for `paths`, as requested.
///
/// A failure in one action is logged and recorded but never stops the
/// other.
pub fn hand_off(
    publisher: &dyn ResultPublisher,
    paths: &[PathBuf],
    copy: bool,
    reveal: bool,
) -> HandOff {
    let clipboard = copy.then(|| publisher.publish(paths));
    if let Some(Err(e)) = &clipboard {
        warn!("clipboard: {}", e);
    }

    let reveal = match paths.first() {
        Some(first) if reveal => Some(publisher.reveal_directory(first)),
        _ => None,
    };
    if let Some(Err(e)) = &reveal {
        warn!("reveal: {}", e);
    }

    HandOff { clipboard, reveal }
}

fn file_uri(path: &Path) -> Result<Url> {
    Url::from_file_path(path)
        .map_err(|_| Error::Clipboard(format!("not an absolute path: {}", path.display())))
}

/// `text/uri-list` body for `paths`.
pub fn uri_list(paths: &[PathBuf]) -> Result<String> {
    let uris = paths
        .iter()
        .map(|p| file_uri(p).map(String::from))
        .collect::<Result<Vec<_>>>()?;
    Ok(uris.join("\r\n") + "\r\n")
}

/// JXA program writing `paths` to the general pasteboard as file URLs.
fn pasteboard_script(paths: &[PathBuf]) -> Result<String> {
    let list: Vec<String> = paths
        .iter()
        .map(|p| file_uri(p).map(|_| p.display().to_string()))
        .collect::<Result<_>>()?;
    let literal =
        serde_json::to_string(&list).map_err(|e| Error::Clipboard(e.to_string()))?;
    Ok(format!(
        "ObjC.import('AppKit');\n\
         const pb = $.NSPasteboard.generalPasteboard;\n\
         pb.clearContents;\n\
         const urls = {}.map(p => $.NSURL.fileURLWithPath(p));\n\
         pb.writeObjects($(urls)) ? 'ok' : 'rejected';",
        literal
    ))
}
