//! Typed `uv` invocations.

use crate::config::UvConfig;
use pep440_rs::Version;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uvls_core::{Result, UvlsError};
use uvls_pyproject::LOCK_FILE_NAME;

/// What `uv pip compile` should upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Upgrade {
    /// `--upgrade`
    All,
    /// `--upgrade-package <name>`
    Package { name: String },
}

/// A packaging action, sent by the client as the `command` argument of
/// `uvls.buildCommand` and `uvls.runCommand`.
///
/// # Examples
///
/// ```
/// use uvls::config::UvConfig;
/// use uvls::uv::UvCommand;
///
/// let command: UvCommand = serde_json::from_str(
///     r#"{ "kind": "add", "package": "requests", "version": "2.31.0", "dev": true }"#,
/// ).unwrap();
///
/// assert_eq!(
///     command.command_line(&UvConfig::default()).unwrap(),
///     "uv add --dev requests==2.31.0"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UvCommand {
    Init {
        name: String,
    },
    /// Sync the environment, optionally limited to groups or from a requirements file.
    Sync {
        #[serde(default)]
        groups: Vec<String>,
        #[serde(default)]
        requirements: Option<String>,
    },
    Add {
        package: String,
        /// Exact version, pinned with `==`
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        extras: Vec<String>,
        #[serde(default)]
        dev: bool,
    },
    /// Add a dependency to an inline-metadata script.
    AddScript {
        script: String,
        package: String,
    },
    /// Regenerate uv.lock with `uv pip compile`.
    Compile {
        #[serde(default)]
        all_extras: bool,
        #[serde(default)]
        extras: Vec<String>,
        #[serde(default)]
        groups: Vec<String>,
        #[serde(default)]
        upgrade: Option<Upgrade>,
    },
    Lock,
    /// `uv pip install --upgrade`
    UpgradeAll,
    CacheClean,
    Venv {
        #[serde(default)]
        python: Option<String>,
    },
    Run {
        script: String,
        #[serde(default)]
        python: Option<String>,
    },
    PythonInstall {
        version: String,
    },
    PythonPin {
        version: String,
    },
    ToolInstall {
        tool: String,
    },
    /// Run a tool through `uvx`.
    ToolRun {
        tool: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl UvCommand {
    /// Executable that runs this command.
    pub fn program<'a>(&self, config: &'a UvConfig) -> &'a str {
        match self {
            Self::ToolRun { .. } => &config.uvx_executable,
            _ => &config.executable,
        }
    }

    /// Argument vector passed to [`program`](Self::program).
    ///
    /// # Errors
    ///
    /// Returns `UvlsError::InvalidCommand` when a required input is empty or
    /// looks like a flag, when an `add` version is not PEP 440, or when
    /// mutually exclusive options are combined.
    pub fn args(&self) -> Result<Vec<String>> {
        let mut args: Vec<String> = Vec::new();

        match self {
            Self::Init { name } => {
                args.push("init".into());
                args.push(required("project name", name)?);
            }
            Self::Sync {
                groups,
                requirements,
            } => {
                args.push("sync".into());
                match requirements {
                    Some(_) if !groups.is_empty() => {
                        return Err(UvlsError::InvalidCommand(
                            "sync accepts either groups or a requirements file, not both".into(),
                        ));
                    }
                    Some(file) => args.push(required("requirements file", file)?),
                    None => push_repeated(&mut args, "--group", "group", groups)?,
                }
            }
            Self::Add {
                package,
                version,
                extras,
                dev,
            } => {
                args.push("add".into());
                if *dev {
                    args.push("--dev".into());
                }
                args.push(requirement(package, extras, version.as_deref())?);
            }
            Self::AddScript { script, package } => {
                args.push("add".into());
                args.push("--script".into());
                args.push(required("script", script)?);
                args.push(required("package name", package)?);
            }
            Self::Compile {
                all_extras,
                extras,
                groups,
                upgrade,
            } => {
                if *all_extras && !extras.is_empty() {
                    return Err(UvlsError::InvalidCommand(
                        "--all-extras cannot be combined with specific extras".into(),
                    ));
                }

                args.extend(
                    ["pip", "compile", "pyproject.toml", "-o", LOCK_FILE_NAME].map(String::from),
                );
                if *all_extras {
                    args.push("--all-extras".into());
                }
                push_repeated(&mut args, "--extra", "extra", extras)?;
                push_repeated(&mut args, "--group", "group", groups)?;

                match upgrade {
                    Some(Upgrade::All) => args.push("--upgrade".into()),
                    Some(Upgrade::Package { name }) => {
                        args.push("--upgrade-package".into());
                        args.push(required("package name", name)?);
                    }
                    None => {}
                }
            }
            Self::Lock => args.push("lock".into()),
            Self::UpgradeAll => {
                args.extend(["pip", "install", "--upgrade"].map(String::from));
            }
            Self::CacheClean => args.extend(["cache", "clean"].map(String::from)),
            Self::Venv { python } => {
                args.push("venv".into());
                if let Some(python) = python {
                    args.push("--python".into());
                    args.push(required("python version", python)?);
                }
            }
            Self::Run { script, python } => {
                args.push("run".into());
                if let Some(python) = python {
                    args.push("--python".into());
                    args.push(required("python version", python)?);
                }
                args.push(required("script", script)?);
            }
            Self::PythonInstall { version } => {
                args.extend(["python", "install"].map(String::from));
                args.push(required("python version", version)?);
            }
            Self::PythonPin { version } => {
                args.extend(["python", "pin"].map(String::from));
                args.push(required("python version", version)?);
            }
            Self::ToolInstall { tool } => {
                args.extend(["tool", "install"].map(String::from));
                args.push(required("tool name", tool)?);
            }
            Self::ToolRun { tool, args: extra } => {
                args.push(required("tool name", tool)?);
                args.extend(extra.iter().cloned());
            }
        }

        Ok(args)
    }

    /// Human-readable command line, as a user would type it.
    ///
    /// Arguments containing whitespace are double-quoted.
    pub fn command_line(&self, config: &UvConfig) -> Result<String> {
        let mut parts = vec![quote(self.program(config))];
        parts.extend(self.args()?.iter().map(|arg| quote(arg)));
        Ok(parts.join(" "))
    }
}

/// Trims a required input, rejecting empty values and leading dashes.
fn required(what: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(UvlsError::InvalidCommand(format!("{what} is required")));
    }
    if value.starts_with('-') {
        return Err(UvlsError::InvalidCommand(format!(
            "{what} must not start with '-': {value}"
        )));
    }
    Ok(value.to_string())
}

fn push_repeated(args: &mut Vec<String>, flag: &str, what: &str, values: &[String]) -> Result<()> {
    for value in values {
        args.push(flag.to_string());
        args.push(required(what, value)?);
    }
    Ok(())
}

/// Builds `name[extra,...]==version`.
fn requirement(package: &str, extras: &[String], version: Option<&str>) -> Result<String> {
    let mut req = required("package name", package)?;

    if !extras.is_empty() {
        let extras = extras
            .iter()
            .map(|extra| required("extra", extra))
            .collect::<Result<Vec<_>>>()?;
        req.push('[');
        req.push_str(&extras.join(","));
        req.push(']');
    }

    if let Some(version) = version {
        let version = version.trim();
        if let Err(e) = Version::from_str(version) {
            return Err(UvlsError::InvalidCommand(format!(
                "invalid version '{version}': {e}"
            )));
        }
        req.push_str("==");
        req.push_str(version);
    }

    Ok(req)
}

fn quote(arg: &str) -> String {
    if arg.chars().any(char::is_whitespace) {
        format!("\"{arg}\"")
    } else {
        arg.to_string()
    }
}
