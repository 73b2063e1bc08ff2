use std::{
    ffi::OsString,
    fmt,
    io::{self, Write as _},
    path::PathBuf,
    process,
    string::FromUtf8Error,
};

use crate::config::Config;

/// Canonicalizes Go source and inserts the imports it is missing.
pub trait SourceFormatter: fmt::Debug {
    fn process(&self, src: &str) -> Result<String, FormatError>;
}

impl<T: SourceFormatter + ?Sized> SourceFormatter for &T {
    fn process(&self, src: &str) -> Result<String, FormatError> {
        (**self).process(src)
    }
}

impl<T: SourceFormatter + ?Sized> SourceFormatter for Box<T> {
    fn process(&self, src: &str) -> Result<String, FormatError> {
        (**self).process(src)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("failed to run {}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source:  io::Error,
    },

    #[error("failed to pipe source through the formatter")]
    Pipe(#[from] io::Error),

    #[error("{}: {stderr}", program.display())]
    Rejected { program: PathBuf, stderr: String },

    #[error("formatter produced invalid UTF-8")]
    Encoding(#[from] FromUtf8Error),
}

/// Runs the `goimports` program over stdin.
#[derive(Clone, Debug)]
pub struct GoImports {
    program: PathBuf,
    envs:    Vec<(OsString, OsString)>,
    dir:     Option<PathBuf>,
}

impl GoImports {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            envs:    Vec::new(),
            dir:     None,
        }
    }

    /// `goimports` searching the same GOROOT and GOPATH as the package loader.
    /// It runs inside the first module root, if any, so that module's packages
    /// are resolvable too.
    pub fn from_config(config: &Config) -> Self {
        let mut goimports = Self::new(config.goimports());

        if let Some(goroot) = &config.goroot {
            goimports = goimports.env("GOROOT", goroot);
        }

        if let Ok(gopath) = std::env::join_paths(&config.gopath) {
            if !gopath.is_empty() {
                goimports = goimports.env("GOPATH", gopath);
            }
        }

        if let Some(root) = config.modules.first() {
            goimports = goimports.current_dir(root);
        }

        goimports
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

impl SourceFormatter for GoImports {
    fn process(&self, src: &str) -> Result<String, FormatError> {
        let mut command = process::Command::new(&self.program);

        command.envs(self.envs.iter().map(|(k, v)| (k, v)));

        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }

        command.stdin(process::Stdio::piped());
        command.stdout(process::Stdio::piped());
        command.stderr(process::Stdio::piped());

        tracing::debug!(?command, "formatting {} bytes", src.len());

        let mut child = command.spawn().map_err(|source| FormatError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // goimports reads all of stdin before writing anything.
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(src.as_bytes()) {
                | Ok(()) => (),
                // The exit status below tells why it stopped reading.
                | Err(err) if err.kind() == io::ErrorKind::BrokenPipe => (),
                | Err(err) => return Err(err.into()),
            }
        }

        let output = child.wait_with_output()?;

        if !output.status.success() {
            return Err(FormatError::Rejected {
                program: self.program.clone(),
                stderr:  String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_fails_to_spawn() {
        let err = GoImports::new("/nonexistent/goimports")
            .process("package p\n")
            .unwrap_err();

        assert!(matches!(err, FormatError::Spawn { .. }), "{err:?}");
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_decides_acceptance() {
        // `cat` echoes the buffer back; `false` rejects everything.
        assert_eq!(GoImports::new("cat").process("package p\n").unwrap(), "package p\n");
        assert!(matches!(
            GoImports::new("false").process("package p\n"),
            Err(FormatError::Rejected { .. })
        ));
    }

    #[test]
    fn environment_follows_config() {
        let config = Config {
            goroot: Some(PathBuf::from("/usr/lib/go")),
            gopath: vec![PathBuf::from("/work")],
            modules: vec![PathBuf::from("/src/mod"), PathBuf::from("/src/other")],
            goimports: Some(PathBuf::from("/bin/goimports")),
            ..Default::default()
        };
        let goimports = GoImports::from_config(&config);

        assert_eq!(goimports.program, PathBuf::from("/bin/goimports"));
        assert_eq!(
            goimports.envs,
            [
                (OsString::from("GOROOT"), OsString::from("/usr/lib/go")),
                (OsString::from("GOPATH"), OsString::from("/work")),
            ]
        );
        assert_eq!(goimports.dir, Some(PathBuf::from("/src/mod")));
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_the_module_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let out = GoImports::new("pwd").current_dir(&root).process("").unwrap();

        assert_eq!(out.trim_end(), root.to_str().unwrap());
    }
}
