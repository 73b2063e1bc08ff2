use std::{
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use eyre::Context as _;
use serde::Deserialize;

/// Where Go packages are looked up and where generated files go.
///
/// Every field is optional in the YAML file; [`Config::fill_from_env`] completes
/// the missing ones the same way the `go` tool does.
#[derive(Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub goroot:      Option<PathBuf>,
    pub gopath:      Vec<PathBuf>,
    /// Module roots, each containing a `go.mod`.
    pub modules:     Vec<PathBuf>,
    pub goimports:   Option<PathBuf>,
    pub output_root: Option<PathBuf>,
}

impl Config {
    pub fn from_path(path: &Path) -> Result<Self, eyre::Error> {
        serde_yml::from_reader(
            fs::OpenOptions::new()
                .read(true)
                .open(path)
                .wrap_err("failed to read config")?,
        )
        .wrap_err("failed to deserialize config")
    }

    pub fn fill_from_env(self) -> Self {
        self.fill_from(|key| env::var_os(key))
    }

    pub fn fill_from(mut self, var: impl Fn(&str) -> Option<OsString>) -> Self {
        if self.goroot.is_none() {
            self.goroot = var("GOROOT").filter(|v| !v.is_empty()).map(PathBuf::from);
        }

        if self.gopath.is_empty() {
            self.gopath = match var("GOPATH").filter(|v| !v.is_empty()) {
                | Some(gopath) => env::split_paths(&gopath).collect(),
                | None => var("HOME")
                    .map(|home| vec![PathBuf::from(home).join("go")])
                    .unwrap_or_default(),
            };
        }

        if self.goimports.is_none() {
            self.goimports = Some(PathBuf::from("goimports"));
        }

        if self.output_root.is_none() {
            self.output_root = self.gopath.first().map(|gopath| gopath.join("src"));
        }

        self
    }

    pub fn goimports(&self) -> &Path {
        self.goimports.as_deref().unwrap_or(Path::new("goimports"))
    }

    pub fn output_root(&self) -> &Path {
        self.output_root.as_deref().unwrap_or(Path::new(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill() {
        struct Case {
            config: &'static str,
            env:    &'static [(&'static str, &'static str)],
            assert: Box<dyn FnOnce(Config)>,
        }

        let cases = [
            Case {
                config: "{}",
                env:    &[("HOME", "/home/gopher")],
                assert: Box::new(|config| {
                    assert_eq!(config.goroot, None);
                    assert_eq!(config.gopath, [PathBuf::from("/home/gopher/go")]);
                    assert_eq!(config.goimports(), Path::new("goimports"));
                    assert_eq!(config.output_root(), Path::new("/home/gopher/go/src"));
                }),
            },
            Case {
                config: "{}",
                env:    &[("GOROOT", "/usr/lib/go"), ("GOPATH", "/a:/b"), ("HOME", "/home/gopher")],
                assert: Box::new(|config| {
                    assert_eq!(config.goroot.as_deref(), Some(Path::new("/usr/lib/go")));
                    assert_eq!(config.gopath, [PathBuf::from("/a"), PathBuf::from("/b")]);
                    assert_eq!(config.output_root(), Path::new("/a/src"));
                }),
            },
            Case {
                config: "gopath: [/work]\nmodules: [/src/mod]\ngoimports: /opt/bin/goimports\noutput_root: /out\n",
                env:    &[("GOPATH", "/ignored")],
                assert: Box::new(|config| {
                    assert_eq!(config.gopath, [PathBuf::from("/work")]);
                    assert_eq!(config.modules, [PathBuf::from("/src/mod")]);
                    assert_eq!(config.goimports(), Path::new("/opt/bin/goimports"));
                    assert_eq!(config.output_root(), Path::new("/out"));
                }),
            },
        ];

        for case in cases {
            let config: Config = serde_yml::from_str(case.config).unwrap();
            let env = case.env;

            (case.assert)(config.fill_from(|key| {
                env.iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| OsString::from(v))
            }));
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_yml::from_str::<Config>("gopaths: [/x]\n").is_err());
    }
}
