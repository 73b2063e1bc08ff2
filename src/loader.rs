use std::{
    env,
    fs,
    path::{Path, PathBuf},
};

use testgen_gosyntax::{
    ast::{File, TypeSpec},
    file_constraint,
    parse_file,
    FileSet,
};
use walkdir::WalkDir;

use crate::{config::Config, Error};

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// Operating systems satisfying the `unix` build tag.
const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// Maps import paths to package directories.
#[derive(Clone, Debug)]
pub struct PackageResolver<'c> {
    config: &'c Config,
    goos:   &'static str,
    goarch: &'static str,
}

/// The parsed, buildable files of one package directory.
#[derive(Debug)]
pub struct LoadedPackage {
    /// Package clause name, used to qualify identifiers declared here.
    pub name:        String,
    pub import_path: String,
    pub dir:         PathBuf,
    pub files:       Vec<File>,
    pub fset:        FileSet,
}

impl<'c> PackageResolver<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            goos: host_os(),
            goarch: host_arch(),
        }
    }

    /// Candidate directories in lookup order: GOROOT, module roots, GOPATH.
    fn candidates(&self, import_path: &str) -> Vec<PathBuf> {
        let mut dirs = Vec::new();

        if let Some(goroot) = &self.config.goroot {
            dirs.push(goroot.join("src").join(import_path));
        }

        for root in &self.config.modules {
            let Some(module) = module_path(root) else {
                tracing::warn!(root = %root.display(), "no module line in go.mod");

                continue;
            };

            if import_path == module {
                dirs.push(root.clone());
            } else if let Some(rest) = import_path
                .strip_prefix(module.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
            {
                dirs.push(root.join(rest));
            }
        }

        for gopath in &self.config.gopath {
            dirs.push(gopath.join("src").join(import_path));
        }

        dirs
    }

    /// The first candidate directory with buildable files, and those files'
    /// paths and sources.
    pub fn find(&self, import_path: &str) -> Result<(PathBuf, Vec<(PathBuf, String)>), Error> {
        for dir in self.candidates(import_path) {
            if !dir.is_dir() {
                continue;
            }

            let files = self.buildable_files(&dir);

            if files.is_empty() {
                tracing::debug!(dir = %dir.display(), "no buildable Go files");

                continue;
            }

            return Ok((dir, files));
        }

        Err(Error::PackageNotFound {
            import_path: import_path.to_string(),
        })
    }

    /// Parses the package at `import_path`. Files that cannot be parsed, or
    /// that belong to another package, are skipped.
    pub fn load(&self, import_path: &str) -> Result<LoadedPackage, Error> {
        let (dir, sources) = self.find(import_path)?;
        let mut fset = FileSet::new();
        let mut files: Vec<File> = Vec::with_capacity(sources.len());

        for (path, source) in sources {
            let file = match parse_file(&mut fset, &path, &source) {
                | Ok(file) => file,
                | Err(err) => {
                    tracing::warn!("skipping file: {err}");

                    continue;
                },
            };

            if let Some(first) = files.first() {
                if first.package.name != file.package.name {
                    tracing::warn!(
                        path = %path.display(),
                        "skipping file of package {}, expected {}",
                        file.package.name,
                        first.package.name
                    );

                    continue;
                }
            }

            files.push(file);
        }

        let name = match files.first() {
            | Some(file) => file.package.name.clone(),
            | None => import_path.rsplit('/').next().unwrap_or(import_path).to_string(),
        };

        tracing::debug!(import_path, dir = %dir.display(), files = files.len(), "loaded package {name}");

        Ok(LoadedPackage {
            name,
            import_path: import_path.to_string(),
            dir,
            files,
            fset,
        })
    }

    /// Reads the files of `dir` that pass the name rules and whose build
    /// constraint holds for the target platform.
    fn buildable_files(&self, dir: &Path) -> Vec<(PathBuf, String)> {
        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                let keep = self.is_buildable(path);

                if !keep {
                    tracing::trace!(path = %path.display(), "excluded by name");
                }

                keep
            })
            .filter_map(|path| match fs::read_to_string(&path) {
                | Ok(source) => Some((path, source)),
                | Err(err) => {
                    tracing::warn!(path = %path.display(), "skipping unreadable file: {err}");

                    None
                },
            })
            .filter(|(path, source)| self.satisfies_constraint(path, source))
            .collect()
    }

    fn is_buildable(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        let Some(stem) = name.strip_suffix(".go") else {
            return false;
        };

        if stem.ends_with("_test") || name.starts_with('_') || name.starts_with('.') {
            return false;
        }

        self.matches_platform(stem)
    }

    /// Evaluates the `//go:build` or `// +build` header of `source`.
    fn satisfies_constraint(&self, path: &Path, source: &str) -> bool {
        match file_constraint(source) {
            | Ok(None) => true,
            | Ok(Some(constraint)) => {
                let keep = constraint.eval(&mut |tag| self.has_tag(tag));

                if !keep {
                    tracing::trace!(path = %path.display(), "excluded by build constraint");
                }

                keep
            },
            | Err(err) => {
                tracing::warn!(path = %path.display(), "skipping file: {err}");

                false
            },
        }
    }

    /// Whether a build tag holds for the target platform. Compiler, cgo and
    /// every `go1.N` release tag are assumed to hold.
    fn has_tag(&self, tag: &str) -> bool {
        match tag {
            | tag if tag == self.goos || tag == self.goarch => true,
            | "unix" => UNIX_OS.contains(&self.goos),
            | "linux" => self.goos == "android",
            | "darwin" => self.goos == "ios",
            | "solaris" => self.goos == "illumos",
            | "gc" | "cgo" => true,
            | tag => tag
                .strip_prefix("go1.")
                .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit())),
        }
    }

    /// Applies the `*_GOOS`, `*_GOARCH` and `*_GOOS_GOARCH` file name rules.
    fn matches_platform(&self, stem: &str) -> bool {
        let parts = stem.split('_').collect::<Vec<_>>();

        if parts.len() < 2 {
            return true;
        }

        let last = parts[parts.len() - 1];
        let prev = parts[parts.len() - 2];

        if parts.len() >= 3 && KNOWN_OS.contains(&prev) && KNOWN_ARCH.contains(&last) {
            return prev == self.goos && last == self.goarch;
        }

        if KNOWN_OS.contains(&last) {
            return last == self.goos;
        }

        if KNOWN_ARCH.contains(&last) {
            return last == self.goarch;
        }

        true
    }
}

impl LoadedPackage {
    /// Finds the type declaration named `id` and the file declaring it.
    pub fn lookup(&self, id: &str) -> Option<(&File, &TypeSpec)> {
        let found = self.files.iter().find_map(|file| {
            file.type_specs()
                .find(|spec| spec.name.name == id)
                .map(|spec| (file, spec))
        });

        if let Some((_, spec)) = found {
            if let Some(position) = self.fset.position(spec.name.pos) {
                tracing::debug!(dir = %self.dir.display(), "found {}.{id} at {position}", self.name);
            }
        }

        found
    }
}

/// The `module` path declared by `<root>/go.mod`.
fn module_path(root: &Path) -> Option<String> {
    let gomod = fs::read_to_string(root.join("go.mod")).ok()?;

    gomod.lines().find_map(|line| {
        let path = line.trim().strip_prefix("module")?;

        if !path.starts_with(char::is_whitespace) {
            return None;
        }

        let path = path.split("//").next()?.trim().trim_matches('"');

        (!path.is_empty()).then(|| path.to_string())
    })
}

fn host_os() -> &'static str {
    match env::consts::OS {
        | "macos" => "darwin",
        | os => os,
    }
}

fn host_arch() -> &'static str {
    match env::consts::ARCH {
        | "x86" => "386",
        | "x86_64" => "amd64",
        | "aarch64" => "arm64",
        | "powerpc" => "ppc",
        | "powerpc64" => "ppc64",
        | "wasm32" => "wasm",
        | arch => arch,
    }
}
