use std::{
    fmt,
    path::{Path, PathBuf},
};

/// A position shared by every file registered in one [`FileSet`].
///
/// `Pos::NONE` means the node was synthesized and has no source location.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Pos(u32);

impl Pos {
    pub const NONE: Pos = Pos(0);

    pub(crate) fn new(base: u32, offset: usize) -> Self {
        Self(base + offset as u32)
    }

    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Position {
    pub filename: PathBuf,
    pub line:     usize,
    pub column:   usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename.display(), self.line, self.column)
    }
}

#[derive(Clone, Debug)]
struct File {
    name:  PathBuf,
    base:  u32,
    size:  u32,
    lines: Vec<u32>,
}

/// Position table for files parsed together.
///
/// Every file occupies the range `base..=base + size`, so positions taken from
/// different files of the same set never collide and stay comparable.
#[derive(Clone, Debug)]
pub struct FileSet {
    base:  u32,
    files: Vec<File>,
}

impl Default for FileSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSet {
    pub fn new() -> Self {
        Self {
            base:  1,
            files: Default::default(),
        }
    }

    /// Registers `source` under `name` and returns the base position of its first byte.
    pub fn add_file(&mut self, name: &Path, source: &str) -> u32 {
        let base = self.base;
        let size = source.len() as u32;
        let lines = std::iter::once(0)
            .chain(
                source
                    .bytes()
                    .enumerate()
                    .filter(|(_, b)| *b == b'\n')
                    .map(|(i, _)| i as u32 + 1),
            )
            .collect();

        self.files.push(File {
            name: name.to_path_buf(),
            base,
            size,
            lines,
        });

        // Leave one slot past the end so an EOF position belongs to its file.
        self.base = base + size + 1;

        base
    }

    pub fn position(&self, pos: Pos) -> Option<Position> {
        if !pos.is_valid() {
            return None;
        }

        let file = self
            .files
            .iter()
            .find(|file| pos.0 >= file.base && pos.0 <= file.base + file.size)?;
        let offset = pos.0 - file.base;
        let line = file.lines.partition_point(|start| *start <= offset);
        let column = offset - file.lines[line - 1] + 1;

        Some(Position {
            filename: file.name.clone(),
            line,
            column: column as usize,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
