use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// Named text entry inside a checkpoint archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    Model,
    Assignment,
    Bill,
    Author,
    Lexical,
}

impl SegmentKind {
    pub fn name(self) -> &'static str {
        match self {
            SegmentKind::Model => "model",
            SegmentKind::Assignment => "assignment",
            SegmentKind::Bill => "bill",
            SegmentKind::Author => "author",
            SegmentKind::Lexical => "lexical",
        }
    }

    pub fn extension(self) -> String {
        format!(".{}", self.name())
    }
}

/// Entry names are `{stem}.{segment}`, the stem being the archive's file
/// stem (`iter-40` for `iter-40.zip`).
pub fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state".to_string())
}

pub fn write(path: &Path, segments: &[(SegmentKind, String)]) -> Result<()> {
    let archive_err = |source| Error::Archive {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(|e| Error::io("create checkpoint", path, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stem = stem(path);
    for (kind, content) in segments {
        zip.start_file(format!("{}{}", stem, kind.extension()), options)
            .map_err(archive_err)?;
        zip.write_all(content.as_bytes())
            .map_err(|e| Error::io("write checkpoint", path, e))?;
    }
    zip.finish().map_err(archive_err)?;
    Ok(())
}

/// Every entry of an archive, read eagerly.
#[derive(Debug)]
pub struct Archive {
    entries: Vec<(String, String)>,
}

impl Archive {
    pub fn open(path: &Path) -> Result<Self> {
        let archive_err = |source| Error::Archive {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(|e| Error::io("open checkpoint", path, e))?;
        let mut zip = ZipArchive::new(file).map_err(archive_err)?;
        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(archive_err)?;
            let name = entry.name().to_string();
            let mut content = String::new();
            entry
                .read_to_string(&mut content)
                .map_err(|e| Error::io("read checkpoint entry", path, e))?;
            entries.push((name, content));
        }
        Ok(Self { entries })
    }

    /// Entry whose name ends with the segment's extension, if any.
    pub fn find(&self, kind: SegmentKind) -> Option<&str> {
        let ext = kind.extension();
        self.entries
            .iter()
            .find(|(name, _)| name.ends_with(&ext))
            .map(|(_, content)| content.as_str())
    }

    pub fn segment(&self, kind: SegmentKind) -> Result<&str> {
        self.find(kind).ok_or(Error::MissingSegment {
            segment: kind.name(),
        })
    }
}
