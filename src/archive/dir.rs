// src/archive/dir.rs
// =============================================================================
// A directory-backed archive.
//
// Layout of an archive directory:
//   content/**      one content item per file (path relative to content/)
//   redirects.tsv   one redirect per line: path<TAB>title<TAB>target
//   metadata/<Name> one metadata value per file
//   mainpage        first line holds the path of the main page
//   checksum        optional hex CRC-32 over every item
//
// Item payloads are read lazily: opening only records paths and sizes, so a
// file that disappears or changes after opening shows up as a per-entry
// fault or an integrity failure, not as a crash.
//
// Rust concepts:
// - BTreeMap: Sorted map, gives us the canonical (lexicographic) entry order
// - walkdir: Recursive directory traversal
// - ? operator: Propagates errors to the caller
// =============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use super::{Archive, ArchiveError, Entry, EntryKind};

const CONTENT_DIR: &str = "content";
const METADATA_DIR: &str = "metadata";
const REDIRECTS_FILE: &str = "redirects.tsv";
const MAINPAGE_FILE: &str = "mainpage";
const CHECKSUM_FILE: &str = "checksum";

const DEFAULT_MIMETYPE: &str = "application/octet-stream";

// File extension -> mimetype, matched case-insensitively
const EXTENSION_MIMETYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("png", "image/png"),
    ("tiff", "image/tiff"),
    ("tif", "image/tiff"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("txt", "text/plain"),
    ("xml", "text/xml"),
    ("epub", "application/epub+zip"),
    ("pdf", "application/pdf"),
    ("ogg", "audio/ogg"),
    ("ogv", "video/ogg"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("css", "text/css"),
    ("otf", "font/otf"),
    ("sfnt", "font/sfnt"),
    ("eot", "application/vnd.ms-fontobject"),
    ("ttf", "font/ttf"),
    ("collection", "font/collection"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("vtt", "text/vtt"),
    ("webm", "video/webm"),
    ("webp", "image/webp"),
    ("mp4", "video/mp4"),
    ("doc", "application/msword"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("zip", "application/zip"),
    ("wasm", "application/wasm"),
];

// Guesses the mimetype of an entry from its file extension
pub fn mimetype_for_path(path: &str) -> &'static str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let Some((_, extension)) = file_name.rsplit_once('.') else {
        return DEFAULT_MIMETYPE;
    };
    let extension = extension.to_ascii_lowercase();

    EXTENSION_MIMETYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mimetype)| *mimetype)
        .unwrap_or(DEFAULT_MIMETYPE)
}

#[derive(Debug, Clone)]
struct ItemFile {
    file: PathBuf,
    size: u64,
}

#[derive(Debug)]
pub struct DirArchive {
    root: PathBuf,
    items: BTreeMap<String, ItemFile>,
    redirects: BTreeMap<String, String>,
    metadata: BTreeMap<String, PathBuf>,
    main_entry: Option<String>,
    checksum: Option<String>,
}

impl DirArchive {
    /// Opens the archive directory at `root`.
    ///
    /// Fails if `root/content` is missing, if `redirects.tsv` is malformed,
    /// or if a redirect path collides with a content item.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let root = root.as_ref().to_path_buf();
        let content_dir = root.join(CONTENT_DIR);
        if !content_dir.is_dir() {
            return Err(ArchiveError::InvalidLayout(format!(
                "{} has no {}/ directory",
                root.display(),
                CONTENT_DIR
            )));
        }

        let items = scan_content(&content_dir)?;
        let redirects = read_redirects(&root.join(REDIRECTS_FILE), &items)?;
        let metadata = scan_metadata(&root.join(METADATA_DIR))?;
        let main_entry = read_first_line(&root.join(MAINPAGE_FILE))?;
        let checksum = read_first_line(&root.join(CHECKSUM_FILE))?
            .map(|value| value.to_ascii_lowercase());

        debug!(
            "Opened {}: {} items, {} redirects, {} metadata values",
            root.display(),
            items.len(),
            redirects.len(),
            metadata.len()
        );

        Ok(DirArchive {
            root,
            items,
            redirects,
            metadata,
            main_entry,
            checksum,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // CRC-32 over every item in canonical order: path, NUL, payload
    fn compute_checksum(&self) -> Result<String, ArchiveError> {
        let mut hasher = crc32fast::Hasher::new();
        for (path, item) in &self.items {
            let data = fs::read(&item.file)?;
            hasher.update(path.as_bytes());
            hasher.update(&[0]);
            hasher.update(&data);
        }
        Ok(format!("{:08x}", hasher.finalize()))
    }
}

impl Archive for DirArchive {
    fn entry_count(&self) -> usize {
        self.items.len() + self.redirects.len()
    }

    fn paths(&self) -> Result<Vec<String>, ArchiveError> {
        let mut paths: Vec<String> = self
            .items
            .keys()
            .chain(self.redirects.keys())
            .cloned()
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn entry(&self, path: &str) -> Result<Entry, ArchiveError> {
        if let Some(item) = self.items.get(path) {
            let data = fs::read(&item.file)?;
            return Ok(Entry {
                path: path.to_string(),
                mimetype: mimetype_for_path(path).to_string(),
                kind: EntryKind::Item(data),
            });
        }

        match self.redirects.get(path) {
            Some(target) => Ok(Entry {
                path: path.to_string(),
                mimetype: String::new(),
                kind: EntryKind::Redirect(target.clone()),
            }),
            None => Err(ArchiveError::EntryNotFound(path.to_string())),
        }
    }

    fn has_entry(&self, path: &str) -> bool {
        self.items.contains_key(path) || self.redirects.contains_key(path)
    }

    fn main_entry(&self) -> Option<String> {
        self.main_entry.clone()
    }

    fn metadata_keys(&self) -> Vec<String> {
        self.metadata.keys().cloned().collect()
    }

    fn metadata(&self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        match self.metadata.get(name) {
            Some(file) => Ok(fs::read(file)?),
            None => Err(ArchiveError::EntryNotFound(format!("metadata/{}", name))),
        }
    }

    fn checksum(&self) -> Option<String> {
        self.checksum.clone()
    }

    fn verify_checksum(&self) -> Result<bool, ArchiveError> {
        match &self.checksum {
            Some(recorded) => Ok(*recorded == self.compute_checksum()?),
            None => Ok(false),
        }
    }

    fn check_integrity(&self) -> Result<(), ArchiveError> {
        for (path, target) in &self.redirects {
            if !self.has_entry(target) {
                return Err(ArchiveError::Corrupted(format!(
                    "redirect {} points to missing entry {}",
                    path, target
                )));
            }
        }

        for (path, item) in &self.items {
            let size = fs::metadata(&item.file)
                .map_err(|e| ArchiveError::Corrupted(format!("item {} is unreadable: {}", path, e)))?
                .len();
            if size != item.size {
                return Err(ArchiveError::Corrupted(format!(
                    "item {} changed size ({} -> {} bytes)",
                    path, item.size, size
                )));
            }
        }

        Ok(())
    }
}

// Collects every regular file under content/, keyed by its archive path
fn scan_content(content_dir: &Path) -> Result<BTreeMap<String, ItemFile>, ArchiveError> {
    let mut items = BTreeMap::new();

    for entry in WalkDir::new(content_dir).follow_links(false) {
        let entry = entry.map_err(|e| ArchiveError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(content_dir)
            .map_err(|e| ArchiveError::InvalidLayout(e.to_string()))?;
        let path = relative.to_str().ok_or_else(|| {
            ArchiveError::InvalidLayout(format!("non UTF-8 file name: {}", relative.display()))
        })?;
        let path = path.replace('\\', "/");

        let size = entry.metadata().map_err(|e| ArchiveError::Io(e.into()))?.len();
        items.insert(
            path,
            ItemFile {
                file: entry.into_path(),
                size,
            },
        );
    }

    Ok(items)
}

// Parses redirects.tsv; a missing file means "no redirects"
fn read_redirects(
    file: &Path,
    items: &BTreeMap<String, ItemFile>,
) -> Result<BTreeMap<String, String>, ArchiveError> {
    let mut redirects = BTreeMap::new();
    if !file.is_file() {
        return Ok(redirects);
    }

    let text = fs::read_to_string(file)?;
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let [path, _title, target] = fields.as_slice() else {
            return Err(ArchiveError::InvalidLayout(format!(
                "{} line {}: expected 3 tab-separated fields, got {}",
                REDIRECTS_FILE,
                index + 1,
                fields.len()
            )));
        };

        if items.contains_key(*path) {
            return Err(ArchiveError::InvalidLayout(format!(
                "{} line {}: redirect {} collides with a content item",
                REDIRECTS_FILE,
                index + 1,
                path
            )));
        }
        redirects.insert(path.to_string(), target.to_string());
    }

    Ok(redirects)
}

fn scan_metadata(dir: &Path) -> Result<BTreeMap<String, PathBuf>, ArchiveError> {
    let mut metadata = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(metadata);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            metadata.insert(name.to_string(), entry.path());
        }
    }

    Ok(metadata)
}

fn read_first_line(file: &Path) -> Result<Option<String>, ArchiveError> {
    if !file.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(file)?;
    Ok(text
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, data: &[u8]) {
        let file = root.join(relative);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, data).unwrap();
    }

    fn sample_archive() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "content/index.html", b"<a href=\"wiki/A.html\">A</a>");
        write(root, "content/wiki/A.html", b"<p>A</p>");
        write(root, "content/img/logo.PNG", b"\x89PNG");
        write(root, "redirects.tsv", b"home\tHome\tindex.html\n\nold/A\tA\twiki/A.html\n");
        write(root, "metadata/Title", b"Sample");
        write(root, "mainpage", b"index.html\n");
        dir
    }

    #[test]
    fn test_mimetype_for_path() {
        assert_eq!(mimetype_for_path("a/b.html"), "text/html");
        assert_eq!(mimetype_for_path("a/b.HTM"), "text/html");
        assert_eq!(mimetype_for_path("style.css"), "text/css");
        assert_eq!(mimetype_for_path("dir.v2/noext"), DEFAULT_MIMETYPE);
        assert_eq!(mimetype_for_path("archive.unknown"), DEFAULT_MIMETYPE);
    }

    #[test]
    fn test_open_reads_layout() {
        let dir = sample_archive();
        let archive = DirArchive::open(dir.path()).unwrap();

        assert_eq!(archive.entry_count(), 5);
        assert_eq!(
            archive.paths().unwrap(),
            vec!["home", "img/logo.PNG", "index.html", "old/A", "wiki/A.html"]
        );
        assert_eq!(archive.main_entry().as_deref(), Some("index.html"));
        assert_eq!(archive.metadata_keys(), vec!["Title"]);
        assert_eq!(archive.metadata("Title").unwrap(), b"Sample");
        assert!(archive.checksum().is_none());

        let entry = archive.entry("img/logo.PNG").unwrap();
        assert_eq!(entry.mimetype, "image/png");
        assert_eq!(entry.data(), Some(&b"\x89PNG"[..]));

        let redirect = archive.entry("old/A").unwrap();
        assert_eq!(redirect.redirect_target(), Some("wiki/A.html"));

        assert!(matches!(
            archive.entry("missing"),
            Err(ArchiveError::EntryNotFound(_))
        ));
        assert!(archive.check_integrity().is_ok());
    }

    #[test]
    fn test_open_requires_content_dir() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            DirArchive::open(dir.path()),
            Err(ArchiveError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_malformed_redirect_line_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "content/a.html", b"a");
        write(dir.path(), "redirects.tsv", b"b\ta.html\n");
        assert!(matches!(
            DirArchive::open(dir.path()),
            Err(ArchiveError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_redirect_colliding_with_item_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "content/a.html", b"a");
        write(dir.path(), "redirects.tsv", b"a.html\tA\tb.html\n");
        assert!(DirArchive::open(dir.path()).is_err());
    }

    #[test]
    fn test_integrity_detects_dangling_redirect() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "content/a.html", b"a");
        write(dir.path(), "redirects.tsv", b"b\tB\tnowhere.html\n");
        let archive = DirArchive::open(dir.path()).unwrap();
        assert!(matches!(
            archive.check_integrity(),
            Err(ArchiveError::Corrupted(_))
        ));
    }

    #[test]
    fn test_checksum_roundtrip() {
        let dir = sample_archive();
        let expected = DirArchive::open(dir.path())
            .unwrap()
            .compute_checksum()
            .unwrap();

        write(dir.path(), "checksum", expected.to_uppercase().as_bytes());
        let archive = DirArchive::open(dir.path()).unwrap();
        assert_eq!(archive.checksum(), Some(expected));
        assert!(archive.verify_checksum().unwrap());

        write(dir.path(), "content/wiki/A.html", b"<p>changed</p>");
        assert!(!archive.verify_checksum().unwrap());
    }
}
