//! Reading files into labelled arena chunks.
//!
//! Resource loaders never own heap buffers: a file's bytes go straight into
//! an arena chunk labelled `"file loading - <path>"`, and the caller keeps
//! the returned [`FileBlob`] until the resource is unloaded.

use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use strata_arena::{ArenaAllocator, ArenaError, ArenaPtr};
use tracing::{debug, error};

/// Alignment for file payloads. Wide enough for SIMD texture decoders.
pub const FILE_ALIGNMENT: u32 = 16;

/// A file's contents inside the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileBlob {
    /// Chunk holding the bytes. Release it through the same allocator.
    pub ptr: ArenaPtr,
    /// Number of meaningful bytes; the chunk may be a few bytes longer.
    pub len: u32,
}

impl FileBlob {
    /// The file's bytes.
    ///
    /// Fails with [`ArenaError::InvalidPointer`] if `ptr` is not live or its
    /// chunk is shorter than `len`, as happens once the blob was released
    /// and the space handed out again.
    pub fn bytes<'a>(&self, arena: &'a ArenaAllocator) -> Result<&'a [u8], ArenaError> {
        arena
            .payload(self.ptr)?
            .get(..self.len as usize)
            .ok_or(ArenaError::InvalidPointer {
                offset: self.ptr.offset(),
                capacity: arena.capacity(),
            })
    }
}

/// Errors from [`load_file`].
#[derive(Debug)]
pub enum LoadError {
    /// The file could not be opened or read, or was empty.
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The file is larger than the arena can address.
    TooLarge {
        /// File that failed.
        path: PathBuf,
        /// Its size in bytes.
        size: u64,
    },
    /// The arena could not hold the file.
    Arena(ArenaError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read '{}': {source}", path.display())
            }
            Self::TooLarge { path, size } => {
                write!(f, "'{}' is too large for the arena ({size} bytes)", path.display())
            }
            Self::Arena(err) => write!(f, "arena error: {err}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Arena(err) => Some(err),
            Self::TooLarge { .. } => None,
        }
    }
}

impl From<ArenaError> for LoadError {
    fn from(err: ArenaError) -> Self {
        Self::Arena(err)
    }
}

/// Read the whole file at `path` into a fresh arena chunk.
///
/// Empty files are reported as [`LoadError::Io`] with
/// [`io::ErrorKind::UnexpectedEof`]. If reading fails after the chunk was
/// allocated, the chunk is released before the error is returned.
pub fn load_file(
    arena: &mut ArenaAllocator,
    path: impl AsRef<Path>,
) -> Result<FileBlob, LoadError> {
    let path = path.as_ref();
    let io_err = |source: io::Error| {
        error!(path = %path.display(), %source, "failed to read file");
        LoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    };

    let mut file = File::open(path).map_err(io_err)?;
    let size = file.metadata().map_err(io_err)?.len();
    if size == 0 {
        return Err(io_err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "file is empty",
        )));
    }
    let len = u32::try_from(size).map_err(|_| LoadError::TooLarge {
        path: path.to_path_buf(),
        size,
    })?;

    let label = format!("file loading - {}", path.display());
    let ptr = arena.allocate(len, FILE_ALIGNMENT, Some(&label))?;

    let read = arena
        .payload_mut(ptr)
        .map_err(LoadError::from)
        .and_then(|buf| file.read_exact(&mut buf[..len as usize]).map_err(io_err));
    if let Err(err) = read {
        if let Err(release_err) = arena.release(ptr) {
            error!(%ptr, %release_err, "failed to release chunk after read error");
        }
        return Err(err);
    }

    debug!(path = %path.display(), len, ptr = %ptr, "loaded file into arena");
    Ok(FileBlob { ptr, len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use strata_arena::ArenaConfig;

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("strata-loader-{}-{name}", std::process::id()));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn loads_file_into_labelled_chunk() {
        let path = temp_file("shader.glsl", b"void main() {}\n");
        let mut arena = ArenaAllocator::new(ArenaConfig::new(4096)).unwrap();
        let blob = load_file(&mut arena, &path).unwrap();

        assert_eq!(blob.len, 15);
        assert_eq!(blob.bytes(&arena).unwrap(), b"void main() {}\n");
        assert_eq!(arena.address_of(blob.ptr).unwrap() % 16, 0);
        let label = arena.label_of(blob.ptr).unwrap().unwrap();
        assert!(label.starts_with("file loading - "));
        assert!(label.ends_with("shader.glsl"));

        arena.release(blob.ptr).unwrap();
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn stale_blob_is_an_error_not_a_panic() {
        let path = temp_file("stale.bin", &[3u8; 200]);
        let mut arena = ArenaAllocator::new(ArenaConfig::new(4096)).unwrap();
        let blob = load_file(&mut arena, &path).unwrap();
        arena.release(blob.ptr).unwrap();
        // Likely reuses the blob's payload offset with a far shorter chunk.
        let _small = arena.allocate(8, FILE_ALIGNMENT, None).unwrap();

        let err = blob.bytes(&arena).unwrap_err();
        assert!(matches!(err, ArenaError::InvalidPointer { .. }));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn blob_longer_than_its_chunk_is_rejected() {
        let mut arena = ArenaAllocator::new(ArenaConfig::new(4096)).unwrap();
        let ptr = arena.allocate(8, FILE_ALIGNMENT, None).unwrap();
        let blob = FileBlob { ptr, len: 1000 };
        assert!(blob.bytes(&arena).is_err());
        let blob = FileBlob { ptr, len: 8 };
        assert_eq!(blob.bytes(&arena).unwrap().len(), 8);
    }

    #[test]
    fn read_failure_returns_io_error_and_frees_chunk() {
        // Opening a directory succeeds on Unix; reading it does not.
        let dir = std::env::temp_dir()
            .join(format!("strata-loader-{}-dir", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut arena = ArenaAllocator::new(ArenaConfig::new(1024 * 1024)).unwrap();
        let err = load_file(&mut arena, &dir).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }), "got {err:?}");
        assert_eq!(arena.list_chunks().unwrap().len(), 1);
        std::fs::remove_dir(dir).unwrap();
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut arena = ArenaAllocator::new(ArenaConfig::new(4096)).unwrap();
        let err = load_file(&mut arena, "/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(arena.list_chunks().unwrap().len(), 1);
    }

    #[test]
    fn empty_file_is_rejected() {
        let path = temp_file("empty.bin", b"");
        let mut arena = ArenaAllocator::new(ArenaConfig::new(4096)).unwrap();
        let err = load_file(&mut arena, &path).unwrap_err();
        match err {
            LoadError::Io { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof)
            }
            other => panic!("expected Io, got {other:?}"),
        }
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn file_larger_than_arena_is_arena_error() {
        let path = temp_file("big.bin", &[7u8; 2048]);
        let mut arena = ArenaAllocator::new(ArenaConfig::new(1024)).unwrap();
        let err = load_file(&mut arena, &path).unwrap_err();
        assert!(matches!(err, LoadError::Arena(ArenaError::OutOfMemory { .. })));
        assert_eq!(arena.list_chunks().unwrap().len(), 1);
        std::fs::remove_file(path).unwrap();
    }
}
