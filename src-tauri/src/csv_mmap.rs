use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::Path;

pub const MMAP_MIN_BYTES: u64 = 64 * 1024 * 1024;

/// Maps the file into memory when it is at least `threshold` bytes long.
pub fn open_mmap_if_large(path: &Path, threshold: u64) -> io::Result<Option<Mmap>> {
    let metadata = std::fs::metadata(path)?;
    if metadata.len() < threshold || metadata.len() == 0 {
        return Ok(None);
    }

    let file = File::open(path)?;
    // The mapping only lives for the duration of one read and decode.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(Some(mmap))
}

#[cfg(test)]
mod tests {
    use super::{open_mmap_if_large, MMAP_MIN_BYTES};
    use std::io::Write;

    #[test]
    fn small_files_do_not_use_mmap() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"small").expect("write file");
        file.flush().expect("flush file");

        let result = open_mmap_if_large(file.path(), MMAP_MIN_BYTES).expect("open mmap");
        assert!(result.is_none());
    }

    #[test]
    fn files_over_threshold_are_mapped() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"a,b\n1,2\n").expect("write file");
        file.flush().expect("flush file");

        let mmap = open_mmap_if_large(file.path(), 4)
            .expect("open mmap")
            .expect("mapped");
        assert_eq!(&mmap[..], b"a,b\n1,2\n");
    }
}
