use flate2::read::MultiGzDecoder;
use std::{
    fs::File,
    io::Read,
    path::Path,
};
use zoe::{define_whichever, prelude::FastaReader};

define_whichever! {
    #[doc="An enum for the different acceptable input types"]
    pub(crate) enum ReadFileZip {
        #[doc="A reader for a regular uncompressed file"]
        File(File),
        #[doc="A reader for a gzip compressed file"]
        Zipped(MultiGzDecoder<File>),
    }

    impl Read for ReadFileZip {}
}

/// If the filename ends in `gz`, the file is assumed to be zipped.
pub(crate) fn is_gz<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().extension().is_some_and(|ext| ext == "gz")
}

/// Open any input file for reading.
///
/// If it ends in `gz`, returns [`ReadFileZip::Zipped`], otherwise
/// [`ReadFileZip::File`].
///
/// ## Errors
///
/// `path` must exist and be readable.
#[inline]
pub(crate) fn open_readable<P: AsRef<Path>>(path: P) -> std::io::Result<ReadFileZip> {
    let file = File::open(&path)?;

    if is_gz(&path) {
        Ok(ReadFileZip::Zipped(MultiGzDecoder::new(file)))
    } else {
        Ok(ReadFileZip::File(file))
    }
}

/// Open a single FASTA file, gzipped or not. Returns `None` when the file
/// holds no data at all.
#[inline]
pub(crate) fn open_fasta_file<P: AsRef<Path>>(
    path: P,
) -> std::io::Result<Option<FastaReader<ReadFileZip>>> {
    let mut first_byte = [0u8; 1];
    if open_readable(&path)?.read(&mut first_byte)? == 0 {
        return Ok(None);
    }

    Ok(Some(FastaReader::new(open_readable(path)?)))
}
