use std::{
    ffi::OsStr,
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Result, Write},
    path::Path,
};

use flate2::{read::MultiGzDecoder, write::GzEncoder, Compression};

fn is_gzipped(filename: &str) -> bool {
    Path::new(filename).extension() == Some(OsStr::new("gz"))
}

/// Opens `filename` for buffered reading. `-` is stdin, and a `.gz`
/// suffix means (possibly multi-member) gzip.
pub fn open_reader(filename: &str) -> Result<Box<dyn BufRead>> {
    if filename == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(filename)?;
    if is_gzipped(filename) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Opens `filename` for buffered writing, truncating it. `-` is stdout,
/// and a `.gz` suffix gzips the output.
pub fn open_writer(filename: &str) -> Result<Box<dyn Write>> {
    if filename == "-" {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    let file = File::create(filename)?;
    if is_gzipped(filename) {
        // the encoder writes the gzip trailer when dropped
        Ok(Box::new(GzEncoder::new(BufWriter::new(file), Compression::default())))
    } else {
        Ok(Box::new(BufWriter::new(file)))
    }
}
