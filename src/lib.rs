//! # Huffman Archiver
//!
//! Static Huffman compression of text files.  The input is scanned once to build a
//! frequency table, a prefix tree is grown by greedy merging, and the input is scanned
//! again to emit the codes.  The archive carries the tree, so it can be expanded without
//! any outside information.
//!
//! The main entry points are in the `huffman` module.

mod tools;
pub mod huffman;

type DYNERR = Box<dyn std::error::Error>;

/// Codec Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("source not found: {0}")]
    SourceNotFound(String),
    #[error("symbol {0:#04x} is not in the tree")]
    SymbolNotInTree(u8),
    #[error("file format mismatch")]
    FileFormatMismatch,
    #[error("file too large")]
    FileTooLarge
}

/// Options controlling compression and expansion.
/// The chunk sizes only affect buffering, never the archive contents.
#[derive(Clone)]
pub struct Options {
    /// bytes of packed code the encoder accumulates before writing
    pub pack_chunk: usize,
    /// bytes the decoder reads from the archive at a time
    pub read_chunk: usize,
    /// bytes of decoded symbols the decoder accumulates before writing
    pub write_chunk: usize,
    /// return error if file is larger
    pub max_file_size: u64
}

pub const STD_OPTIONS: Options = Options {
    pack_chunk: 4096,
    read_chunk: 4096,
    write_chunk: 4096,
    max_file_size: u32::MAX as u64
};

/// Sizes of the data going in and coming out of an operation
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Summary {
    pub in_size: u64,
    pub out_size: u64
}

impl Summary {
    /// Size ratio of the input to the output, for compression this is the
    /// compression ratio (archive header included).  Zero if there is no output.
    pub fn ratio(&self) -> f64 {
        match self.out_size {
            0 => 0.0,
            out => self.in_size as f64 / out as f64
        }
    }
}

#[test]
fn ratio_of_sizes() {
    let sum = Summary { in_size: 10, out_size: 4 };
    assert_eq!(sum.ratio(),2.5);
    let sum = Summary { in_size: 0, out_size: 0 };
    assert_eq!(sum.ratio(),0.0);
}
