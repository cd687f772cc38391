//! Static Huffman Compression
//!
//! The whole input is scanned to build the frequency table, then scanned again to emit codes,
//! so the input must be seekable.  Archive layout:
//!
//! * 4 byte little endian count of expanded symbols
//! * the tree in pre-order, zero padded to a byte boundary (absent if the count is 0)
//! * the packed codes, MSB first, zero padded to a byte boundary
//!
//! If there is only one distinct symbol the tree is a single leaf and no codes are packed,
//! the count is enough to restore the data.
//!
//! Expansion stops once the count is reached, so padding bits are never taken for symbols.

use bit_vec::BitVec;
use std::io::{Cursor,Read,Write,Seek,SeekFrom,BufReader,BufWriter,ErrorKind};
use std::fs::File;
use std::path::Path;
use crate::tools::bits::{BitPacker,BitReader};
use crate::tools::huff_tree::{HuffmanTree,Walk};
pub use crate::tools::freq::FrequencyTable;
pub use crate::tools::code_table::{CodeTable,code_string};
use crate::{DYNERR,Options,Summary};

/// Decoder progress
#[derive(Debug,PartialEq)]
enum State {
    ReadingTree,
    StreamingBits,
    Done
}

/// Collects decoded symbols and writes them out `flush_size` at a time
struct OutputBuffer {
    buf: Vec<u8>,
    flush_size: usize,
    count: u64
}

impl OutputBuffer {
    fn new(flush_size: usize) -> Self {
        Self {
            buf: Vec::with_capacity(flush_size.max(1)),
            flush_size: flush_size.max(1),
            count: 0
        }
    }
    fn push<W: Write>(&mut self,symbol: u8,writer: &mut W) -> Result<(),std::io::Error> {
        self.buf.push(symbol);
        if self.buf.len() >= self.flush_size {
            self.flush(writer)?;
        }
        Ok(())
    }
    fn flush<W: Write>(&mut self,writer: &mut W) -> Result<(),std::io::Error> {
        writer.write_all(&self.buf)?;
        self.count += self.buf.len() as u64;
        self.buf.clear();
        Ok(())
    }
}

/// Frequency and code tables of some data, useful for inspecting what the coder will do
pub struct Analysis {
    pub freq: FrequencyTable,
    pub codes: CodeTable
}

/// Build the frequency and code tables for `expanded_in` without compressing anything.
pub fn analyze<R: Read>(expanded_in: &mut R) -> Result<Analysis,DYNERR> {
    let freq = FrequencyTable::scan(expanded_in)?;
    let tree = HuffmanTree::build(&freq);
    let codes = CodeTable::derive(&tree,&freq.symbols())?;
    Ok(Analysis { freq, codes })
}

/// Main compression function.
/// `expanded_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `compressed_out` is an object with the `Write` trait, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// The input is read twice, starting from the beginning each time.
pub fn compress<R,W>(expanded_in: &mut R, compressed_out: &mut W, opt: &Options) -> Result<Summary,DYNERR>
where R: Read + Seek, W: Write {
    let mut reader = BufReader::new(expanded_in);
    let mut writer = BufWriter::new(compressed_out);

    log::debug!("first pass: count symbols");
    reader.seek(SeekFrom::Start(0))?;
    let freq = FrequencyTable::scan(&mut reader)?;
    if freq.total() > opt.max_file_size || freq.total() > u32::MAX as u64 {
        return Err(Box::new(crate::Error::FileTooLarge));
    }
    let tree = HuffmanTree::build(&freq);

    log::debug!("write header");
    writer.write_all(&u32::to_le_bytes(freq.total() as u32))?;
    let mut packer = BitPacker::new(opt.pack_chunk);
    tree.put_tree(&mut packer);
    packer.finish(&mut writer)?;
    log::debug!("tree takes {} bytes",packer.count());

    if tree.leaf_count() > 1 {
        let codes = CodeTable::derive(&tree,&freq.symbols())?;
        log::debug!("second pass: pack codes");
        reader.seek(SeekFrom::Start(0))?;
        for by in reader.by_ref().bytes() {
            packer.put_code(codes.get(by?)?,&mut writer)?;
        }
        log::trace!("padding the last {} bits",packer.pending());
        packer.finish(&mut writer)?;
    } else if tree.leaf_count() == 1 {
        log::debug!("only one distinct symbol, nothing to pack");
    }
    writer.flush()?;
    let ans = Summary {
        in_size: freq.total(),
        out_size: 4 + packer.count()
    };
    log::debug!("compression ratio {}",ans.ratio());
    Ok(ans)
}

/// Main decompression function.
/// `compressed_in` is an object with the `Read` trait, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `expanded_out` is an object with the `Write` trait, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// An incomplete symbol at the end of the stream is discarded.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W, opt: &Options) -> Result<Summary,DYNERR>
where R: Read, W: Write {
    let mut reader = BufReader::new(compressed_in);
    let mut writer = BufWriter::new(expanded_out);
    let mut header: [u8;4] = [0;4];
    match reader.read_exact(&mut header) {
        Ok(()) => {},
        Err(e) if e.kind()==ErrorKind::UnexpectedEof => {
            log::error!("archive is too short for a header");
            return Err(Box::new(crate::Error::FileFormatMismatch));
        },
        Err(e) => return Err(Box::new(e))
    }
    let textsize = u32::from_le_bytes(header) as u64;
    log::debug!("archive holds {} symbols",textsize);

    let mut in_size: u64 = 4;
    let mut decoded: u64 = 0;
    let mut tree = HuffmanTree::empty();
    let mut bits = BitVec::new();
    let mut ptr: usize = 0;
    let mut chunk = vec![0;opt.read_chunk.max(1)];
    let mut obuf = OutputBuffer::new(opt.write_chunk);
    let mut state = match textsize {
        0 => State::Done,
        _ => State::ReadingTree
    };

    loop {
        match state {
            State::ReadingTree => {
                let mut tree_bits = BitReader::new();
                tree = HuffmanTree::get_tree(&mut tree_bits,&mut reader)?;
                in_size += tree_bits.count();
                log::debug!("tree has {} leaves",tree.leaf_count());
                if let (1,Some(symbol)) = (tree.leaf_count(),tree.root().and_then(|r| tree.leaf_symbol(r))) {
                    while decoded < textsize {
                        obuf.push(symbol,&mut writer)?;
                        decoded += 1;
                    }
                    state = State::Done;
                } else {
                    state = State::StreamingBits;
                }
            },
            State::StreamingBits => {
                let n = match reader.read(&mut chunk) {
                    Ok(n) => n,
                    Err(e) if e.kind()==ErrorKind::Interrupted => continue,
                    Err(e) => return Err(Box::new(e))
                };
                if n == 0 {
                    if ptr < bits.len() {
                        log::debug!("discarding {} bits of an incomplete symbol",bits.len() - ptr);
                    }
                    state = State::Done;
                    continue;
                }
                in_size += n as u64;
                bits.append(&mut BitVec::from_bytes(&chunk[0..n]));
                while decoded < textsize {
                    match tree.walk(&bits,ptr) {
                        Walk::Decoded(symbol,len) => {
                            obuf.push(symbol,&mut writer)?;
                            ptr += len;
                            decoded += 1;
                        },
                        Walk::NeedMoreBits => break,
                        Walk::Invalid => {
                            log::error!("tree cannot decode bits");
                            return Err(Box::new(crate::Error::FileFormatMismatch));
                        }
                    }
                }
                drop_leading_bits(&mut bits,ptr);
                ptr = 0;
                if decoded == textsize {
                    log::trace!("{} padding bits",bits.len());
                    let extra = std::io::copy(&mut reader,&mut std::io::sink())?;
                    if extra > 0 {
                        log::warn!("ignoring {} bytes after end of data",extra);
                    }
                    in_size += extra;
                    state = State::Done;
                }
            },
            State::Done => break
        }
    }
    obuf.flush(&mut writer)?;
    writer.flush()?;
    if decoded < textsize {
        log::warn!("archive ended after {} of {} symbols",decoded,textsize);
    }
    Ok(Summary {
        in_size,
        out_size: obuf.count
    })
}

/// keep the bit vector small, we don't need the bits behind us
fn drop_leading_bits(bits: &mut BitVec,ptr: usize) {
    if ptr == 0 {
        return;
    }
    let mut rem = BitVec::new();
    for i in ptr..bits.len() {
        rem.push(bits[i]);
    }
    *bits = rem;
}

fn open_source(path: &Path) -> Result<File,DYNERR> {
    match File::open(path) {
        Ok(f) => Ok(f),
        Err(e) if e.kind()==ErrorKind::NotFound => {
            Err(Box::new(crate::Error::SourceNotFound(path.display().to_string())))
        },
        Err(e) => Err(Box::new(e))
    }
}

/// Compress the file at `path_in` into a new file at `path_out`, which is truncated if it exists.
pub fn compress_file(path_in: &Path,path_out: &Path,opt: &Options) -> Result<Summary,DYNERR> {
    let mut in_file = open_source(path_in)?;
    let mut out_file = File::create(path_out)?;
    compress(&mut in_file,&mut out_file,opt)
}

/// Expand the archive at `path_in` into a new file at `path_out`, which is truncated if it exists.
pub fn expand_file(path_in: &Path,path_out: &Path,opt: &Options) -> Result<Summary,DYNERR> {
    let mut in_file = open_source(path_in)?;
    let mut out_file = File::create(path_out)?;
    expand(&mut in_file,&mut out_file,opt)
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

// *************** TESTS *****************

#[cfg(test)]
use crate::STD_OPTIONS;

#[test]
fn compression_works() {
    let test_data = "aabbbcccc".as_bytes();
    // count, tree 0 1'c' 0 1'a' 1'b', codes 10 10 11 11 11 0 0 0 0
    let expected = "09 00 00 00 58 D6 1B 10 AF C0";
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,hex::decode(expected.replace(" ","")).unwrap());
}

#[test]
fn invertibility() {
    let test_data = "aabbbcccc".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);

    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);

    let test_data = "Grüße, 世界\r\n".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn invertibility_all_bytes() {
    let mut test_data: Vec<u8> = Vec::new();
    for i in 0..2048 {
        test_data.push(((i * 7 + i / 3) % 256) as u8);
    }
    let compressed = compress_slice(&test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data,expanded);
}

#[test]
fn invertibility_small_chunks() {
    let mut opt = STD_OPTIONS;
    opt.pack_chunk = 1;
    opt.read_chunk = 1;
    opt.write_chunk = 3;
    let test_data = "She sells sea shells by the sea shore.\nThe shells she sells are sea shells, I'm sure.\n".as_bytes();
    let compressed = compress_slice(test_data,&opt).expect("compression failed");
    assert_eq!(compressed,compress_slice(test_data,&STD_OPTIONS).unwrap());
    let expanded = expand_slice(&compressed,&opt).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn one_distinct_symbol() {
    let test_data = "zzzz".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,hex::decode("04000000BD00").unwrap());
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn empty_input() {
    let compressed = compress_slice(&[],&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,vec![0,0,0,0]);
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert!(expanded.is_empty());
}

#[test]
fn ratio_of_skewed_input() {
    let test_data = "aaaaaaaaab".as_bytes();
    let mut src = Cursor::new(test_data);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let sum = compress(&mut src,&mut ans,&STD_OPTIONS).expect("compression failed");
    // count, tree 0 1'b' 1'a', codes 1 x9 then 0
    assert_eq!(ans.into_inner(),hex::decode("0A00000058AC20FF80").unwrap());
    assert_eq!(sum,Summary { in_size: 10, out_size: 9 });
    assert!(sum.ratio() > 1.0);
}

#[test]
fn expand_reports_sizes() {
    let compressed = hex::decode("0900000058D61B10AFC0").unwrap();
    let mut src = Cursor::new(compressed);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    let sum = expand(&mut src,&mut ans,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(sum,Summary { in_size: 10, out_size: 9 });
    assert_eq!(ans.into_inner(),"aabbbcccc".as_bytes().to_vec());
}

#[test]
fn truncated_archive() {
    // header only
    assert!(expand_slice(&hex::decode("09000000").unwrap(),&STD_OPTIONS).is_err());
    assert!(expand_slice(&hex::decode("0900").unwrap(),&STD_OPTIONS).is_err());
    // codes cut short, whatever was decoded is kept
    let expanded = expand_slice(&hex::decode("0900000058D61B10AF").unwrap(),&STD_OPTIONS).expect("expansion failed");
    assert_eq!(expanded,"aabb".as_bytes().to_vec());
}

#[test]
fn analysis_tables() {
    let mut src = Cursor::new("aabbbcccc".as_bytes());
    let analysis = analyze(&mut src).expect("analysis failed");
    assert_eq!(analysis.freq.total(),9);
    assert_eq!(analysis.freq.distinct(),3);
    let codes: Vec<(u8,String)> = analysis.codes.iter().map(|(s,c)| (s,code_string(c))).collect();
    assert_eq!(codes,vec![(b'a',"10".to_string()),(b'b',"11".to_string()),(b'c',"0".to_string())]);
}

#[test]
fn missing_source() {
    let dir = tempfile::tempdir().unwrap();
    let path_in = dir.path().join("nothing.txt");
    let path_out = dir.path().join("nothing.huf");
    let err = compress_file(&path_in,&path_out,&STD_OPTIONS).expect_err("should fail");
    assert!(matches!(err.downcast_ref::<crate::Error>(),Some(crate::Error::SourceNotFound(_))));
    assert!(!path_out.exists());
    let err = expand_file(&path_in,&path_out,&STD_OPTIONS).expect_err("should fail");
    assert!(matches!(err.downcast_ref::<crate::Error>(),Some(crate::Error::SourceNotFound(_))));
}
