//! Frequency model for the static Huffman coder.
//! Symbols are bytes, so the table is a fixed array of 256 counts.

use std::io::{Read,BufReader};

const NUM_SYMB: usize = 256;

/// Occurrence counts of every byte in the input, and the total.
/// Probabilities are derived on demand as count / total.
pub struct FrequencyTable {
    counts: [u64;NUM_SYMB],
    total: u64
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self {
            counts: [0;NUM_SYMB],
            total: 0
        }
    }
    /// Count every byte of `expanded_in` in one pass.
    pub fn scan<R: Read>(expanded_in: &mut R) -> Result<Self,std::io::Error> {
        let reader = BufReader::new(expanded_in);
        let mut ans = Self::new();
        for by in reader.bytes() {
            ans.count(by?);
        }
        log::debug!("scanned {} symbols, {} distinct",ans.total,ans.distinct());
        Ok(ans)
    }
    pub fn count(&mut self,symbol: u8) {
        self.counts[symbol as usize] += 1;
        self.total += 1;
    }
    pub fn count_all(&mut self,symbols: &[u8]) {
        for s in symbols {
            self.count(*s);
        }
    }
    pub fn total(&self) -> u64 {
        self.total
    }
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
    /// number of symbols that occur at least once
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|c| **c > 0).count()
    }
    pub fn get_count(&self,symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }
    /// Probability of `symbol`, zero for unseen symbols or an empty table
    pub fn probability(&self,symbol: u8) -> f64 {
        match self.total {
            0 => 0.0,
            t => self.counts[symbol as usize] as f64 / t as f64
        }
    }
    /// Observed symbols with their counts, in ascending symbol order
    pub fn counts(&self) -> impl Iterator<Item = (u8,u64)> + '_ {
        self.counts.iter().enumerate().filter(|(_,c)| **c > 0).map(|(s,c)| (s as u8,*c))
    }
    /// Observed symbols with their probabilities, in ascending symbol order
    pub fn probabilities(&self) -> impl Iterator<Item = (u8,f64)> + '_ {
        self.counts().map(move |(s,_)| (s,self.probability(s)))
    }
    /// the observed symbols, in ascending order
    pub fn symbols(&self) -> Vec<u8> {
        self.counts().map(|(s,_)| s).collect()
    }
}

#[test]
fn counts_and_probabilities() {
    let mut src = std::io::Cursor::new("aabbbcccc".as_bytes());
    let freq = FrequencyTable::scan(&mut src).expect("scan failed");
    assert_eq!(freq.total(),9);
    assert_eq!(freq.distinct(),3);
    assert_eq!(freq.get_count(b'c'),4);
    assert_eq!(freq.probability(b'a'),2.0/9.0);
    assert_eq!(freq.probability(b'b'),3.0/9.0);
    assert_eq!(freq.probability(b'z'),0.0);
    assert_eq!(freq.symbols(),vec![b'a',b'b',b'c']);
}

#[test]
fn probabilities_sum_to_one() {
    let mut freq = FrequencyTable::new();
    freq.count_all("It was the best of times, it was the worst of times.\n".as_bytes());
    let sum: f64 = freq.probabilities().map(|(_,p)| p).sum();
    assert!((sum - 1.0).abs() < 1e-9);
}

#[test]
fn empty_input() {
    let mut src = std::io::Cursor::new(Vec::<u8>::new());
    let freq = FrequencyTable::scan(&mut src).expect("scan failed");
    assert!(freq.is_empty());
    assert_eq!(freq.distinct(),0);
    assert_eq!(freq.probabilities().count(),0);
}
