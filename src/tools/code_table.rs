//! Symbol to code mapping derived from a `HuffmanTree`.

use bit_vec::BitVec;
use crate::tools::huff_tree::HuffmanTree;
use crate::Error;

const NUM_SYMB: usize = 256;

pub struct CodeTable {
    codes: Vec<Option<BitVec>>
}

impl CodeTable {
    /// Find the code of each symbol in `symbols` by descending from the root,
    /// going left (0) whenever the left son's label holds the symbol, right (1) otherwise.
    /// A tree consisting of a single leaf gives that symbol an empty code.
    pub fn derive(tree: &HuffmanTree,symbols: &[u8]) -> Result<Self,Error> {
        let mut codes = vec![None;NUM_SYMB];
        for symbol in symbols {
            let mut curs = match tree.root() {
                Some(r) if tree.contains(r,*symbol) => r,
                _ => return Err(Error::SymbolNotInTree(*symbol))
            };
            let mut code = BitVec::new();
            while let Some((left,right)) = tree.sons(curs) {
                if tree.contains(left,*symbol) {
                    code.push(false);
                    curs = left;
                } else {
                    code.push(true);
                    curs = right;
                }
            }
            log::trace!("code for {:#04x} is {}",symbol,code_string(&code));
            codes[*symbol as usize] = Some(code);
        }
        Ok(Self { codes })
    }
    pub fn get(&self,symbol: u8) -> Result<&BitVec,Error> {
        match &self.codes[symbol as usize] {
            Some(code) => Ok(code),
            None => Err(Error::SymbolNotInTree(symbol))
        }
    }
    /// symbols that have a code, with the code, in ascending symbol order
    pub fn iter(&self) -> impl Iterator<Item = (u8,&BitVec)> + '_ {
        self.codes.iter().enumerate().filter_map(|(s,c)| c.as_ref().map(|code| (s as u8,code)))
    }
    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

/// code as a string of 0 and 1
pub fn code_string(code: &BitVec) -> String {
    code.iter().map(|b| if b { '1' } else { '0' }).collect()
}

#[cfg(test)]
fn table_for(txt: &str) -> CodeTable {
    let mut freq = crate::tools::freq::FrequencyTable::new();
    freq.count_all(txt.as_bytes());
    let tree = HuffmanTree::build(&freq);
    CodeTable::derive(&tree,&freq.symbols()).expect("derive failed")
}

#[test]
fn codes_follow_weights() {
    let table = table_for("aabbbcccc");
    assert_eq!(code_string(table.get(b'c').unwrap()),"0");
    assert_eq!(code_string(table.get(b'a').unwrap()),"10");
    assert_eq!(code_string(table.get(b'b').unwrap()),"11");
    assert_eq!(table.len(),3);
    assert!(table.get(b'd').is_err());
}

#[test]
fn prefix_free() {
    let table = table_for("Now is the winter of our discontent\nMade glorious summer by this sun of York;\n");
    let codes: Vec<String> = table.iter().map(|(_,c)| code_string(c)).collect();
    assert!(codes.len() > 2);
    for i in 0..codes.len() {
        assert!(!codes[i].is_empty());
        for j in 0..codes.len() {
            if i != j {
                assert!(!codes[j].starts_with(&codes[i]),"{} is a prefix of {}",codes[i],codes[j]);
            }
        }
    }
}

#[test]
fn missing_symbol() {
    let mut freq = crate::tools::freq::FrequencyTable::new();
    freq.count_all("abc".as_bytes());
    let tree = HuffmanTree::build(&freq);
    match CodeTable::derive(&tree,&[b'a',b'x']) {
        Err(Error::SymbolNotInTree(s)) => assert_eq!(s,b'x'),
        _ => panic!("expected SymbolNotInTree")
    }
    assert!(CodeTable::derive(&HuffmanTree::empty(),&[b'a']).is_err());
}
