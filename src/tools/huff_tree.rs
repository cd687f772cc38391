//! Static Huffman tree.
//!
//! Nodes live in a pool and refer to each other by index.  Children are always
//! created before their parent, so the root is the last node in the pool.
//! Every branch carries the set of symbols beneath it (its label), which is
//! what the code table uses to decide which way to descend.

use bit_vec::BitVec;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io::Read;
use crate::tools::bits::{BitPacker,BitReader};
use crate::tools::freq::FrequencyTable;
use crate::DYNERR;

const NUM_SYMB: usize = 256;

enum Node {
    Leaf(u8),
    Branch {
        left: usize,
        right: usize,
        /// symbols reachable beneath this node, indexed by symbol value
        label: BitVec
    }
}

/// Result of walking the tree from the root against a run of bits
#[derive(Debug,PartialEq)]
pub enum Walk {
    /// reached a leaf, gives the symbol and the number of bits consumed
    Decoded(u8,usize),
    /// ran out of bits before reaching a leaf
    NeedMoreBits,
    /// the tree has no branches, no bits can be decoded
    Invalid
}

pub struct HuffmanTree {
    nodes: Vec<Node>
}

impl HuffmanTree {
    /// tree with no nodes, stands in for the tree of an empty input
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new()
        }
    }
    /// Build the tree by repeatedly merging the two lightest nodes.
    /// The weights are the symbol counts.  Equal weights are taken in order of creation,
    /// leaves (in ascending symbol order) come before any branch, and the first node
    /// taken becomes the left son.
    pub fn build(freq: &FrequencyTable) -> Self {
        let mut tree = Self::empty();
        let mut heap = BinaryHeap::new();
        for (symbol,count) in freq.counts() {
            let idx = tree.push_leaf(symbol);
            heap.push(Reverse((count,idx)));
        }
        loop {
            let Some(Reverse((w1,left))) = heap.pop() else { break };
            let Some(Reverse((w2,right))) = heap.pop() else { break };
            let idx = tree.push_branch(left,right);
            log::trace!("merge {} ({}) with {} ({}) into {}",left,w1,right,w2,idx);
            heap.push(Reverse((w1 + w2,idx)));
        }
        log::debug!("tree has {} nodes",tree.nodes.len());
        tree
    }
    fn push_leaf(&mut self,symbol: u8) -> usize {
        self.nodes.push(Node::Leaf(symbol));
        self.nodes.len() - 1
    }
    fn push_branch(&mut self,left: usize,right: usize) -> usize {
        let mut label = self.label(left);
        label.or(&self.label(right));
        self.nodes.push(Node::Branch { left, right, label });
        self.nodes.len() - 1
    }
    /// set of symbols at or below node `idx`
    fn label(&self,idx: usize) -> BitVec {
        match &self.nodes[idx] {
            Node::Leaf(symbol) => {
                let mut ans = BitVec::from_elem(NUM_SYMB,false);
                ans.set(*symbol as usize,true);
                ans
            },
            Node::Branch { label, .. } => label.clone()
        }
    }
    pub fn root(&self) -> Option<usize> {
        self.nodes.len().checked_sub(1)
    }
    /// the symbol if node `idx` is a leaf
    pub fn leaf_symbol(&self,idx: usize) -> Option<u8> {
        match self.nodes.get(idx) {
            Some(Node::Leaf(symbol)) => Some(*symbol),
            _ => None
        }
    }
    /// the (left,right) sons if node `idx` is a branch
    pub fn sons(&self,idx: usize) -> Option<(usize,usize)> {
        match self.nodes.get(idx) {
            Some(Node::Branch { left, right, .. }) => Some((*left,*right)),
            _ => None
        }
    }
    /// whether `symbol` is at or below node `idx`
    pub fn contains(&self,idx: usize,symbol: u8) -> bool {
        match self.nodes.get(idx) {
            Some(Node::Leaf(s)) => *s == symbol,
            Some(Node::Branch { label, .. }) => label.get(symbol as usize).unwrap_or(false),
            None => false
        }
    }
    /// number of leaves, i.e., the number of distinct symbols
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n,Node::Leaf(_))).count()
    }
    /// Walk from the root following `bits` starting at `ptr`, 0 goes left, 1 goes right.
    pub fn walk(&self,bits: &BitVec,ptr: usize) -> Walk {
        let mut curs = match self.root() {
            Some(r) if self.sons(r).is_some() => r,
            _ => return Walk::Invalid
        };
        let mut end = ptr;
        loop {
            match &self.nodes[curs] {
                Node::Leaf(symbol) => return Walk::Decoded(*symbol,end - ptr),
                Node::Branch { left, right, .. } => {
                    curs = match bits.get(end) {
                        Some(false) => *left,
                        Some(true) => *right,
                        None => return Walk::NeedMoreBits
                    };
                    end += 1;
                }
            }
        }
    }
    /// Serialize the tree in pre-order: a 1 bit followed by 8 bits of symbol
    /// for a leaf, a 0 bit followed by the left and right subtrees for a branch.
    /// Nothing is written for an empty tree.
    pub fn put_tree(&self,packer: &mut BitPacker) {
        if let Some(root) = self.root() {
            self.put_node(root,packer);
        }
    }
    fn put_node(&self,idx: usize,packer: &mut BitPacker) {
        match &self.nodes[idx] {
            Node::Leaf(symbol) => {
                packer.put_bits(1,1);
                packer.put_bits(8,*symbol as usize);
            },
            Node::Branch { left, right, .. } => {
                packer.put_bits(1,0);
                self.put_node(*left,packer);
                self.put_node(*right,packer);
            }
        }
    }
    /// Read a tree written by `put_tree`.  The stream must hold a non-empty tree.
    pub fn get_tree<R: Read>(bits: &mut BitReader,reader: &mut R) -> Result<Self,DYNERR> {
        let mut tree = Self::empty();
        let mut seen = BitVec::from_elem(NUM_SYMB,false);
        match tree.get_node(bits,reader,&mut seen,0) {
            Ok(_) => Ok(tree),
            Err(e) => {
                let eof = matches!(e.downcast_ref::<std::io::Error>(),
                    Some(io) if io.kind()==std::io::ErrorKind::UnexpectedEof);
                if eof {
                    log::error!("archive ended inside the tree");
                    return Err(Box::new(crate::Error::FileFormatMismatch));
                }
                Err(e)
            }
        }
    }
    fn get_node<R: Read>(&mut self,bits: &mut BitReader,reader: &mut R,seen: &mut BitVec,depth: usize) -> Result<usize,DYNERR> {
        // a tree over 256 symbols cannot be deeper than 255
        if depth >= NUM_SYMB {
            log::error!("tree is too deep");
            return Err(Box::new(crate::Error::FileFormatMismatch));
        }
        if bits.get_bit(reader)? {
            let symbol = bits.get_code(8,reader)? as u8;
            if seen[symbol as usize] {
                log::error!("symbol {} appears twice in the tree",symbol);
                return Err(Box::new(crate::Error::FileFormatMismatch));
            }
            seen.set(symbol as usize,true);
            return Ok(self.push_leaf(symbol));
        }
        let left = self.get_node(bits,reader,seen,depth+1)?;
        let right = self.get_node(bits,reader,seen,depth+1)?;
        Ok(self.push_branch(left,right))
    }
}

#[cfg(test)]
fn tree_for(txt: &str) -> HuffmanTree {
    let mut freq = FrequencyTable::new();
    freq.count_all(txt.as_bytes());
    HuffmanTree::build(&freq)
}

#[test]
fn greedy_merge_order() {
    // a and b are merged first, the result is heavier than c so c goes left
    let tree = tree_for("aabbbcccc");
    let root = tree.root().unwrap();
    let (left,right) = tree.sons(root).unwrap();
    assert_eq!(tree.leaf_symbol(left),Some(b'c'));
    let (rl,rr) = tree.sons(right).unwrap();
    assert_eq!(tree.leaf_symbol(rl),Some(b'a'));
    assert_eq!(tree.leaf_symbol(rr),Some(b'b'));
    assert!(tree.contains(right,b'a'));
    assert!(tree.contains(right,b'b'));
    assert!(!tree.contains(right,b'c'));
    assert_eq!(tree.leaf_count(),3);
}

#[test]
fn ties_follow_symbol_order() {
    let tree = tree_for("dcba");
    let root = tree.root().unwrap();
    let (left,right) = tree.sons(root).unwrap();
    let (ll,lr) = tree.sons(left).unwrap();
    let (rl,rr) = tree.sons(right).unwrap();
    assert_eq!(tree.leaf_symbol(ll),Some(b'a'));
    assert_eq!(tree.leaf_symbol(lr),Some(b'b'));
    assert_eq!(tree.leaf_symbol(rl),Some(b'c'));
    assert_eq!(tree.leaf_symbol(rr),Some(b'd'));
}

#[test]
fn degenerate_and_empty() {
    let tree = tree_for("zzzz");
    assert_eq!(tree.root(),Some(0));
    assert_eq!(tree.leaf_symbol(0),Some(b'z'));
    assert_eq!(tree.walk(&BitVec::from_elem(8,false),0),Walk::Invalid);
    let tree = tree_for("");
    assert_eq!(tree.leaf_count(),0);
    assert_eq!(tree.root(),None);
    assert_eq!(tree.walk(&BitVec::new(),0),Walk::Invalid);
}

#[test]
fn walk_results() {
    let tree = tree_for("aabbbcccc");
    // c = 0, a = 10, b = 11
    let bits = BitVec::from_bytes(&[0b01011000]);
    assert_eq!(tree.walk(&bits,0),Walk::Decoded(b'c',1));
    assert_eq!(tree.walk(&bits,1),Walk::Decoded(b'a',2));
    assert_eq!(tree.walk(&bits,3),Walk::Decoded(b'b',2));
    let mut partial = BitVec::new();
    partial.push(true);
    assert_eq!(tree.walk(&partial,0),Walk::NeedMoreBits);
    assert_eq!(tree.walk(&partial,1),Walk::NeedMoreBits);
}

#[test]
fn header_bits() {
    let tree = tree_for("aabbbcccc");
    let mut out: Vec<u8> = Vec::new();
    let mut packer = BitPacker::new(16);
    tree.put_tree(&mut packer);
    packer.finish(&mut out).unwrap();
    // 0 1'c' 0 1'a' 1'b'
    assert_eq!(out,hex::decode("58D61B10").unwrap());
    let mut src = std::io::Cursor::new(out);
    let cpy = HuffmanTree::get_tree(&mut BitReader::new(),&mut src).expect("bad tree");
    assert_eq!(cpy.nodes.len(),5);
    let (left,right) = cpy.sons(cpy.root().unwrap()).unwrap();
    assert_eq!(cpy.leaf_symbol(left),Some(b'c'));
    assert!(cpy.contains(right,b'a'));
    assert!(cpy.contains(right,b'b'));
}

#[test]
fn malformed_header() {
    // truncated
    let mut src = std::io::Cursor::new(hex::decode("58").unwrap());
    assert!(HuffmanTree::get_tree(&mut BitReader::new(),&mut src).is_err());
    // 0 1'a' 1'a'
    let mut src = std::io::Cursor::new(hex::decode("586C20").unwrap());
    assert!(HuffmanTree::get_tree(&mut BitReader::new(),&mut src).is_err());
}
