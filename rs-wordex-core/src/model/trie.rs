use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WordexError};

/// Order in which a trie walks the characters of an n-gram.
///
/// - `Forward`: left to right. Children of a node are the characters that
///   *follow* the walked string (right context).
/// - `Reversed`: right to left. Children of a node are the characters that
///   *precede* the walked string (left context).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	Forward,
	Reversed,
}

impl Direction {
	/// Characters of `ngram` in walking order.
	fn ordered_chars(self, ngram: &str) -> Vec<char> {
		let mut chars: Vec<char> = ngram.chars().collect();
		if self == Direction::Reversed {
			chars.reverse();
		}
		chars
	}
}

/// Node of a trie under construction.
#[derive(Clone, Debug, Default)]
struct BuildNode {
	children: BTreeMap<char, BuildNode>,
	count: u64,
	terminals: BTreeMap<usize, u64>,
}

impl BuildNode {
	fn merge(&mut self, other: BuildNode) {
		self.count += other.count;
		for (nominal_length, occurrence) in other.terminals {
			*self.terminals.entry(nominal_length).or_insert(0) += occurrence;
		}
		for (c, child) in other.children {
			self.children.entry(c).or_default().merge(child);
		}
	}

	/// Converts the subtree into read-only nodes, computing every entropy once.
	fn freeze(self) -> Node {
		let children: BTreeMap<char, Node> = self
			.children
			.into_iter()
			.map(|(c, child)| (c, child.freeze()))
			.collect();
		let entropy = branch_entropy(self.count, children.values().map(Node::count));

		Node {
			children,
			count: self.count,
			terminals: self.terminals,
			entropy,
		}
	}
}

/// Shannon entropy (bits) of a branching distribution.
///
/// Each branch probability is `branch / total`. Zero or one branch means
/// there is no uncertainty and the entropy is exactly 0.
fn branch_entropy<I: Iterator<Item = u64>>(total: u64, branches: I) -> f64 {
	let branches: Vec<u64> = branches.filter(|&occurrence| occurrence > 0).collect();
	if branches.len() < 2 || total == 0 {
		return 0.0;
	}

	let total = total as f64;
	branches
		.iter()
		.map(|&occurrence| {
			let p = occurrence as f64 / total;
			-p * p.log2()
		})
		.sum()
}

/// Mutable trie used while the corpus is being indexed.
///
/// Entropy is not available on a builder: call [`TrieBuilder::set_entropy`]
/// once every n-gram has been inserted to obtain a read-only [`Trie`].
#[derive(Clone, Debug)]
pub struct TrieBuilder {
	direction: Direction,
	root: BuildNode,
}

impl TrieBuilder {
	pub fn new(direction: Direction) -> Self {
		Self { direction, root: BuildNode::default() }
	}

	pub fn direction(&self) -> Direction {
		self.direction
	}

	/// Inserts one occurrence of `ngram`.
	///
	/// Every visited node (root included) has its `count` incremented. The
	/// final node also counts the occurrence in the `nominal_length` bucket,
	/// which is what [`Trie::frequency`] reads back.
	///
	/// Empty n-grams are ignored.
	pub fn insert(&mut self, ngram: &str, nominal_length: usize) {
		if ngram.is_empty() {
			return;
		}

		let mut node = &mut self.root;
		node.count += 1;
		for c in self.direction.ordered_chars(ngram) {
			node = node.children.entry(c).or_default();
			node.count += 1;
		}
		*node.terminals.entry(nominal_length).or_insert(0) += 1;
	}

	/// Merges another builder into this one, summing every counter.
	///
	/// # Errors
	/// Returns an error if both builders do not walk in the same direction.
	pub fn merge(&mut self, other: TrieBuilder) -> Result<()> {
		if self.direction != other.direction {
			return Err(WordexError::DirectionMismatch(other.direction, self.direction));
		}
		self.root.merge(other.root);
		Ok(())
	}

	/// Freezes the trie and caches the entropy of every node.
	///
	/// Consumes the builder: no insertion can happen after entropies are set.
	pub fn set_entropy(self) -> Trie {
		Trie { direction: self.direction, root: self.root.freeze() }
	}
}

/// One character position of a frozen trie.
///
/// # Invariants
/// - `count >= sum(child.count)` for all children
/// - `entropy >= 0`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Node {
	children: BTreeMap<char, Node>,
	count: u64,
	terminals: BTreeMap<usize, u64>,
	entropy: f64,
}

impl Node {
	/// Number of inserted n-grams passing through this node.
	pub fn count(&self) -> u64 {
		self.count
	}

	/// Number of n-grams of `nominal_length` ending exactly here.
	pub fn terminal_count(&self, nominal_length: usize) -> u64 {
		self.terminals.get(&nominal_length).copied().unwrap_or(0)
	}

	/// Cached branching entropy, in bits.
	pub fn entropy(&self) -> f64 {
		self.entropy
	}

	pub fn child(&self, c: char) -> Option<&Node> {
		self.children.get(&c)
	}

	/// Next character (in trie direction) mapped to its child's count.
	pub fn branch_distribution(&self) -> BTreeMap<char, u64> {
		self.children.iter().map(|(c, child)| (*c, child.count)).collect()
	}
}

/// Read-only, frequency-annotated trie with precomputed entropies.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Trie {
	direction: Direction,
	root: Node,
}

impl Trie {
	pub fn direction(&self) -> Direction {
		self.direction
	}

	pub fn root(&self) -> &Node {
		&self.root
	}

	/// Returns the node reached by walking `ngram`, or `None` if the walk
	/// leaves the trie. Absence is a normal outcome.
	pub fn lookup(&self, ngram: &str) -> Option<&Node> {
		let mut node = &self.root;
		for c in self.direction.ordered_chars(ngram) {
			node = node.child(c)?;
		}
		Some(node)
	}

	/// Occurrences of `ngram` inserted as an n-gram of its own length.
	pub fn frequency(&self, ngram: &str) -> u64 {
		self.frequency_of_length(ngram, ngram.chars().count())
	}

	/// Occurrences of `ngram` inserted with the given nominal length.
	pub fn frequency_of_length(&self, ngram: &str, nominal_length: usize) -> u64 {
		self.lookup(ngram).map_or(0, |node| node.terminal_count(nominal_length))
	}

	/// Entropy of the node reached by `ngram`; 0 when absent.
	pub fn entropy(&self, ngram: &str) -> f64 {
		self.lookup(ngram).map_or(0.0, Node::entropy)
	}
}
