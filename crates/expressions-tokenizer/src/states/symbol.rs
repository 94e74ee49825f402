use expressions_core::TokenizerError;
use rustc_hash::FxHashMap;

use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};
use crate::tokenizer::{Tokenizer, TokenizerState};

const ROOT: usize = 0;

#[derive(Debug, Clone, Default)]
struct SymbolNode {
    parent: usize,
    children: FxHashMap<char, usize>,
    /// Kind reported when a symbol ends at this node; `None` for pure prefixes.
    kind: Option<TokenKind>,
}

/// Prefix tree over registered symbols.
///
/// Every single character is implicitly a symbol, so backing off from a
/// partial match always ends on a valid node.
#[derive(Debug, Clone)]
pub struct SymbolTree {
    nodes: Vec<SymbolNode>,
}

impl SymbolTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![SymbolNode::default()],
        }
    }

    /// Register `symbol`, reported as `kind`.
    pub fn add(&mut self, symbol: &str, kind: TokenKind) {
        let mut node = ROOT;
        for ch in symbol.chars() {
            node = match self.nodes[node].children.get(&ch) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(SymbolNode {
                        parent: node,
                        children: FxHashMap::default(),
                        kind: (node == ROOT).then_some(TokenKind::Symbol),
                    });
                    self.nodes[node].children.insert(ch, child);
                    child
                }
            };
        }
        if node != ROOT {
            self.nodes[node].kind = Some(kind);
        }
    }

    fn child(&self, node: usize, ch: char) -> Option<usize> {
        self.nodes[node].children.get(&ch).copied()
    }

    /// Read the longest registered symbol at the cursor.
    ///
    /// Follows the tree as deep as the input allows, then backs off to the
    /// deepest node where a symbol ends.
    pub fn next_symbol(&self, scanner: &mut Scanner) -> Option<(TokenKind, String)> {
        let first = scanner.read()?;
        let Some(mut node) = self.child(ROOT, first) else {
            return Some((TokenKind::Symbol, first.to_string()));
        };

        let mut text = first.to_string();
        while let Some(next) = scanner.peek().and_then(|ch| self.child(node, ch).map(|n| (ch, n))) {
            scanner.read();
            text.push(next.0);
            node = next.1;
        }

        loop {
            if let Some(kind) = self.nodes[node].kind {
                return Some((kind, text));
            }
            scanner.unread();
            text.pop();
            node = self.nodes[node].parent;
        }
    }
}

impl Default for SymbolTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumes one symbol, preferring the longest registered one.
#[derive(Debug, Clone, Default)]
pub struct GenericSymbolState {
    tree: SymbolTree,
}

impl GenericSymbolState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a multi-character symbol.
    pub fn add(&mut self, symbol: &str, kind: TokenKind) {
        self.tree.add(symbol, kind);
    }

    /// Builder form of [`add`](Self::add) for `Symbol` tokens.
    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.tree.add(symbol, TokenKind::Symbol);
        self
    }
}

impl TokenizerState for GenericSymbolState {
    fn next_token(
        &self,
        scanner: &mut Scanner,
        _tokenizer: &Tokenizer,
    ) -> Result<Token, TokenizerError> {
        let position = scanner.peek_position();
        Ok(match self.tree.next_symbol(scanner) {
            Some((kind, text)) => Token::new(kind, text, position),
            None => Token::new(TokenKind::Symbol, "", position),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> SymbolTree {
        let mut tree = SymbolTree::new();
        tree.add("{{", TokenKind::Symbol);
        tree.add("{{{", TokenKind::Symbol);
        tree.add("<>", TokenKind::Symbol);
        tree.add("<<=", TokenKind::Symbol);
        tree
    }

    fn symbols(text: &str) -> Vec<String> {
        let tree = tree();
        let mut scanner = Scanner::new(text);
        std::iter::from_fn(|| tree.next_symbol(&mut scanner).map(|(_, s)| s)).collect()
    }

    #[test]
    fn longest_match_wins() {
        assert_eq!(symbols("{{{{"), vec!["{{{", "{"]);
        assert_eq!(symbols("<>"), vec!["<>"]);
    }

    #[test]
    fn backs_off_to_valid_prefix() {
        assert_eq!(symbols("<<x"), vec!["<", "<", "x"]);
        assert_eq!(symbols("<<="), vec!["<<="]);
    }

    #[test]
    fn unregistered_characters_are_single_symbols() {
        assert_eq!(symbols("+-"), vec!["+", "-"]);
    }
}
