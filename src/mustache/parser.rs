//! Template parsing: flat tag tokens, then the section tree.

use expressions_core::{ExpressionsError, Position, SyntaxError, SyntaxErrorKind};
use expressions_tokenizer::{Token, TokenKind, Tokenize};
use rustc_hash::FxHashSet;
use tracing::debug;

use super::token::{MustacheToken, MustacheTokenKind as Kind, MustacheTree, NodeId};
use super::tokenizer::MustacheTokenizer;

/// Parses template text into a [`MustacheTree`].
#[derive(Debug, Default)]
pub struct MustacheParser {
    template: String,
    original_tokens: Vec<Token>,
    initial_tokens: Vec<MustacheToken>,
    result_tree: MustacheTree,
    variable_names: Vec<String>,
}

impl MustacheParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn original_tokens(&self) -> &[Token] {
        &self.original_tokens
    }

    /// Flat template tokens in source order.
    pub fn initial_tokens(&self) -> &[MustacheToken] {
        &self.initial_tokens
    }

    pub fn result_tree(&self) -> &MustacheTree {
        &self.result_tree
    }

    /// Root names referenced by tags, first spelling, unique ignoring case.
    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    /// Parse `template`, replacing the previous result.
    ///
    /// On failure the parser is left empty.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn set_template(&mut self, template: &str) -> Result<(), ExpressionsError> {
        self.clear();
        self.template = template.to_string();

        let result = self.parse();
        if result.is_err() {
            let template = std::mem::take(&mut self.template);
            self.clear();
            self.template = template;
        }
        result
    }

    pub fn clear(&mut self) {
        self.template.clear();
        self.original_tokens.clear();
        self.initial_tokens.clear();
        self.result_tree = MustacheTree::new();
        self.variable_names.clear();
    }

    fn parse(&mut self) -> Result<(), ExpressionsError> {
        let mut tokenizer = MustacheTokenizer::new();
        self.original_tokens = tokenizer.tokenize_buffer(&self.template)?;
        self.initial_tokens = TagReader::new(&self.original_tokens).read()?;
        self.result_tree = build_tree(&self.initial_tokens)?;

        let mut seen = FxHashSet::default();
        for token in &self.initial_tokens {
            if !matches!(
                token.kind,
                Kind::Variable | Kind::EscapedVariable | Kind::Section | Kind::InvertedSection
            ) {
                continue;
            }
            let Some(root) = token.text().split('.').next().filter(|s| !s.is_empty()) else {
                continue;
            };
            if seen.insert(root.to_lowercase()) {
                self.variable_names.push(root.to_string());
            }
        }

        debug!(
            tokens = self.initial_tokens.len(),
            nodes = self.result_tree.len(),
            variables = ?self.variable_names,
            "parsed template"
        );
        Ok(())
    }
}

/// Groups tokenizer output into one [`MustacheToken`] per text run or tag.
struct TagReader<'a> {
    tokens: &'a [Token],
    pos: usize,
    end: Position,
}

impl<'a> TagReader<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        let end = tokens.last().map_or(Position::new(1, 1), |t| t.position);
        Self { tokens, pos: 0, end }
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn read(mut self) -> Result<Vec<MustacheToken>, SyntaxError> {
        let mut result = Vec::new();
        while let Some(token) = self.advance() {
            match (token.kind, token.value.as_str()) {
                (TokenKind::Special, text) => result.push(MustacheToken::new(
                    Kind::Value,
                    Some(text.to_string()),
                    token.position,
                )),
                (TokenKind::Symbol, "{{{") => {
                    let name = self.name()?;
                    self.close("}}}")?;
                    result.push(MustacheToken::new(Kind::Variable, Some(name), token.position));
                }
                (TokenKind::Symbol, "{{") => {
                    let tag = self.tag(token.position)?;
                    self.close("}}")?;
                    result.push(tag);
                }
                _ => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnexpectedToken,
                        token.position,
                        format!("'{}' outside of a tag", token.value),
                    ));
                }
            }
        }
        Ok(result)
    }

    /// The contents of a `{{ ... }}` tag.
    fn tag(&mut self, position: Position) -> Result<MustacheToken, SyntaxError> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected_end());
        };

        let tag = match (token.kind, token.value.as_str()) {
            (TokenKind::Comment, text) => {
                self.pos += 1;
                let text = text.strip_prefix('!').unwrap_or(text);
                MustacheToken::new(Kind::Comment, Some(text.to_string()), position)
            }
            (TokenKind::Symbol, "#") => {
                self.pos += 1;
                let name = self.name()?;
                let helper = if name.eq_ignore_ascii_case("if") {
                    Some(Kind::Section)
                } else if name.eq_ignore_ascii_case("unless") {
                    Some(Kind::InvertedSection)
                } else {
                    None
                };
                match helper {
                    Some(kind) if self.peek().is_some_and(|t| t.kind == TokenKind::Word) => {
                        let mut tag = MustacheToken::new(kind, Some(self.name()?), position);
                        tag.helper = Some(name);
                        tag
                    }
                    _ => MustacheToken::new(Kind::Section, Some(name), position),
                }
            }
            (TokenKind::Symbol, "^") => {
                self.pos += 1;
                MustacheToken::new(Kind::InvertedSection, Some(self.name()?), position)
            }
            (TokenKind::Symbol, "/") => {
                self.pos += 1;
                let name = match self.peek() {
                    Some(t) if t.kind == TokenKind::Word => Some(self.name()?),
                    _ => None,
                };
                MustacheToken::new(Kind::SectionEnd, name, position)
            }
            (TokenKind::Symbol, ">") => {
                self.pos += 1;
                MustacheToken::new(Kind::Partial, Some(self.name()?), position)
            }
            _ => MustacheToken::new(Kind::EscapedVariable, Some(self.name()?), position),
        };
        Ok(tag)
    }

    fn name(&mut self) -> Result<String, SyntaxError> {
        match self.advance() {
            Some(token) if token.kind == TokenKind::Word => Ok(token.value.clone()),
            Some(token) => Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken,
                token.position,
                format!("expected a name, found '{}'", token.value),
            )),
            None => Err(self.unexpected_end()),
        }
    }

    fn close(&mut self, expected: &str) -> Result<(), SyntaxError> {
        match self.advance() {
            Some(token) if token.value == expected => Ok(()),
            Some(token) if matches!(token.value.as_str(), "}}" | "}}}") => Err(SyntaxError::new(
                SyntaxErrorKind::MismatchedBrackets,
                token.position,
                format!("expected '{}', found '{}'", expected, token.value),
            )),
            Some(token) => Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken,
                token.position,
                format!("expected '{}', found '{}'", expected, token.value),
            )),
            None => Err(self.unexpected_end()),
        }
    }

    fn unexpected_end(&self) -> SyntaxError {
        SyntaxError::new(SyntaxErrorKind::UnexpectedEnd, self.end, "unterminated tag")
    }
}

/// Nest sections with an explicit stack of open section nodes.
fn build_tree(tokens: &[MustacheToken]) -> Result<MustacheTree, SyntaxError> {
    let mut tree = MustacheTree::new();
    let mut open: Vec<NodeId> = vec![MustacheTree::ROOT];

    for token in tokens {
        let parent = open.last().copied().unwrap_or(MustacheTree::ROOT);
        match token.kind {
            Kind::Section | Kind::InvertedSection => {
                let id = tree.add(parent, token.clone());
                open.push(id);
            }
            Kind::SectionEnd => {
                let section = match tree.node(parent).token.as_ref() {
                    Some(section) if open.len() > 1 => section,
                    _ => {
                        return Err(SyntaxError::new(
                            SyntaxErrorKind::SectionMismatch,
                            token.position,
                            format!("'{}' closes no open section", token.text()),
                        ));
                    }
                };
                if !section.is_closed_by(token) {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::SectionMismatch,
                        token.position,
                        format!("'{}' cannot close section '{}'", token.text(), section.text()),
                    ));
                }
                open.pop();
            }
            _ => {
                tree.add(parent, token.clone());
            }
        }
    }

    if let Some(&unclosed) = open.get(1..).and_then(|rest| rest.last()) {
        let (position, name) = tree
            .node(unclosed)
            .token
            .as_ref()
            .map_or((Position::default(), ""), |t| (t.position, t.text()));
        return Err(SyntaxError::new(
            SyntaxErrorKind::SectionMismatch,
            position,
            format!("section '{}' is not closed", name),
        ));
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> MustacheParser {
        let mut parser = MustacheParser::new();
        parser.set_template(text).unwrap();
        parser
    }

    fn syntax_error(text: &str) -> SyntaxErrorKind {
        match MustacheParser::new().set_template(text) {
            Err(ExpressionsError::Syntax(err)) => err.kind,
            other => panic!("expected a syntax error for {text:?}, got {other:?}"),
        }
    }

    fn kinds(parser: &MustacheParser) -> Vec<Kind> {
        parser.initial_tokens().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn flat_tokens() {
        let parser = parse("Hello, {{{NAME}}}{{#E}}!{{/E}}{{^E}}.{{/}}{{! note }}{{x}}{{> part}}");
        assert_eq!(
            kinds(&parser),
            vec![
                Kind::Value,
                Kind::Variable,
                Kind::Section,
                Kind::Value,
                Kind::SectionEnd,
                Kind::InvertedSection,
                Kind::Value,
                Kind::SectionEnd,
                Kind::Comment,
                Kind::EscapedVariable,
                Kind::Partial,
            ]
        );
        assert_eq!(parser.initial_tokens()[0].text(), "Hello, ");
        assert_eq!(parser.initial_tokens()[7].value, None);
        assert_eq!(parser.initial_tokens()[8].text(), " note ");
    }

    #[test]
    fn tree_nests_sections() {
        let parser = parse("a{{#s}}b{{^t}}c{{/t}}{{/s}}d");
        let tree = parser.result_tree();
        let root = tree.root();
        assert_eq!(root.children.len(), 3);

        let section = tree.node(root.children[1]);
        assert_eq!(section.token.as_ref().map(|t| t.text()), Some("s"));
        assert_eq!(section.children.len(), 2);
        let inverted = tree.node(section.children[1]);
        assert_eq!(inverted.token.as_ref().map(|t| t.kind), Some(Kind::InvertedSection));
        assert_eq!(inverted.children.len(), 1);
    }

    #[test]
    fn helpers() {
        let parser = parse("{{#if a}}x{{/if}}{{#unless b}}y{{/unless}}{{#IF}}z{{/if}}");
        let tokens = parser.initial_tokens();
        assert_eq!((tokens[0].kind, tokens[0].text()), (Kind::Section, "a"));
        assert_eq!(tokens[0].helper.as_deref(), Some("if"));
        assert_eq!((tokens[3].kind, tokens[3].text()), (Kind::InvertedSection, "b"));
        assert_eq!((tokens[6].kind, tokens[6].text()), (Kind::Section, "IF"));
    }

    #[test]
    fn end_names_ignore_case() {
        parse("{{#Items}}x{{/ITEMS}}");
    }

    #[test]
    fn variable_names() {
        let parser = parse("{{a}} {{{B}}} {{#A}}{{b.c}}{{.}}{{/A}}{{^d}}{{/d}}");
        assert_eq!(parser.variable_names(), &["a", "B", "d"]);
    }

    #[test]
    fn errors() {
        assert_eq!(syntax_error("{{#a}}x{{/b}}"), SyntaxErrorKind::SectionMismatch);
        assert_eq!(syntax_error("{{#a}}x"), SyntaxErrorKind::SectionMismatch);
        assert_eq!(syntax_error("x{{/a}}"), SyntaxErrorKind::SectionMismatch);
        assert_eq!(syntax_error("{{a}}}"), SyntaxErrorKind::MismatchedBrackets);
        assert_eq!(syntax_error("{{{a}}"), SyntaxErrorKind::MismatchedBrackets);
        assert_eq!(syntax_error("{{a"), SyntaxErrorKind::UnexpectedEnd);
        assert_eq!(syntax_error("{{}}"), SyntaxErrorKind::UnexpectedToken);
    }

    #[test]
    fn literal_text_is_kept_verbatim() {
        let parser = parse("  line one\n\t{{x}}  \n");
        let tokens = parser.initial_tokens();
        assert_eq!(tokens[0].text(), "  line one\n\t");
        assert_eq!(tokens[2].text(), "  \n");
    }
}
