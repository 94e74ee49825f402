//! Template rendering.

use expressions_core::{EvaluationError, ExpressionsError, Variant};
use expressions_tokenizer::Token;
use tracing::{debug, trace};

use super::parser::MustacheParser;
use super::token::{MustacheToken, MustacheTokenKind as Kind, MustacheTree, NodeId};
use crate::calculator::VariableCollection;

/// A parsed template with default variables.
///
/// # Example
///
/// ```
/// use expressions::{MustacheTemplate, VariableCollection};
///
/// let template = MustacheTemplate::with_template("Hello, {{name}}{{#loud}}!{{/loud}}").unwrap();
/// let variables: VariableCollection = [("NAME", "<Alex>")].into_iter().collect();
/// assert_eq!(template.evaluate_with_variables(&variables).unwrap(), "Hello, &lt;Alex&gt;");
/// ```
#[derive(Debug)]
pub struct MustacheTemplate {
    parser: MustacheParser,
    default_variables: VariableCollection,
    auto_variables: bool,
}

impl MustacheTemplate {
    pub fn new() -> Self {
        Self {
            parser: MustacheParser::new(),
            default_variables: VariableCollection::new(),
            auto_variables: true,
        }
    }

    /// A template with `template` already parsed.
    pub fn with_template(template: &str) -> Result<Self, ExpressionsError> {
        let mut result = Self::new();
        result.set_template(template)?;
        Ok(result)
    }

    pub fn template(&self) -> &str {
        self.parser.template()
    }

    /// Parse a new template.
    pub fn set_template(&mut self, template: &str) -> Result<(), ExpressionsError> {
        self.parser.set_template(template)?;
        if self.auto_variables {
            self.create_variables();
        }
        Ok(())
    }

    /// Declare every referenced name in the default variables.
    pub fn create_variables(&mut self) {
        for name in self.parser.variable_names() {
            self.default_variables.locate(name);
        }
    }

    pub fn original_tokens(&self) -> &[Token] {
        self.parser.original_tokens()
    }

    pub fn initial_tokens(&self) -> &[MustacheToken] {
        self.parser.initial_tokens()
    }

    pub fn result_tree(&self) -> &MustacheTree {
        self.parser.result_tree()
    }

    pub fn variable_names(&self) -> &[String] {
        self.parser.variable_names()
    }

    pub fn default_variables(&self) -> &VariableCollection {
        &self.default_variables
    }

    pub fn default_variables_mut(&mut self) -> &mut VariableCollection {
        &mut self.default_variables
    }

    pub fn auto_variables(&self) -> bool {
        self.auto_variables
    }

    pub fn set_auto_variables(&mut self, enabled: bool) {
        self.auto_variables = enabled;
    }

    /// Render with the default variables.
    pub fn evaluate(&self) -> Result<String, ExpressionsError> {
        self.render(None)
    }

    /// Render with `variables` taking precedence over the defaults.
    pub fn evaluate_with_variables(
        &self,
        variables: &VariableCollection,
    ) -> Result<String, ExpressionsError> {
        self.render(Some(variables))
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn render(&self, overrides: Option<&VariableCollection>) -> Result<String, ExpressionsError> {
        debug!(nodes = self.result_tree().len(), "rendering template");
        let renderer = Renderer {
            tree: self.result_tree(),
            overrides,
            defaults: &self.default_variables,
            scopes: Vec::new(),
            output: String::with_capacity(self.template().len()),
        };
        Ok(renderer.run()?)
    }
}

impl Default for MustacheTemplate {
    fn default() -> Self {
        Self::new()
    }
}

/// Pending rendering step.
enum Work {
    Node(NodeId),
    PushScope(Variant),
    PopScope,
}

struct Renderer<'a> {
    tree: &'a MustacheTree,
    overrides: Option<&'a VariableCollection>,
    defaults: &'a VariableCollection,
    /// Iteration elements and object sections, innermost last.
    scopes: Vec<Variant>,
    output: String,
}

impl Renderer<'_> {
    fn run(mut self) -> Result<String, EvaluationError> {
        let mut work: Vec<Work> = Vec::new();
        self.push_children(&mut work, MustacheTree::ROOT);

        while let Some(item) = work.pop() {
            match item {
                Work::Node(id) => self.render_node(&mut work, id)?,
                Work::PushScope(scope) => self.scopes.push(scope),
                Work::PopScope => {
                    self.scopes.pop();
                }
            }
        }
        Ok(self.output)
    }

    fn push_children(&self, work: &mut Vec<Work>, id: NodeId) {
        work.extend(self.tree.node(id).children.iter().rev().map(|&child| Work::Node(child)));
    }

    /// Schedule the children of `id` once with `scope` active.
    fn push_scoped(&self, work: &mut Vec<Work>, id: NodeId, scope: Variant) {
        work.push(Work::PopScope);
        self.push_children(work, id);
        work.push(Work::PushScope(scope));
    }

    fn render_node(&mut self, work: &mut Vec<Work>, id: NodeId) -> Result<(), EvaluationError> {
        let Some(token) = self.tree.node(id).token.as_ref() else {
            return Ok(());
        };
        trace!(kind = ?token.kind, position = %token.position, "rendering node");

        match token.kind {
            Kind::Value => self.output.push_str(token.text()),
            Kind::Variable => {
                if let Some(value) = self.resolve(token.text()) {
                    self.output.push_str(&value.to_string());
                }
            }
            Kind::EscapedVariable => {
                if let Some(value) = self.resolve(token.text()) {
                    self.output.push_str(&escape_html(&value.to_string()));
                }
            }
            Kind::Section => match self.resolve(token.text()).unwrap_or_default() {
                Variant::Array(items) => {
                    for item in items.into_iter().rev() {
                        self.push_scoped(work, id, item);
                    }
                }
                value @ Variant::Object(_) if value.is_truthy() => {
                    self.push_scoped(work, id, value)
                }
                value if value.is_truthy() => self.push_children(work, id),
                _ => {}
            },
            Kind::InvertedSection => {
                if !self.resolve(token.text()).is_some_and(|v| v.is_truthy()) {
                    self.push_children(work, id);
                }
            }
            Kind::Partial => {
                return Err(EvaluationError::PartialsNotSupported {
                    name: token.text().to_string(),
                    position: token.position,
                });
            }
            Kind::Comment | Kind::SectionEnd => {}
        }
        Ok(())
    }

    /// Look up a name or dotted path.
    ///
    /// The first segment is searched in the active scopes, innermost first,
    /// then in the supplied variables and the defaults.
    fn resolve(&self, name: &str) -> Option<Variant> {
        if name == "." {
            return self.scopes.last().cloned();
        }

        let mut segments = name.split('.');
        let first = segments.next()?;
        let mut value = self
            .scopes
            .iter()
            .rev()
            .find_map(|scope| scope.field(first))
            .or_else(|| self.overrides.and_then(|vars| vars.get(first)))
            .or_else(|| self.defaults.get(first))?;

        for segment in segments {
            value = value.field(segment)?;
        }
        Some(value.clone())
    }
}

/// Escape `& < > " '` for HTML text and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn render(text: &str, variables: &[(&str, Variant)]) -> String {
        let template = MustacheTemplate::with_template(text).unwrap();
        let variables: VariableCollection = variables.iter().cloned().collect();
        template.evaluate_with_variables(&variables).unwrap()
    }

    fn object(fields: &[(&str, Variant)]) -> Variant {
        Variant::Object(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_html("a < b & \"c\" 'd'"), "a &lt; b &amp; &quot;c&quot; &#39;d&#39;");
        let vars = [("x", Variant::from("<b>"))];
        assert_eq!(render("{{x}}|{{{x}}}", &vars), "&lt;b&gt;|<b>");
    }

    #[test]
    fn sections_iterate_arrays() {
        let items = Variant::Array(vec![
            object(&[("name", Variant::from("a"))]),
            object(&[("name", Variant::from("b"))]),
        ]);
        assert_eq!(
            render("{{#items}}[{{name}}]{{/items}}{{^items}}none{{/items}}", &[("items", items)]),
            "[a][b]"
        );
        assert_eq!(
            render(
                "{{#items}}x{{/items}}{{^items}}none{{/items}}",
                &[("items", Variant::Array(vec![]))]
            ),
            "none"
        );
    }

    #[test]
    fn current_element_and_outer_names() {
        let numbers = Variant::Array(vec![Variant::from(1), Variant::from(2)]);
        let vars = [("n", numbers), ("sep", Variant::from(";"))];
        assert_eq!(render("{{#n}}{{.}}{{sep}}{{/n}}", &vars), "1;2;");
    }

    #[test]
    fn dotted_paths_and_object_sections() {
        let user = object(&[("Name", Variant::from("Ann")), ("tags", Variant::from("x"))]);
        let vars = [("user", user)];
        assert_eq!(render("{{user.name}}", &vars), "Ann");
        assert_eq!(render("{{#user}}{{name}}/{{tags}}{{/user}}", &vars), "Ann/x");
        assert_eq!(render("{{user.missing.deeper}}-", &vars), "-");
    }

    #[test]
    fn helpers_and_comments() {
        let vars = [("ok", Variant::from(true))];
        assert_eq!(
            render("{{#if ok}}yes{{/if}}{{#unless ok}}no{{/unless}}{{! ignored }}", &vars),
            "yes"
        );
    }

    #[test]
    fn overrides_win_over_defaults() {
        let mut template = MustacheTemplate::with_template("{{a}}{{b}}").unwrap();
        template.default_variables_mut().set("a", "1");
        template.default_variables_mut().set("b", "2");
        let overrides: VariableCollection = [("B", "3")].into_iter().collect();
        assert_eq!(template.evaluate_with_variables(&overrides).unwrap(), "13");
        assert_eq!(template.evaluate().unwrap(), "12");
    }

    #[test]
    fn auto_variables_are_declared_unset() {
        let template = MustacheTemplate::with_template("{{a}}{{#b}}{{/b}}").unwrap();
        assert_eq!(template.default_variables().len(), 2);
        assert_eq!(template.evaluate().unwrap(), "");
    }

    #[test]
    fn partials_fail_at_render_time() {
        let template = MustacheTemplate::with_template("x{{> header}}").unwrap();
        assert!(matches!(
            template.evaluate(),
            Err(ExpressionsError::Evaluation(EvaluationError::PartialsNotSupported { .. }))
        ));
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let depth = 2000;
        let text = format!("{}x{}", "{{#a}}".repeat(depth), "{{/a}}".repeat(depth));
        assert_eq!(render(&text, &[("a", Variant::from(true))]), "x");
    }
}
