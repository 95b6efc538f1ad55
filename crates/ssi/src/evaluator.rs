/*
 * evaluator.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template rendering engine.
//!
//! Rendering walks the compiled nodes against a context. All `set` bindings
//! land in an execution-local scope (a child of the caller's context), so a
//! template can be rendered concurrently against different contexts and
//! renders never observe each other's bindings.

use crate::ast::{Assign, Conditional, Echo, Node};
use crate::context::{TemplateContext, TemplateValue};
use crate::error::SsiResult;
use crate::expr;
use crate::parser::Template;

impl Template {
    /// Render this template with the given context.
    ///
    /// # Arguments
    /// * `context` - The variable context for evaluation
    ///
    /// # Returns
    /// The rendered output string, or an error if a guard expression fails
    /// to evaluate.
    pub fn render(&self, context: &TemplateContext) -> SsiResult<String> {
        let mut scope = context.child();
        let mut out = String::new();
        render_nodes(&self.nodes, &mut scope, &mut out)?;
        Ok(out)
    }
}

/// Render a list of nodes into `out`.
fn render_nodes(nodes: &[Node], scope: &mut TemplateContext, out: &mut String) -> SsiResult<()> {
    for node in nodes {
        render_node(node, scope, out)?;
    }
    Ok(())
}

fn render_node(node: &Node, scope: &mut TemplateContext, out: &mut String) -> SsiResult<()> {
    match node {
        Node::Literal(text) => out.push_str(text),

        Node::Assign(Assign { name, value }) => {
            scope.insert(name.clone(), TemplateValue::String(value.clone()));
        }

        Node::Echo(Echo { name, default }) => match scope.resolve(name) {
            // Null is the unbound sentinel: fall back like a missing key
            Some(TemplateValue::Null) | None => {
                if let Some(fallback) = default {
                    out.push_str(fallback);
                }
            }
            Some(value) => out.push_str(&value.render()),
        },

        Node::Conditional(conditional) => render_conditional(conditional, scope, out)?,
    }
    Ok(())
}

/// Evaluate guards in document order and render the first matching branch
/// in a fresh nested scope. Guards after the first match are never
/// evaluated.
fn render_conditional(
    conditional: &Conditional,
    scope: &mut TemplateContext,
    out: &mut String,
) -> SsiResult<()> {
    for (guard, body) in &conditional.branches {
        if expr::evaluate(guard, scope)? {
            let mut branch_scope = scope.child();
            return render_nodes(body, &mut branch_scope, out);
        }
    }

    if let Some(body) = &conditional.else_branch {
        let mut branch_scope = scope.child();
        return render_nodes(body, &mut branch_scope, out);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SsiError;
    use pretty_assertions::assert_eq;

    fn render(text: &str, payload: serde_json::Value) -> String {
        Template::compile(text)
            .unwrap()
            .render(&TemplateContext::from_json(payload))
            .unwrap()
    }

    // === echo tests ===

    #[test]
    fn test_echo_bound_variable() {
        assert_eq!(
            render(r#"<h1><!--#echo var="title"--></h1>"#, serde_json::json!({"title": "home"})),
            "<h1>home</h1>"
        );
    }

    #[test]
    fn test_echo_unbound_uses_default() {
        assert_eq!(
            render(
                r#"<!--#echo var="title" default="untitled"-->"#,
                serde_json::json!({})
            ),
            "untitled"
        );
    }

    #[test]
    fn test_echo_unbound_without_default_is_empty() {
        assert_eq!(
            render(r#"a<!--#echo var="title"-->b"#, serde_json::json!({})),
            "ab"
        );
    }

    #[test]
    fn test_echo_null_payload_value_uses_default() {
        assert_eq!(
            render(
                r#"<!--#echo var="title" default="untitled"-->"#,
                serde_json::json!({"title": null})
            ),
            "untitled"
        );
    }

    #[test]
    fn test_echo_bound_empty_string_beats_default() {
        // An empty string is bound, so the default does not apply
        assert_eq!(
            render(
                r#"a<!--#echo var="title" default="untitled"-->b"#,
                serde_json::json!({"title": ""})
            ),
            "ab"
        );
    }

    #[test]
    fn test_echo_string_forms() {
        assert_eq!(
            render(
                r#"<!--#echo var="port"-->/<!--#echo var="debug"-->"#,
                serde_json::json!({"port": 8080, "debug": true})
            ),
            "8080/true"
        );
    }

    #[test]
    fn test_echo_dotted_path() {
        assert_eq!(
            render(
                r#"<!--#echo var="user.name"-->"#,
                serde_json::json!({"user": {"name": "ada"}})
            ),
            "ada"
        );
    }

    // === set tests ===

    #[test]
    fn test_set_then_echo() {
        assert_eq!(
            render(
                r#"<!--#set var="k" value="v"--><!--#echo var="k"-->"#,
                serde_json::json!({})
            ),
            "v"
        );
    }

    #[test]
    fn test_set_shadows_payload() {
        assert_eq!(
            render(
                r#"<!--#echo var="k"-->/<!--#set var="k" value="local"--><!--#echo var="k"-->"#,
                serde_json::json!({"k": "payload"})
            ),
            "payload/local"
        );
    }

    #[test]
    fn test_set_is_forward_only() {
        // No hoisting: an echo before the set sees nothing
        assert_eq!(
            render(
                r#"<!--#echo var="k" default="unset"-->/<!--#set var="k" value="v"-->"#,
                serde_json::json!({})
            ),
            "unset/"
        );
    }

    #[test]
    fn test_set_visible_to_subsequent_guard() {
        assert_eq!(
            render(
                r#"<!--#set var="x" value="y"--><!--#if expr="x == y"-->A<!--#else-->B<!--#endif-->"#,
                serde_json::json!({})
            ),
            "A"
        );
    }

    #[test]
    fn test_set_inside_branch_dropped_at_endif() {
        assert_eq!(
            render(
                r#"<!--#if expr="true"--><!--#set var="k" value="v"--><!--#echo var="k"--><!--#endif-->/<!--#echo var="k" default="gone"-->"#,
                serde_json::json!({})
            ),
            "v/gone"
        );
    }

    #[test]
    fn test_empty_set_value() {
        assert_eq!(
            render(
                r#"<!--#set var="k" value=""--><!--#echo var="k" default="fallback"-->"#,
                serde_json::json!({})
            ),
            ""
        );
    }

    // === conditional tests ===

    #[test]
    fn test_comparison_selects_then_branch() {
        let text = r#"<!--#if expr="x==y"-->A<!--#else-->B<!--#endif-->"#;
        assert_eq!(render(text, serde_json::json!({"x": "y"})), "A");
        assert_eq!(render(text, serde_json::json!({"x": "z"})), "B");
    }

    #[test]
    fn test_first_true_branch_wins() {
        assert_eq!(
            render(
                r#"<!--#if expr="a"-->1<!--#elif expr="b"-->2<!--#elif expr="c"-->3<!--#endif-->"#,
                serde_json::json!({"a": "x", "b": "x"})
            ),
            "1"
        );
    }

    #[test]
    fn test_elif_taken_when_if_false() {
        assert_eq!(
            render(
                r#"<!--#if expr="a"-->1<!--#elif expr="b"-->2<!--#else-->3<!--#endif-->"#,
                serde_json::json!({"b": "x"})
            ),
            "2"
        );
    }

    #[test]
    fn test_no_branch_matches_emits_nothing() {
        assert_eq!(
            render(
                r#"x<!--#if expr="a"-->1<!--#elif expr="b"-->2<!--#endif-->y"#,
                serde_json::json!({})
            ),
            "xy"
        );
    }

    #[test]
    fn test_nested_conditionals() {
        assert_eq!(
            render(
                r#"<!--#if expr="outer"-->[<!--#if expr="inner"-->deep<!--#else-->shallow<!--#endif-->]<!--#endif-->"#,
                serde_json::json!({"outer": "1"})
            ),
            "[shallow]"
        );
    }

    #[test]
    fn test_free_form_guard() {
        assert_eq!(
            render(
                r#"<!--#if expr="a && !b"-->on<!--#else-->off<!--#endif-->"#,
                serde_json::json!({"a": "1"})
            ),
            "on"
        );
    }

    // === render error tests ===

    #[test]
    fn test_bad_guard_fails_render_only_when_reached() {
        let text = r#"<!--#if expr="a"-->A<!--#elif expr="b +"-->B<!--#endif-->"#;
        let template = Template::compile(text).unwrap();

        // First guard true: the malformed second guard is never evaluated
        let ok = template
            .render(&TemplateContext::from_json(serde_json::json!({"a": "1"})))
            .unwrap();
        assert_eq!(ok, "A");

        // First guard false: evaluation reaches the malformed guard
        let err = template
            .render(&TemplateContext::from_json(serde_json::json!({})))
            .unwrap_err();
        assert!(matches!(err, SsiError::RenderError { .. }));
    }

    #[test]
    fn test_template_reusable_across_contexts() {
        let template =
            Template::compile(r#"<!--#set var="seen" value="1"--><!--#echo var="name"-->"#)
                .unwrap();

        let a = template
            .render(&TemplateContext::from_json(serde_json::json!({"name": "a"})))
            .unwrap();
        let b = template
            .render(&TemplateContext::from_json(serde_json::json!({"name": "b"})))
            .unwrap();

        assert_eq!(a, "a");
        assert_eq!(b, "b");
    }
}
