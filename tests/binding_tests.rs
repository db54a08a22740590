//! # Live binding tests
//!
//! End-to-end behavior of templates bound to context records:
//! - initial rendering (literals, missing paths, functions, chains)
//! - text and attribute updates on `Record::set`
//! - deep path replacement
//! - one context shared by many fragments, many contexts kept apart

use serde_json::json;
use stache_bind::{install, install_as, template, Record, TemplateSet, Value};

// ============================================================================
// TEST HELPERS
// ============================================================================

fn templates(document: &str) -> TemplateSet {
    TemplateSet::from_document(document).unwrap()
}

fn record(value: serde_json::Value) -> Record {
    Record::from_json(value).unwrap()
}

fn child(record: &Record, field: &str) -> Record {
    record.get(field).unwrap().as_record().cloned().unwrap()
}

const BASIC: &str = r#"
<template data-name="simple"><p>{{ name }}</p></template>
<template data-name="chains"><p>{{ user.id }}</p></template>
<template data-name="literal"><p class="x">Just <b>text</b> here</p></template>"#;

const BOUND: &str = r#"
<template data-name="simple">
  <p class="{{ login }}">{{ name }}</p>
</template>
<template data-name="chains">
  <p>{{ user.avatar.url }}</p>
</template>"#;

// ============================================================================
// INITIAL RENDER
// ============================================================================

#[test]
fn literal_template_renders_its_source_text() {
    let set = templates(BASIC);
    let literal = template(&set, "literal").unwrap();

    for ctx in [Record::new(), record(json!({"name": "Hubot"}))] {
        let fragment = literal.evaluate(&ctx).unwrap();
        assert_eq!(fragment.text_content(), "Just text here");
        assert_eq!(fragment.to_html(), r#"<p class="x">Just <b>text</b> here</p>"#);
    }
}

#[test]
fn replaces_a_property_with_its_value() {
    let simple = template(&templates(BASIC), "simple").unwrap();
    let fragment = simple.evaluate(&record(json!({"name": "Hubot"}))).unwrap();
    assert_eq!(fragment.text_content(), "Hubot");
}

#[test]
fn replaces_a_property_with_a_function_result() {
    let simple = template(&templates(BASIC), "simple").unwrap();
    let ctx = Record::new().with("name", Value::function(|| Ok("Hubot".into())));
    let fragment = simple.evaluate(&ctx).unwrap();
    assert_eq!(fragment.text_content(), "Hubot");
}

#[test]
fn replaces_missing_property_with_empty_string() {
    let simple = template(&templates(BASIC), "simple").unwrap();
    let fragment = simple.evaluate(&Record::new()).unwrap();
    assert_eq!(fragment.text_content(), "");
}

#[test]
fn resolves_property_lookup_chains() {
    let chains = template(&templates(BASIC), "chains").unwrap();
    let fragment = chains.evaluate(&record(json!({"user": {"id": 42}}))).unwrap();
    assert_eq!(fragment.text_content(), "42");
}

#[test]
fn falsy_values_render_empty() {
    let mut set = TemplateSet::new();
    set.insert("flags", "<p>{{ count }}|{{ flag }}|{{ s }}</p>")
        .unwrap();
    let flags = template(&set, "flags").unwrap();
    let ctx = record(json!({"count": 0, "flag": false, "s": ""}));
    let fragment = flags.evaluate(&ctx).unwrap();
    assert_eq!(fragment.text_content(), "||");

    ctx.set("count", 3).unwrap();
    ctx.set("flag", true).unwrap();
    assert_eq!(fragment.text_content(), "3|true|");

    ctx.set("count", 0).unwrap();
    assert_eq!(fragment.text_content(), "|true|");
}

#[test]
fn self_containing_record_renders_without_recursing() {
    let mut set = TemplateSet::new();
    set.insert("me", "<p>{{ me }}</p>").unwrap();
    let me = template(&set, "me").unwrap();
    let ctx = record(json!({"name": "Hubot"}));
    ctx.insert("me", Value::Record(ctx.clone()));

    let fragment = me.evaluate(&ctx).unwrap();
    assert!(fragment.text_content().contains(r#""me":null"#));
}

#[test]
fn rendered_values_are_escaped() {
    let simple = template(&templates(BASIC), "simple").unwrap();
    let fragment = simple
        .evaluate(&record(json!({"name": "<script>x</script>"})))
        .unwrap();
    assert_eq!(fragment.text_content(), "&lt;script&gt;x&lt;/script&gt;");
    assert!(!fragment.to_html().contains("<script>"));
}

// ============================================================================
// REGISTRY
// ============================================================================

#[test]
fn installs_to_templates_namespace() {
    let set = templates(
        r#"<template data-name="avatar"></template>
           <template data-name="user"></template>"#,
    );
    let registry = install(&set).unwrap();
    assert_eq!(registry.namespace(), "Templates");
    assert!(registry.get("avatar").is_some());
    assert!(registry.get("user").is_some());

    let custom = install_as(&set, "Mustaches").unwrap();
    assert_eq!(custom.namespace(), "Mustaches");
    assert!(custom.get("avatar").is_some());
}

// ============================================================================
// DATA BINDING
// ============================================================================

#[test]
fn updates_text_nodes_on_model_changes() {
    let simple = template(&templates(BOUND), "simple").unwrap();
    let user = record(json!({"name": "Hubot"}));
    let fragment = simple.evaluate(&user).unwrap();
    assert_eq!(fragment.text_content().trim(), "Hubot");

    user.set("name", "Bender").unwrap();

    assert_eq!(fragment.text_content().trim(), "Bender");
}

#[test]
fn updates_attributes_on_model_changes() {
    let simple = template(&templates(BOUND), "simple").unwrap();
    let user = record(json!({"name": "Hubot", "login": "hubot"}));
    let fragment = simple.evaluate(&user).unwrap();
    let p = fragment.first_element_child().unwrap();
    assert!(p.class_list().contains(&"hubot".to_string()));

    user.set("login", "bender").unwrap();

    let classes = p.class_list();
    assert!(classes.contains(&"bender".to_string()));
    assert!(!classes.contains(&"hubot".to_string()));
}

#[test]
fn observes_deep_hierarchy_changes() {
    let chains = template(&templates(BOUND), "chains").unwrap();
    let ctx = record(json!({"user": {"avatar": {"url": "/hubot.png"}}}));
    let fragment = chains.evaluate(&ctx).unwrap();
    assert_eq!(fragment.text_content().trim(), "/hubot.png");

    child(&ctx, "user")
        .set("avatar", record(json!({"url": "/bender.png"})))
        .unwrap();
    assert_eq!(fragment.text_content().trim(), "/bender.png");

    ctx.set("user", record(json!({"avatar": {"url": "/bb-8.png"}})))
        .unwrap();
    assert_eq!(fragment.text_content().trim(), "/bb-8.png");
}

#[test]
fn observes_a_single_model_with_multiple_views() {
    let simple = template(&templates(BOUND), "simple").unwrap();
    let user = record(json!({"name": "Hubot"}));
    let first = simple.evaluate(&user).unwrap();
    let second = simple.evaluate(&user).unwrap();
    assert_eq!(first.text_content().trim(), "Hubot");
    assert_eq!(second.text_content().trim(), "Hubot");

    user.set("name", "Bender").unwrap();

    assert_eq!(first.text_content().trim(), "Bender");
    assert_eq!(second.text_content().trim(), "Bender");
}

#[test]
fn separate_contexts_stay_independent() {
    let simple = template(&templates(BOUND), "simple").unwrap();
    let hubot = record(json!({"name": "Hubot"}));
    let bender = record(json!({"name": "Bender"}));
    let first = simple.evaluate(&hubot).unwrap();
    let second = simple.evaluate(&bender).unwrap();

    hubot.set("name", "BB-8").unwrap();

    assert_eq!(first.text_content().trim(), "BB-8");
    assert_eq!(second.text_content().trim(), "Bender");
}

#[test]
fn late_field_renders_once_written() {
    let chains = template(&templates(BOUND), "chains").unwrap();
    let ctx = Record::new();
    let fragment = chains.evaluate(&ctx).unwrap();
    assert_eq!(fragment.text_content().trim(), "");

    ctx.set("user", record(json!({"avatar": {"url": "/late.png"}})))
        .unwrap();
    assert_eq!(fragment.text_content().trim(), "/late.png");
}

#[test]
fn replaced_record_is_observed_after_a_new_binding_walks_it() {
    let chains = template(&templates(BOUND), "chains").unwrap();
    let ctx = record(json!({"user": {"avatar": {"url": "/hubot.png"}}}));
    let fragment = chains.evaluate(&ctx).unwrap();

    ctx.set("user", record(json!({"avatar": {"url": "/bb-8.png"}})))
        .unwrap();
    let replacement = child(&ctx, "user");

    // No binding has walked the replacement yet: its fields are plain
    assert!(!replacement.is_intercepted("avatar"));
    replacement
        .set("avatar", record(json!({"url": "/unseen.png"})))
        .unwrap();
    assert_eq!(fragment.text_content().trim(), "/bb-8.png");

    // A fresh evaluation descends through the replacement and intercepts it
    let second = chains.evaluate(&ctx).unwrap();
    assert_eq!(second.text_content().trim(), "/unseen.png");
    replacement
        .set("avatar", record(json!({"url": "/seen.png"})))
        .unwrap();
    assert_eq!(fragment.text_content().trim(), "/seen.png");
    assert_eq!(second.text_content().trim(), "/seen.png");
}

#[test]
fn multi_expression_attribute_keeps_last_written_value() {
    let mut set = TemplateSet::new();
    set.insert("badge", r#"<span class="badge {{ kind }} {{ size }}"></span>"#)
        .unwrap();
    let badge = template(&set, "badge").unwrap();
    let ctx = record(json!({"kind": "info", "size": "large"}));
    let fragment = badge.evaluate(&ctx).unwrap();
    let span = fragment.first_element_child().unwrap();

    // Each expression overwrites the whole attribute with its own value
    assert_eq!(span.get_attribute("class").as_deref(), Some("large"));

    ctx.set("kind", "warning").unwrap();
    assert_eq!(span.get_attribute("class").as_deref(), Some("warning"));
}

#[test]
fn shared_nested_record_notifies_first_context_only() {
    let chains = template(&templates(BASIC), "chains").unwrap();
    let user = record(json!({"id": "hubot"}));
    let first = Record::new().with("user", user.clone());
    let second = Record::new().with("user", user.clone());
    let a = chains.evaluate(&first).unwrap();
    let b = chains.evaluate(&second).unwrap();

    user.set("id", "bender").unwrap();

    // The shared field keeps the hook of the first tree that walked it
    assert_eq!(a.text_content(), "bender");
    assert_eq!(b.text_content(), "hubot");
}

#[test]
fn function_failure_propagates_from_set() {
    let simple = template(&templates(BOUND), "simple").unwrap();
    let user = record(json!({"name": "Hubot"}));
    let _fragment = simple.evaluate(&user).unwrap();

    let failing = Value::function(|| Err(anyhow::anyhow!("offline")));
    assert!(user.set("name", failing).is_err());
}
