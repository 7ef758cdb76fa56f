use super::*;
use crate::dom::{parse_html, Document, NodeKind};
use crate::error::TemplateError;
use crate::router::{Route, RouteTable};
use crate::context::Context;
use crate::value::{Bindable, Fields, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup(files: &[(&str, &str)]) -> (TempDir, Renderer) {
    let dir = tempfile::tempdir().unwrap();
    for (name, source) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, source).unwrap();
    }
    let routes = RouteTable::new(vec![
        Route::new("home", "/"),
        Route::new("article", "/article/{slug}"),
    ]);
    let renderer = Renderer::new(dir.path(), routes);
    (dir, renderer)
}

fn render_one(source: &str, bindings: Vec<(&str, Value)>) -> String {
    let (_dir, renderer) = setup(&[("page.html", source)]);
    renderer
        .render("page", &RequestState::new(), bindings)
        .unwrap()
}

struct Article {
    title: &'static str,
    slug: &'static str,
}

impl Bindable for Article {
    fn fields(&self) -> Fields {
        vec![
            ("title".into(), self.title.into()),
            ("slug".into(), self.slug.into()),
        ]
    }
}

#[test]
fn test_expression_in_text() {
    assert_eq!(render_one("<p>{ 1 + 1 }</p>", vec![]), "<p>2</p>");
}

#[test]
fn test_failed_expression_renders_empty() {
    assert_eq!(render_one("<p>a{ missing }b</p>", vec![]), "<p>ab</p>");
}

#[test]
fn test_for_loop() {
    assert_eq!(
        render_one(
            r#"<for value="items"><li>{item}</li></for>"#,
            vec![("items", Value::list(vec!["x", "y"]))]
        ),
        "<li>x</li><li>y</li>"
    );
}

#[test]
fn test_for_empty_and_index() {
    assert_eq!(
        render_one(
            r#"<for value="items"><li>{item}</li></for>"#,
            vec![("items", Value::list(Vec::<Value>::new()))]
        ),
        ""
    );
    assert_eq!(
        render_one(
            r#"<for value="items">{i}</for>"#,
            vec![("items", Value::list(vec!["a", "b", "c"]))]
        ),
        "012"
    );
}

#[test]
fn test_for_binds_record_fields_and_items() {
    let articles = Value::list(vec![
        Value::from_bindable(&Article {
            title: "First",
            slug: "first",
        }),
        Value::from_bindable(&Article {
            title: "Second",
            slug: "second",
        }),
    ]);
    let html = render_one(
        r#"<for value="{articles}"><a href="{url('article', slug=slug)}">{title} {i + 1}/{len(items)}</a></for>"#,
        vec![("articles", articles)],
    );
    assert_eq!(
        html,
        r#"<a href="/article/first">First 1/2</a><a href="/article/second">Second 2/2</a>"#
    );
}

#[test]
fn test_for_over_non_sequence_is_empty() {
    assert_eq!(
        render_one(r#"<for value="n"><b>x</b></for>"#, vec![("n", Value::Int(3))]),
        ""
    );
    assert_eq!(render_one(r#"<for value="nothing">x</for>"#, vec![]), "");
}

#[test]
fn test_for_over_set() {
    assert_eq!(
        render_one(
            r#"<for value="tags">[{item}]</for>"#,
            vec![("tags", Value::set(vec!["a", "b", "a"]))]
        ),
        "[a][b]"
    );
}

#[test]
fn test_yes_and_no() {
    let source = r#"<yes value="flag">Y</yes><no value="flag">N</no>"#;
    assert_eq!(render_one(source, vec![("flag", Value::Bool(true))]), "Y");
    assert_eq!(render_one(source, vec![("flag", Value::Bool(false))]), "N");
    assert_eq!(render_one(source, vec![]), "N");
}

#[test]
fn test_yes_without_value_is_always_true() {
    assert_eq!(render_one("<yes>Y</yes><no>N</no>", vec![]), "Y");
}

#[test]
fn test_control_value_expression_forms() {
    let user = Value::record(vec![("username".into(), "ann".into())]);
    assert_eq!(
        render_one(r#"<yes value="{user}">in</yes>"#, vec![("user", user.clone())]),
        "in"
    );
    assert_eq!(
        render_one(r#"<yes value="{ n > 2 }">big</yes>"#, vec![("n", Value::Int(3))]),
        "big"
    );
    // A string result is looked up again as a binding name
    assert_eq!(
        render_one(
            r#"<yes value="{user.username}">found</yes>"#,
            vec![("user", user)]
        ),
        ""
    );
}

#[test]
fn test_false_yes_between_text_merges() {
    let input = parse_html(r#"a<yes value="flag">X</yes>b"#);
    let cache = DocumentCache::new();
    let mut output = Document::new();
    let root = output.root();
    let ctx = Context::from_bindings([("flag", Value::Bool(false))]);
    Expander::new(&cache, &mut output)
        .expand(Path::new("inline.html"), root, &input, input.root(), &ctx)
        .unwrap();
    assert_eq!(output.children(root).len(), 1);
    assert!(matches!(
        output.kind(output.children(root)[0]),
        NodeKind::Text(t) if t == "ab"
    ));
    assert_eq!(output.to_html(), "ab");
}

#[test]
fn test_input_tree_is_not_mutated() {
    let input = parse_html(r#"<p class="{cls}">{name}</p>"#);
    let before = input.to_html();
    let cache = DocumentCache::new();
    let mut output = Document::new();
    let root = output.root();
    let ctx = Context::from_bindings([("cls", Value::from("x")), ("name", Value::from("Ann"))]);
    Expander::new(&cache, &mut output)
        .expand(Path::new("inline.html"), root, &input, input.root(), &ctx)
        .unwrap();
    assert_eq!(output.to_html(), r#"<p class="x">Ann</p>"#);
    assert_eq!(input.to_html(), before);
}

#[test]
fn test_attribute_rules() {
    let html = render_one(
        r#"<input disabled="{off}" checked="{on}" value="{n}" data-zero="{zero}" title="{empty}" class="" hidden>"#,
        vec![
            ("off", Value::Bool(false)),
            ("on", Value::Bool(true)),
            ("n", Value::Int(3)),
            ("zero", Value::Int(0)),
            ("empty", Value::from("")),
        ],
    );
    assert_eq!(html, r#"<input checked value="3" title class hidden>"#);
}

#[test]
fn test_unquoted_control_value_with_comparison() {
    assert_eq!(
        render_one(
            "<yes value={n > 5}>big</yes><no value={n > 5}>small</no>",
            vec![("n", Value::Int(7))]
        ),
        "big"
    );
}

#[test]
fn test_booleans_render_as_words() {
    assert_eq!(
        render_one("<p>{ok} {not ok}</p>", vec![("ok", Value::Bool(true))]),
        "<p>True False</p>"
    );
}

#[test]
fn test_attribute_interpolation() {
    assert_eq!(
        render_one(
            r#"<a class="nav-link {'active' if active_route == 'home' else ''}">x</a>"#,
            vec![("active_route", Value::from("home"))]
        ),
        r#"<a class="nav-link active">x</a>"#
    );
}

#[test]
fn test_include_with_attributes() {
    let (_dir, renderer) = setup(&[
        (
            "page.html",
            r#"<div><include value="card" who="{name}" kind="plain" flag></div>"#,
        ),
        ("card.html", "<span>{who}:{kind}:{flag}</span>"),
    ]);
    let html = renderer
        .render("page", &RequestState::new(), [("name", Value::from("Ann"))])
        .unwrap();
    assert_eq!(html, "<div><span>Ann:plain:</span></div>");
}

#[test]
fn test_include_resolves_relative_to_including_file() {
    let (_dir, renderer) = setup(&[
        ("page.html", r#"<include value="partials/outer">"#),
        ("partials/outer.html", r#"<b><include value="inner"></b>"#),
        ("partials/inner.html", "<i>{x}</i>"),
    ]);
    let html = renderer
        .render("page", &RequestState::new(), [("x", Value::Int(1))])
        .unwrap();
    assert_eq!(html, "<b><i>1</i></b>");
}

#[test]
fn test_include_name_from_expression() {
    let (_dir, renderer) = setup(&[
        ("page.html", r#"<include value="{which}">"#),
        ("a.html", "A"),
    ]);
    let html = renderer
        .render("page", &RequestState::new(), [("which", Value::from("a"))])
        .unwrap();
    assert_eq!(html, "A");
}

#[test]
fn test_missing_include_is_hard_error() {
    let (_dir, renderer) = setup(&[("page.html", r#"<p>x</p><include value="nope">"#)]);
    let err = renderer
        .render("page", &RequestState::new(), Vec::<(String, Value)>::new())
        .unwrap_err();
    assert!(matches!(err, TemplateError::NotFound { .. }));
}

#[test]
fn test_include_with_non_string_value_is_skipped() {
    let (_dir, renderer) = setup(&[
        (
            "page.html",
            r#"<p>before</p><include value="{ missing_partial }"><include><include value="{ 3 }"><p>after</p>"#,
        ),
    ]);
    let html = renderer
        .render("page", &RequestState::new(), Vec::<(String, Value)>::new())
        .unwrap();
    assert_eq!(html, "<p>before</p><p>after</p>");
}

#[test]
fn test_include_with_blank_name_is_error() {
    let (_dir, renderer) = setup(&[("page.html", r#"<include value="{blank}">"#)]);
    let err = renderer
        .render("page", &RequestState::new(), [("blank", Value::from(""))])
        .unwrap_err();
    assert!(matches!(err, TemplateError::InvalidName(_)));
}

#[test]
fn test_self_include_fails_with_depth_error() {
    let (_dir, renderer) = setup(&[("page.html", r#"<p>x</p><include value="page">"#)]);
    let err = renderer
        .render("page", &RequestState::new(), Vec::<(String, Value)>::new())
        .unwrap_err();
    match err {
        TemplateError::IncludeDepth { path } => assert!(path.ends_with("page.html")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_bounded_recursive_include() {
    let (_dir, renderer) = setup(&[(
        "page.html",
        r#"<yes value="{n > 0}">{n}<include value="page" n="{n - 1}"></yes>"#,
    )]);
    let html = renderer
        .render("page", &RequestState::new(), [("n", Value::Int(3))])
        .unwrap();
    assert_eq!(html, "321");
}

#[test]
fn test_missing_template_is_hard_error() {
    let (_dir, renderer) = setup(&[]);
    let err = renderer
        .render("absent", &RequestState::new(), Vec::<(String, Value)>::new())
        .unwrap_err();
    assert!(matches!(err, TemplateError::NotFound { .. }));
}

#[test]
fn test_whitespace_between_elements_disappears() {
    assert_eq!(
        render_one("<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>\n", vec![]),
        "<ul><li>a</li><li>b</li></ul>"
    );
}

#[test]
fn test_html_root_gets_doctype() {
    assert_eq!(
        render_one("<html><body>{x}</body></html>", vec![("x", Value::Int(1))]),
        "<!DOCTYPE html><html><body>1</body></html>"
    );
}

#[test]
fn test_root_context_builtins_and_precedence() {
    let (_dir, renderer) = setup(&[(
        "page.html",
        "{ceil(2.5)}|{active_route}|{slug}|{title}|{user.username}",
    )]);
    let matched = renderer.routes().match_path("/article/hello").unwrap();
    let state = RequestState::from_match(&matched)
        .with_user(Value::record(vec![("username".into(), "ann".into())]))
        .with_computed("title", Value::from("computed"));
    let html = renderer
        .render("page", &state, Vec::<(String, Value)>::new())
        .unwrap();
    assert_eq!(html, "3|article|hello|computed|ann");

    let html = renderer
        .render("page", &state, [("title", Value::from("caller"))])
        .unwrap();
    assert_eq!(html, "3|article|hello|caller|ann");
}

#[test]
fn test_ftime_uses_request_offset() {
    let (_dir, renderer) = setup(&[("page.html", "{ftime(0)}")]);
    let renderer = renderer.with_datetime_format("%H:%M");
    let state = RequestState::new().with_tz_offset(-60);
    let html = renderer
        .render("page", &state, Vec::<(String, Value)>::new())
        .unwrap();
    assert_eq!(html, "01:00");
}
