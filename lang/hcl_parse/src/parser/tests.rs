use hcl_ir::{File, ListType, LiteralType, Node, ObjectItem, ObjectKey, ObjectType, TokenKind};
use pretty_assertions::assert_eq;

use super::{parse, Parser};
use crate::ParseError;

fn parse_file(src: &str) -> File {
    match Parser::new(src.as_bytes()).parse() {
        Ok(file) => file,
        Err(err) => panic!("parse failed for {src:?}: {err}"),
    }
}

fn parse_item(src: &str) -> ObjectItem {
    match Parser::new(src.as_bytes()).object_item() {
        Ok(item) => item,
        Err(err) => panic!("object_item failed for {src:?}: {err}"),
    }
}

fn parse_keys(src: &str) -> Vec<ObjectKey> {
    match Parser::new(src.as_bytes()).object_key() {
        Ok(keys) => keys,
        Err(err) => panic!("object_key failed for {src:?}: {err}"),
    }
}

fn item_val(item: &ObjectItem) -> &Node {
    match &item.val {
        Some(val) => val,
        None => panic!("item has no value: {item:?}"),
    }
}

fn as_literal(node: &Node) -> &LiteralType {
    match node {
        Node::Literal(lit) => lit,
        other => panic!("expected a literal, got {other:?}"),
    }
}

fn as_list(node: &Node) -> &ListType {
    match node {
        Node::List(list) => list,
        other => panic!("expected a list, got {other:?}"),
    }
}

fn as_object(node: &Node) -> &ObjectType {
    match node {
        Node::Object(obj) => obj,
        other => panic!("expected an object, got {other:?}"),
    }
}

fn node_kind(node: &Node) -> &'static str {
    match node {
        Node::Literal(_) => "literal",
        Node::List(_) => "list",
        Node::Object(_) => "object",
    }
}

#[test]
fn test_literal_kinds() {
    let literals = [
        (TokenKind::String, r#"foo = "foo""#),
        (TokenKind::Number, "foo = 123"),
        (TokenKind::Number, "foo = -29"),
        (TokenKind::Float, "foo = 123.12"),
        (TokenKind::Float, "foo = -123.12"),
        (TokenKind::Bool, "foo = true"),
        (TokenKind::Heredoc, "foo = <<EOF\nHello\nWorld\nEOF"),
    ];

    for (kind, src) in literals {
        let item = parse_item(src);
        let lit = as_literal(item_val(&item));
        assert_eq!(lit.token.kind, kind, "bad token kind for {src:?}");
    }
}

#[test]
fn test_list_kinds() {
    let cases: [(&str, &[TokenKind]); 5] = [
        (
            r#"foo = ["123", 123]"#,
            &[TokenKind::String, TokenKind::Number],
        ),
        (
            r#"foo = [123, "123",]"#,
            &[TokenKind::Number, TokenKind::String],
        ),
        ("foo = [false]", &[TokenKind::Bool]),
        ("foo = []", &[]),
        (
            "foo = [1,\n\t\"string\",\n\t<<EOF\n\theredoc contents\n\tEOF\n\t]",
            &[TokenKind::Number, TokenKind::String, TokenKind::Heredoc],
        ),
    ];

    for (src, want) in cases {
        let item = parse_item(src);
        let list = as_list(item_val(&item));
        let got: Vec<TokenKind> = list
            .list
            .iter()
            .filter_map(|node| match node {
                Node::Literal(lit) => Some(lit.token.kind),
                _ => None,
            })
            .collect();
        assert_eq!(got, want, "bad element kinds for {src:?}");
    }
}

#[test]
fn test_list_of_maps() {
    let src = "foo = [\n    {key = \"bar\"},\n    {key = \"baz\", key2 = \"qux\"},\n]";
    let file = parse_file(src);

    // Walk the expected structure and collect the literal texts, so the
    // test checks a bit more than "no error occurred".
    let list = as_list(item_val(&file.node.items[0]));
    let mut actual: Vec<String> = Vec::new();
    for node in &list.list {
        let obj = as_object(node);
        for item in &obj.list.items {
            actual.push(as_literal(item_val(item)).token.text.clone());
        }
    }

    assert_eq!(actual, [r#""bar""#, r#""baz""#, r#""qux""#]);
}

#[test]
fn test_list_of_maps_requires_comma() {
    let src = "foo = [\n    {key = \"bar\"}\n    {key = \"baz\"}\n]";
    match Parser::new(src.as_bytes()).parse() {
        Ok(file) => panic!("expected error, got {file:?}"),
        Err(err) => assert!(
            err.to_string()
                .contains("error parsing list, expected comma or list end"),
            "unexpected error: {err}"
        ),
    }
}

#[test]
fn test_list_lead_comment() {
    let src = "foo = [\n1,\n# bar\n2,\n3,\n]";
    let item = parse_item(src);
    let list = as_list(item_val(&item));
    let want = ["", "# bar", ""];

    assert_eq!(list.list.len(), want.len());
    for (node, want) in list.list.iter().zip(want) {
        let lit = as_literal(node);
        match (&lit.lead_comment, want) {
            (None, "") => {}
            (Some(group), want) if !want.is_empty() => {
                assert_eq!(group.list[0].text, want);
            }
            (got, want) => panic!("bad lead comment: got {got:?}, want {want:?}"),
        }
    }
}

#[test]
fn test_list_line_comment() {
    let src = "foo = [\n1,\n2, # bar\n3,\n]";
    let item = parse_item(src);
    let list = as_list(item_val(&item));
    let want = ["", "# bar", ""];

    assert_eq!(list.list.len(), want.len());
    for (node, want) in list.list.iter().zip(want) {
        let lit = as_literal(node);
        match (&lit.line_comment, want) {
            (None, "") => {}
            (Some(group), want) if !want.is_empty() => {
                assert_eq!(group.list[0].text, want);
            }
            (got, want) => panic!("bad line comment: got {got:?}, want {want:?}"),
        }
    }
}

#[test]
fn test_object_type() {
    let cases: [(&str, &[&str]); 5] = [
        ("foo = {}", &[]),
        ("foo = {\n    bar = \"fatih\"\n}", &["literal"]),
        (
            "foo = {\n    bar = \"fatih\"\n    baz = [\"arslan\"]\n}",
            &["literal", "list"],
        ),
        ("foo = {\n    bar {}\n}", &["object"]),
        (
            "foo {\n    bar {}\n    foo = true\n}",
            &["object", "literal"],
        ),
    ];

    for (src, kinds) in cases {
        let item = parse_item(src);
        let obj = as_object(item_val(&item));

        assert_eq!(obj.list.items.len(), kinds.len(), "bad item count for {src:?}");
        for (item, want) in obj.list.items.iter().zip(kinds) {
            assert_eq!(node_kind(item_val(item)), *want, "bad value kind in {src:?}");
        }
    }
}

#[test]
fn test_object_key() {
    let cases: [(&str, &[TokenKind]); 12] = [
        ("foo {}", &[TokenKind::Ident]),
        ("foo = {}", &[TokenKind::Ident]),
        ("foo = bar", &[TokenKind::Ident]),
        ("foo = 123", &[TokenKind::Ident]),
        ("foo = \"${var.bar}", &[TokenKind::Ident]),
        (r#""foo" {}"#, &[TokenKind::String]),
        (r#""foo" = {}"#, &[TokenKind::String]),
        ("\"foo\" = \"${var.bar}", &[TokenKind::String]),
        ("foo bar {}", &[TokenKind::Ident, TokenKind::Ident]),
        (r#"foo "bar" {}"#, &[TokenKind::Ident, TokenKind::String]),
        (r#""foo" bar {}"#, &[TokenKind::String, TokenKind::Ident]),
        (
            "foo bar baz {}",
            &[TokenKind::Ident, TokenKind::Ident, TokenKind::Ident],
        ),
    ];

    for (src, want) in cases {
        let keys = parse_keys(src);
        let got: Vec<TokenKind> = keys.iter().map(|k| k.token.kind).collect();
        assert_eq!(got, want, "bad keys for {src:?}");
    }

    let err_cases = ["foo 12 {}", "foo bar = {}", "foo []", "12 {}"];
    for src in err_cases {
        match Parser::new(src.as_bytes()).object_key() {
            Ok(keys) => panic!("case {src:?} should give an error, got {keys:?}"),
            Err(ParseError::Pos { .. }) => {}
            Err(err) => panic!("case {src:?} should give a position error, got {err}"),
        }
    }
}

#[test]
fn test_comment_group() {
    let cases = [("# Hello\n# World", 1), ("# Hello\r\n# Windows", 1)];

    for (src, groups) in cases {
        let file = parse_file(src);
        assert_eq!(file.comments.len(), groups, "bad group count for {src:?}");
    }
}

fn expect_parse(name: &str, src: &[u8], want_err: bool) {
    let result = parse(src);
    assert_eq!(
        result.is_err(),
        want_err,
        "{name}: unexpected outcome {result:?}"
    );
}

#[test]
fn test_parse_corpus() {
    expect_parse("empty", b"", false);
    expect_parse("comment single", b"# Hello\n", false);
    expect_parse("comment lastline", b"#foo", false);
    expect_parse(
        "comment",
        b"// Foo\n\n/* Bar */\n\n/*\n/*\nBaz\n*/\n\n# Another\n\n# Multiple\n# Lines\n\nfoo = \"bar\"\n",
        false,
    );
    expect_parse(
        "comment crlf",
        b"// Foo\r\n\r\n/* Bar */\r\n\r\nfoo = \"bar\"\r\n",
        false,
    );
    expect_parse("list comma", b"foo = [1, 2]\n", false);
    expect_parse("multiple", b"foo = \"bar\"\nkey = 7\n", false);
    expect_parse("object list comma", b"foo = {one = 1, two = 2}\n", false);
    expect_parse(
        "structure",
        b"// This is a test structure for the parser\nresource \"baz\" {\n    foo = \"bar\"\n    bar = 7\n    baz = [1, 2, 3]\n}\n",
        false,
    );
    expect_parse(
        "structure basic",
        b"resource {\n    value = 7\n    \"value\" = 8\n    \"complex::value\" = 9\n}\n",
        false,
    );
    expect_parse("structure empty", b"resource \"foo\" \"bar\" {}\n", false);
    expect_parse(
        "types",
        b"foo = \"bar\"\nbar = 7\nbaz = [1, 2, 3]\nfoo = -12\nbar = 3.14159\nfoo = true\nbar = false\nfoo = -1.2\n",
        false,
    );
    expect_parse(
        "array comment",
        b"foo = [\n    \"1\",\n    \"2\", # comment\n]\n",
        false,
    );

    let complex = "\
variable \"foo\" {\n\
    default = \"bar\"\n\
    description = \"bar\"\n\
}\n\
\n\
provider \"aws\" {\n\
    access_key = \"foo\"\n\
    secret_key = \"bar\"\n\
}\n\
\n\
resource \"aws_security_group\" \"firewall\" {\n\
    count = 5\n\
}\n\
\n\
resource aws_instance \"web\" {\n\
    ami = \"${var.foo}\"\n\
    security_groups = [\n\
        \"foo\",\n\
        \"${aws_security_group.firewall.foo}\"\n\
    ]\n\
\n\
    network_interface {\n\
        device_index = 0\n\
        description = \"Main network interface\"\n\
    }\n\
}\n\
\n\
output \"web_ip\" {\n\
    value = \"${aws_instance.web.private_ip}\"\n\
}\n";
    expect_parse("complex", complex.as_bytes(), false);
    expect_parse(
        "complex crlf",
        complex.replace('\n', "\r\n").as_bytes(),
        false,
    );

    expect_parse(
        "assign colon",
        b"resource = [{\n    \"foo\": {\n        \"bar\": {},\n        \"baz\": [1, 2, \"foo\"],\n    }\n}]\n",
        true,
    );
    expect_parse(
        "array missing comma",
        b"provisioner \"remote-exec\" {\n    scripts = [\n        \"${path.module}/scripts/install-consul.sh\" // missing comma\n        \"${path.module}/scripts/install-haproxy.sh\"\n    ]\n}\n",
        true,
    );
    expect_parse(
        "missing braces",
        b"# this file has no closing braces\nresource \"aws-instance\" \"web\" {\nami = \"${var.foo}\"\n",
        true,
    );
    expect_parse(
        "unterminated object",
        b"foo \"baz\" {\n    bar = \"baz\"\n",
        true,
    );
    expect_parse(
        "unterminated object 2",
        b"resource \"aws_eip\" \"EIP1\" {\n    count = \"1\"\n}\n\nresource \"aws_eip\" \"EIP2\" {\n    count = \"2\"\n",
        true,
    );
    expect_parse("key without value", b"foo\n", true);
    expect_parse("object key without value", b"foo = {\n    bar\n}\n", true);
    expect_parse(
        "object key assign without value",
        b"foo = {\n    bar =\n}\n",
        true,
    );
    expect_parse(
        "object key assign without value 2",
        b"foo = {\n    bar =\n    baz = 7\n}\n",
        true,
    );
    expect_parse(
        "object key assign without value 3",
        b"foo = {\n    bar = 7\n    baz =\n}\n",
        true,
    );
    expect_parse(
        "binary garbage",
        b"\x00GITCRYPT\x00\xc9\x10\xb7\xd0\x01\x02",
        true,
    );
}

#[test]
fn test_parse_inline_errors() {
    let cases = [
        "t t e{{}}",
        "o{{}}",
        "t t e d N{{}}",
        "t t e d{{}}",
        "N{}N{{}}",
        "v\nN{{}}",
        "v=/\n[,",
        "v=10kb",
        "v=/foo",
    ];

    for src in cases {
        assert!(
            parse(src.as_bytes()).is_err(),
            "input {src:?} should fail to parse"
        );
    }
}

#[test]
fn test_item_line_comment() {
    let src = "foo = \"bar\" # doc\nbaz = 1\n";
    let file = parse_file(src);

    let item = &file.node.items[0];
    match &item.line_comment {
        Some(group) => assert_eq!(group.list[0].text, "# doc"),
        None => panic!("line comment not attached: {item:?}"),
    }
    assert!(file.node.items[1].line_comment.is_none());
}

#[test]
fn test_item_lead_comment() {
    let src = "# about foo\nfoo = \"bar\"\n";
    let file = parse_file(src);

    let item = &file.node.items[0];
    match &item.lead_comment {
        Some(group) => assert_eq!(group.list[0].text, "# about foo"),
        None => panic!("lead comment not attached: {item:?}"),
    }
}
