use xdtm::{Axis, Builder, BuilderOptions, Document, Node, StripSpace};

fn text_in(document: &Document, name: &str) -> Node {
    let element = document
        .axis(Axis::Descendant, document.root())
        .find(|node| document.local_name(*node) == name)
        .unwrap();
    document.first_child(element).unwrap()
}

#[test]
fn test_preserve_overrides_default_stripping() {
    let document =
        Document::parse(r#"<a><b xml:space="preserve">  </b><c>  </c></a>"#).unwrap();
    assert!(!document.is_whitespace(text_in(&document, "b")));
    assert!(document.is_whitespace(text_in(&document, "c")));
}

#[test]
fn test_preserve_is_inherited_until_reset() {
    let document = Document::parse(
        r#"<a xml:space="preserve"><b> </b><c xml:space="default"><d> </d></c><e> </e></a>"#,
    )
    .unwrap();
    assert!(!document.is_whitespace(text_in(&document, "b")));
    assert!(document.is_whitespace(text_in(&document, "d")));
    // the override ends with c
    assert!(!document.is_whitespace(text_in(&document, "e")));
}

#[test]
fn test_no_stripping_by_default_option() {
    let options = BuilderOptions {
        strip_whitespace: false,
        ..Default::default()
    };
    let document = Document::parse_with_options("<a><b> </b></a>", options).unwrap();
    assert!(!document.is_whitespace(text_in(&document, "b")));
}

#[test]
fn test_mixed_text_is_not_whitespace() {
    let document = Document::parse("<a><b> x </b></a>").unwrap();
    assert!(!document.is_whitespace(text_in(&document, "b")));
}

#[test]
fn test_ignorable_whitespace_is_honored() {
    let mut builder = Builder::new();
    builder.start_document().unwrap();
    builder.start_element("", "a", "a", &[]).unwrap();
    builder
        .start_element("", "b", "b", &[xdtm::Attribute::new(xdtm::XML_NAMESPACE, "space", "xml:space", "preserve")])
        .unwrap();
    builder.ignorable_whitespace("\n  ").unwrap();
    builder.end_element().unwrap();
    builder.end_element().unwrap();
    let document = builder.end_document().unwrap();
    assert!(document.is_whitespace(text_in(&document, "b")));
}

#[test]
fn test_stripping_wrapper_uses_whitespace_flags() {
    let document =
        Document::parse(r#"<a><b xml:space="preserve">  </b><c>  </c><d>x</d></a>"#).unwrap();
    let a = document.document_element().unwrap();
    let kept = document
        .axis_iter(Axis::Descendant)
        .stripping(None)
        .start_at(a)
        .filter(|node| document.node_value(*node).is_some())
        .count();
    // b's text and d's text survive
    assert_eq!(kept, 2);
}

#[test]
fn test_stripping_wrapper_with_policy() {
    let document = Document::parse("<a><b> </b><c> </c><d>  <e> </e></d></a>").unwrap();
    let policy = StripSpace::new().strip("*").preserve("c");
    let a = document.document_element().unwrap();
    let texts = document
        .axis_iter(Axis::Descendant)
        .stripping(Some(&policy))
        .start_at(a)
        .filter(|node| document.node_value(*node).is_some())
        .map(|node| document.local_name(document.parent(node).unwrap()).to_string())
        .collect::<Vec<_>>();
    assert_eq!(texts, vec!["c"]);
}

#[test]
fn test_stripping_policy_respects_xml_space() {
    let document = Document::parse(r#"<a xml:space="preserve"><b> </b></a>"#).unwrap();
    let policy = StripSpace::new().strip("*");
    let b = document
        .axis(Axis::Descendant, document.root())
        .find(|node| document.local_name(*node) == "b")
        .unwrap();
    assert_eq!(
        document
            .axis_iter(Axis::Child)
            .stripping(Some(&policy))
            .start_at(b)
            .count(),
        1
    );
}

#[test]
fn test_stripping_with_closure() {
    let document = Document::parse("<a><b> </b><c> </c></a>").unwrap();
    let only_b = |document: &Document, element: Node| document.local_name(element) == "b";
    let a = document.document_element().unwrap();
    let texts = document
        .axis_iter(Axis::Descendant)
        .stripping(Some(&only_b))
        .start_at(a)
        .filter(|node| document.node_value(*node).is_some())
        .count();
    assert_eq!(texts, 1);
}

#[test]
fn test_specific_pattern_wins() {
    let document = Document::parse(
        r#"<a xmlns:p="urn:p"><p:b> </p:b><p:c> </p:c><d> </d></a>"#,
    )
    .unwrap();
    let policy = StripSpace::new()
        .preserve("*")
        .strip("{urn:p}*")
        .preserve("{urn:p}c");
    let a = document.document_element().unwrap();
    let kept = document
        .axis_iter(Axis::Descendant)
        .stripping(Some(&policy))
        .start_at(a)
        .filter(|node| document.node_value(*node).is_some())
        .map(|node| document.local_name(document.parent(node).unwrap()).to_string())
        .collect::<Vec<_>>();
    assert_eq!(kept, vec!["c", "d"]);
}
