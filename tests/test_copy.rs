use insta::assert_snapshot;
use xdtm::{fixed, Axis, Builder, Document, Error, Output, OutputSink};

#[derive(Default)]
struct Recorder(Vec<String>);

impl Recorder {
    fn render(&self) -> String {
        self.0.join(" ")
    }
}

impl OutputSink for Recorder {
    fn start_element(&mut self, _: &str, _: &str, qname: &str) -> Result<(), Error> {
        self.0.push(format!("<{}", qname));
        Ok(())
    }
    fn namespace(&mut self, prefix: &str, namespace_uri: &str) -> Result<(), Error> {
        self.0.push(format!("ns {}={}", prefix, namespace_uri));
        Ok(())
    }
    fn attribute(&mut self, namespace_uri: &str, _: &str, qname: &str, value: &str) -> Result<(), Error> {
        if namespace_uri.is_empty() {
            self.0.push(format!("@{}={}", qname, value));
        } else {
            self.0.push(format!("@{}{{{}}}={}", qname, namespace_uri, value));
        }
        Ok(())
    }
    fn characters(&mut self, text: &str) -> Result<(), Error> {
        self.0.push(format!("{:?}", text));
        Ok(())
    }
    fn comment(&mut self, text: &str) -> Result<(), Error> {
        self.0.push(format!("<!--{}-->", text));
        Ok(())
    }
    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), Error> {
        self.0.push(format!("<?{} {}?>", target, data));
        Ok(())
    }
    fn end_element(&mut self, _: &str, _: &str, qname: &str) -> Result<(), Error> {
        self.0.push(format!("</{}", qname));
        Ok(())
    }
}

const SOURCE: &str =
    r#"<a xmlns:p="urn:p" x="1"><p:b p:y="2">t<!--c--><?pi d?><c/></p:b></a>"#;

#[test]
fn test_copy_subtree() {
    let document = Document::parse(SOURCE).unwrap();
    let a = document.document_element().unwrap();
    let b = document.first_child(a).unwrap();
    let mut recorder = Recorder::default();
    document.copy(b, &mut recorder).unwrap();
    assert_snapshot!(recorder.render(), @r#"<p:b ns p=urn:p @p:y{urn:p}=2 "t" <!--c--> <?pi d?> <c </c </p:b"#);
}

#[test]
fn test_copy_whole_document() {
    let document = Document::parse(SOURCE).unwrap();
    let mut recorder = Recorder::default();
    document.copy(document.root(), &mut recorder).unwrap();
    assert_snapshot!(recorder.render(), @r#"<a ns p=urn:p @x=1 <p:b @p:y{urn:p}=2 "t" <!--c--> <?pi d?> <c </c </p:b </a"#);
}

#[test]
fn test_shallow_copy() {
    let document = Document::parse(SOURCE).unwrap();
    let a = document.document_element().unwrap();
    let b = document.first_child(a).unwrap();
    let mut recorder = Recorder::default();
    document.shallow_copy(b, &mut recorder).unwrap();
    let x = document.axis(Axis::Attribute, a).next().unwrap();
    document.shallow_copy(x, &mut recorder).unwrap();
    assert_snapshot!(recorder.render(), @"<p:b ns p=urn:p </p:b @x=1");
}

#[test]
fn test_outputs() {
    let document = Document::parse("<a><b>text</b></a>").unwrap();
    let a = document.document_element().unwrap();
    let b = document.first_child(a).unwrap();
    let outputs = document.outputs(a).collect::<Vec<_>>();
    assert_eq!(
        outputs,
        vec![
            Output::StartElement(a),
            Output::StartElement(b),
            Output::Text("text"),
            Output::EndElement(b),
            Output::EndElement(a),
        ]
    );
}

#[test]
fn test_copy_round_trip() {
    let document = Document::parse(
        r#"<!--before--><a xmlns="urn:d" xmlns:p="urn:p" x="1" p:y="2"><p:b z="3">one<c/>two</p:b><?pi data?></a>"#,
    )
    .unwrap();
    let mut builder = Builder::new();
    document.copy(document.root(), &mut builder).unwrap();
    let copy = builder.end_document().unwrap();

    assert_eq!(
        fixed::Document::from_document(&copy).unwrap(),
        fixed::Document::from_document(&document).unwrap()
    );
}

#[test]
fn test_copy_round_trip_attribute_set() {
    let document = Document::parse(r#"<a x="1" y="2" z="3"><b q="4"/></a>"#).unwrap();
    let mut builder = Builder::new();
    document.copy(document.root(), &mut builder).unwrap();
    let copy = builder.end_document().unwrap();

    let attributes = |document: &Document| {
        let mut pairs = document
            .axis(Axis::Descendant, document.root())
            .flat_map(|element| {
                document.axis(Axis::Attribute, element).map(move |attribute| {
                    (
                        document.node_name(element),
                        document.node_name(attribute),
                        document.node_value(attribute).unwrap().to_string(),
                    )
                })
            })
            .collect::<Vec<_>>();
        pairs.sort();
        pairs
    };
    assert_eq!(attributes(&copy), attributes(&document));
    assert_eq!(attributes(&copy).len(), 4);
}

#[test]
fn test_copy_subtree_into_new_document() {
    let document = Document::parse(r#"<a xmlns:p="urn:p"><p:b>text</p:b></a>"#).unwrap();
    let a = document.document_element().unwrap();
    let b = document.first_child(a).unwrap();
    let mut builder = Builder::new();
    document.copy(b, &mut builder).unwrap();
    let copy = builder.end_document().unwrap();
    let b = copy.document_element().unwrap();
    assert_eq!(copy.node_name(b), "p:b");
    assert_eq!(copy.namespace_uri(b), "urn:p");
    assert_eq!(copy.string_value(b), "text");
    // the inherited declaration moved onto the copied element
    assert_eq!(
        copy.declared_namespaces(b).collect::<Vec<_>>(),
        vec![("p", "urn:p")]
    );
}
