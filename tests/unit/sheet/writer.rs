use super::*;

const SHEET: &str = r##"<svg xmlns="http://www.w3.org/2000/svg"
     xmlns:xlink="http://www.w3.org/1999/xlink"
     xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"
     viewBox="0 0 200 100">
  <defs><path id="dot" d="M0,0 L1,1"/></defs>
  <g id="a" inkscape:label="Head &amp; hat"><use xlink:href="#dot" x="3"/><!-- note --></g>
  <g id="b"><text xml:space="preserve">1 &lt; 2</text></g>
</svg>"##;

fn top_groups<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
) -> Vec<roxmltree::Node<'a, 'input>> {
    doc.root_element()
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "g")
        .collect()
}

#[test]
fn escape_covers_markup_characters() {
    let mut out = String::new();
    escape_xml_into(&mut out, r#"a<b>&"c""#);
    assert_eq!(out, "a&lt;b&gt;&amp;&quot;c&quot;");
}

#[test]
fn fmt_num_drops_trailing_zero_fraction() {
    assert_eq!(fmt_num(8.0), "8");
    assert_eq!(fmt_num(12.5), "12.5");
    assert_eq!(fmt_num(-0.0), "0");
    assert_eq!(fmt_num(f64::NAN), "0");
}

#[test]
fn write_node_keeps_prefixes_and_escapes() {
    let doc = roxmltree::Document::parse(SHEET).unwrap();
    let ns = Namespaces::from_root(doc.root_element());
    let groups = top_groups(&doc);

    let mut out = String::new();
    write_node(&mut out, groups[0], &ns);
    assert_eq!(
        out,
        r##"<g id="a" inkscape:label="Head &amp; hat"><use xlink:href="#dot" x="3"/></g>"##
    );

    let mut out = String::new();
    write_node(&mut out, groups[1], &ns);
    assert_eq!(
        out,
        r#"<g id="b"><text xml:space="preserve">1 &lt; 2</text></g>"#
    );
}

#[test]
fn written_document_reparses_with_same_groups() {
    let doc = roxmltree::Document::parse(SHEET).unwrap();
    let root = doc.root_element();
    let ns = Namespaces::from_root(root);
    let shared: Vec<_> = root
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "defs")
        .collect();

    let svg = write_document(
        DocumentFrame {
            view_box: Rect::new(10.0, 20.0, 60.0, 50.0),
            width: 50.0,
            height: 30.0,
            wrap_group: true,
        },
        &ns,
        &shared,
        top_groups(&doc),
    );
    assert!(svg.contains(r#"viewBox="10 20 50 30" width="50" height="30""#));
    assert!(svg.contains(r#"xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape""#));

    let reparsed = roxmltree::Document::parse(&svg).unwrap();
    let out_root = reparsed.root_element();
    let wrapper = out_root
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "g")
        .unwrap();
    let ids: Vec<_> = wrapper
        .children()
        .filter(|n| n.is_element())
        .map(|n| n.attribute("id").unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!(
        out_root
            .children()
            .any(|n| n.is_element() && n.tag_name().name() == "defs")
    );
}

#[test]
fn namespaces_absorb_nested_declarations() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><g xmlns:sodipodi="urn:sodi" sodipodi:role="x"/></svg>"#;
    let doc = roxmltree::Document::parse(svg).unwrap();
    let mut ns = Namespaces::from_root(doc.root_element());
    let g = doc.root_element().first_element_child().unwrap();

    let mut before = String::new();
    write_node(&mut before, g, &ns);
    assert_eq!(before, "<g/>");

    ns.absorb(g);
    let mut after = String::new();
    write_node(&mut after, g, &ns);
    assert_eq!(after, r#"<g sodipodi:role="x"/>"#);
}

#[test]
fn foreign_default_namespace_is_redeclared() {
    let text = r#"<svg xmlns="http://www.w3.org/2000/svg"><g><foreignObject width="10" height="10"><div xmlns="http://www.w3.org/1999/xhtml"><p>hi</p><svg xmlns="http://www.w3.org/2000/svg"><rect width="1" height="1"/></svg></div></foreignObject></g></svg>"#;
    let doc = roxmltree::Document::parse(text).unwrap();
    let ns = Namespaces::from_root(doc.root_element());
    let groups = top_groups(&doc);

    let mut out = String::new();
    write_node(&mut out, groups[0], &ns);
    assert_eq!(
        out,
        r#"<g><foreignObject width="10" height="10"><div xmlns="http://www.w3.org/1999/xhtml"><p>hi</p><svg xmlns="http://www.w3.org/2000/svg"><rect width="1" height="1"/></svg></div></foreignObject></g>"#
    );

    let wrapped = format!(r#"<svg xmlns="http://www.w3.org/2000/svg">{out}</svg>"#);
    let reparsed = roxmltree::Document::parse(&wrapped).unwrap();
    let p = reparsed
        .descendants()
        .find(|n| n.has_tag_name("p"))
        .unwrap();
    assert_eq!(p.tag_name().namespace(), Some("http://www.w3.org/1999/xhtml"));
    let rect = reparsed
        .descendants()
        .find(|n| n.has_tag_name("rect"))
        .unwrap();
    assert_eq!(rect.tag_name().namespace(), Some("http://www.w3.org/2000/svg"));
}
