//! Source markup parsing.
//!
//! Flare topics are XHTML with proprietary `MadCap:` elements. html5ever's
//! HTML parser handles them fine (the namespaced names survive as lowercased
//! local names) and recovers from arbitrary tag soup, so the only inputs we
//! refuse outright are ones with no element content at all.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::error::ConvertError;

/// Parse one topic into a DOM. Total except for element-free input.
pub(crate) fn parse_topic(html: &str) -> Result<RcDom, ConvertError> {
    if html.trim().is_empty() {
        return Err(ConvertError::FatalParse {
            message: "input document is empty".to_string(),
        });
    }

    let dom = parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| ConvertError::FatalParse {
            message: format!("cannot read input: {e}"),
        })?;

    if find_body(&dom.document).is_none() {
        return Err(ConvertError::FatalParse {
            message: "input has no element content".to_string(),
        });
    }

    Ok(dom)
}

/// Locate the `<body>` element under the document node.
pub(crate) fn find_body(document: &Handle) -> Option<Handle> {
    find_element(document, "body")
}

fn find_element(node: &Handle, tag: &str) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &node.data
        && &*name.local == tag
    {
        return Some(node.clone());
    }
    for child in node.children.borrow().iter() {
        if let Some(found) = find_element(child, tag) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_fatal() {
        assert!(matches!(
            parse_topic("   \n  "),
            Err(ConvertError::FatalParse { .. })
        ));
    }

    #[test]
    fn tag_soup_still_parses() {
        let dom = parse_topic("<p>unclosed <b>bold").unwrap();
        assert!(find_body(&dom.document).is_some());
    }
}
