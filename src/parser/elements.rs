use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// An inline `<E>` element found directly inside an `EXTRACT/P` paragraph.
///
/// `text` is the element's own leading text (up to its first child) and
/// `tail` is the text that follows the closing tag inside the paragraph,
/// both trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineElement {
    pub marker: Option<String>,
    pub text: String,
    pub tail: String,
}

/// Where incoming character data should be appended.
#[derive(Clone, Copy)]
enum Capture {
    None,
    Text(usize),
    Tail(usize),
}

/// Walk the document and return every `EXTRACT/P/E` element in document order.
///
/// Fails on anything that is not a single well-formed element tree, so callers
/// never see a partial element list.
pub fn collect_inline_elements(xml: &str) -> Result<Vec<InlineElement>> {
    let mut reader = Reader::from_str(xml);
    // (tag name, index into `elements` when the tag is a tracked inline element)
    let mut stack: Vec<(Vec<u8>, Option<usize>)> = Vec::new();
    let mut elements: Vec<InlineElement> = Vec::new();
    let mut capture = Capture::None;
    let mut root_seen = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                check_single_root(&stack, root_seen)?;
                root_seen = true;
                capture = Capture::None;
                let tracked = if is_inline(&stack, &e) {
                    elements.push(new_element(&e)?);
                    capture = Capture::Text(elements.len() - 1);
                    Some(elements.len() - 1)
                } else {
                    None
                };
                stack.push((e.name().as_ref().to_vec(), tracked));
            }
            Ok(Event::Empty(e)) => {
                check_single_root(&stack, root_seen)?;
                root_seen = true;
                capture = Capture::None;
                if is_inline(&stack, &e) {
                    elements.push(new_element(&e)?);
                    capture = Capture::Tail(elements.len() - 1);
                }
            }
            Ok(Event::End(_)) => {
                let Some((_, tracked)) = stack.pop() else {
                    bail!("closing tag without a matching opening tag");
                };
                capture = match tracked {
                    Some(idx) => Capture::Tail(idx),
                    None => Capture::None,
                };
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().context("invalid character data")?;
                append(&mut elements, capture, &text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e);
                append(&mut elements, capture, &text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("malformed XML near byte {}", reader.buffer_position())
                })
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some((name, _)) = stack.last() {
        bail!(
            "document ended inside <{}>",
            String::from_utf8_lossy(name)
        );
    }
    if !root_seen {
        bail!("document has no root element");
    }

    for el in &mut elements {
        el.text = el.text.trim().to_string();
        el.tail = el.tail.trim().to_string();
    }
    Ok(elements)
}

fn is_inline(stack: &[(Vec<u8>, Option<usize>)], e: &BytesStart) -> bool {
    if e.name().as_ref() != b"E" || stack.len() < 2 {
        return false;
    }
    let n = stack.len();
    stack[n - 1].0 == b"P" && stack[n - 2].0 == b"EXTRACT"
}

fn check_single_root(stack: &[(Vec<u8>, Option<usize>)], root_seen: bool) -> Result<()> {
    if stack.is_empty() && root_seen {
        bail!("content after the document root element");
    }
    Ok(())
}

fn new_element(e: &BytesStart) -> Result<InlineElement> {
    let marker = match e.try_get_attribute("T")? {
        Some(attr) => Some(attr.unescape_value()?.into_owned()),
        None => None,
    };
    Ok(InlineElement {
        marker,
        text: String::new(),
        tail: String::new(),
    })
}

fn append(elements: &mut [InlineElement], capture: Capture, text: &str) {
    match capture {
        Capture::Text(idx) => elements[idx].text.push_str(text),
        Capture::Tail(idx) => elements[idx].tail.push_str(text),
        Capture::None => {}
    }
}

// ── Tests ──
