//! Markdown parsing into the Markdown-layer tree.

use std::ops::Range;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::events::MdEvent;
use crate::pipeline::directive::is_fence_line;

/// Parse a document body into Markdown-layer events.
///
/// Container fence lines (`:::name`, `:::`) are block boundaries: they end
/// any open paragraph, list, quote or table and come out as
/// [`MdEvent::Fence`] with their raw text. Adjacent text events are merged
/// so transforms see each run of text once.
pub fn parse_markdown(source: &str, options: Options) -> Vec<MdEvent> {
    let (prepared, fences) = isolate_fences(source);

    let mut events = Vec::new();
    let mut iter = Parser::new_ext(&prepared, options).into_offset_iter();
    while let Some((event, range)) = iter.next() {
        let is_fence = matches!(event, Event::Start(Tag::Paragraph))
            && fences.iter().any(|f| f.contains(&range.start));
        if is_fence {
            for (inner, _) in iter.by_ref() {
                if matches!(inner, Event::End(TagEnd::Paragraph)) {
                    break;
                }
            }
            events.push(MdEvent::Fence(prepared[range].trim().to_string()));
            continue;
        }
        push_merged(&mut events, event.into_static());
    }
    events
}

fn push_merged(events: &mut Vec<MdEvent>, event: Event<'static>) {
    if let Event::Text(text) = &event {
        if let Some(MdEvent::Markdown(Event::Text(prev))) = events.last_mut() {
            *prev = CowStr::from(format!("{}{}", prev, text));
            return;
        }
    }
    events.push(MdEvent::Markdown(event));
}

/// Opening code fence of a line: its character and length.
fn code_fence(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    (len >= 3).then_some((ch, len))
}

fn closes_code_fence(line: &str, ch: char, len: usize) -> bool {
    code_fence(line).is_some_and(|(c, n)| {
        c == ch && n >= len && line.trim().chars().all(|x| x == ch)
    })
}

/// Put every container fence line outside fenced code between blank lines,
/// so the parser sees it as a paragraph of its own. Returns the prepared
/// source and the byte ranges of the fence lines in it.
fn isolate_fences(source: &str) -> (String, Vec<Range<usize>>) {
    let mut out = String::with_capacity(source.len());
    let mut fences = Vec::new();
    let mut code: Option<(char, usize)> = None;

    for line in source.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);

        if let Some((ch, len)) = code {
            if closes_code_fence(content, ch, len) {
                code = None;
            }
        } else if let Some(open) = code_fence(content) {
            code = Some(open);
        } else {
            let indent = content.len() - content.trim_start_matches(' ').len();
            if indent <= 3 && is_fence_line(content) {
                out.push('\n');
                let start = out.len();
                out.push_str(content);
                fences.push(start..out.len());
                out.push_str("\n\n");
                continue;
            }
        }
        out.push_str(line);
    }

    (out, fences)
}
