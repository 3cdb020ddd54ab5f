/*!
Human-readable position rendering.

Every error carries a rendered position string built from the frame stack
active at the time of failure, e.g. `$.tracks[3].title`. A JSON-Path-like
breadcrumb is more useful here than a bare byte offset, since this crate's
errors are schema-aware (a wrong type for a named member, an occurrence
bound breached) rather than just syntax-aware.
*/

use crate::engine::frame::{Frame, FrameKind};

/// Renders the current path through an active [`crate::engine::FrameStack`]
/// as a `$`-rooted, dotted/bracketed path.
pub fn render_path(frames: &[Frame]) -> String {
    let mut out = String::from("$");
    for frame in frames {
        match &frame.kind {
            FrameKind::Member(name) => {
                if is_simple_identifier(name) {
                    out.push('.');
                    out.push_str(name);
                } else {
                    out.push_str("['");
                    out.push_str(name);
                    out.push_str("']");
                }
            }
            FrameKind::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            FrameKind::Root => {}
        }
    }
    out
}

fn is_simple_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
