//! Word Splitting
//!
//! A word expands to a sequence of segments that remember whether they came
//! from quoted text and whether they are subject to IFS splitting. The
//! functions here turn those segments into fields, a single string, or a
//! glob pattern.

use crate::interpreter::helpers::ifs::categorize_ifs;

/// One piece of an expanded word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text {
        value: String,
        /// Result of an unquoted expansion
        splittable: bool,
        /// Inside quotes or escaped; anchors a field even when empty
        quoted: bool,
    },
    /// Boundary between two fields of `"$@"`
    FieldBreak,
}

impl Segment {
    /// Literal text of the word
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
            splittable: false,
            quoted: false,
        }
    }

    pub fn quoted(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
            splittable: false,
            quoted: true,
        }
    }

    /// Result of an expansion, quoted or not
    pub fn expanded(value: impl Into<String>, quoted: bool) -> Self {
        Self::Text {
            value: value.into(),
            splittable: !quoted,
            quoted,
        }
    }
}

/// Field splitting.
///
/// Splittable text is cut at IFS characters; everything else joins the
/// adjacent field. IFS whitespace runs collapse and never produce empty
/// fields; each non-whitespace IFS character ends a field even if it is
/// empty. A word with no quoted part that expands to nothing yields no field.
pub fn split_fields(segments: &[Segment], ifs: &str) -> Vec<String> {
    let (whitespace, non_whitespace) = categorize_ifs(ifs);
    let mut fields = Vec::new();
    let mut current = String::new();
    // `current` is a field even if empty
    let mut anchored = false;
    // The last character was IFS whitespace that ended a field
    let mut after_ws_break = false;

    for segment in segments {
        match segment {
            Segment::FieldBreak => {
                if anchored {
                    fields.push(std::mem::take(&mut current));
                }
                anchored = false;
                after_ws_break = false;
            }
            Segment::Text {
                value,
                splittable: false,
                quoted,
            } => {
                if *quoted || !value.is_empty() {
                    anchored = true;
                    after_ws_break = false;
                }
                current.push_str(value);
            }
            Segment::Text {
                value,
                splittable: true,
                ..
            } => {
                for ch in value.chars() {
                    if whitespace.contains(&ch) {
                        if anchored {
                            fields.push(std::mem::take(&mut current));
                            anchored = false;
                            after_ws_break = true;
                        }
                    } else if non_whitespace.contains(&ch) {
                        if after_ws_break {
                            after_ws_break = false;
                        } else {
                            fields.push(std::mem::take(&mut current));
                            anchored = false;
                        }
                    } else {
                        current.push(ch);
                        anchored = true;
                        after_ws_break = false;
                    }
                }
            }
        }
    }

    if anchored {
        fields.push(current);
    }
    fields
}

/// Join all segments into one string; `"$@"` fields are joined by spaces.
pub fn join_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text { value, .. } => out.push_str(value),
            Segment::FieldBreak => out.push(' '),
        }
    }
    out
}

/// Build a glob pattern: quoted text matches literally, unquoted text keeps
/// its pattern characters.
pub fn pattern_text(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text {
                value,
                quoted: true,
                ..
            } => {
                for ch in value.chars() {
                    if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
                        out.push('\\');
                    }
                    out.push(ch);
                }
            }
            Segment::Text { value, .. } => out.push_str(value),
            Segment::FieldBreak => out.push(' '),
        }
    }
    out
}
