//! Line-oriented rendering of the model's markdown reply.
//!
//! The reply is cut into sections at lines holding only `---`, and each line
//! is classified by its prefix. Nothing here fails: lines that match no
//! known prefix become paragraphs.

const RULE: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderToken<'a> {
    Heading { level: u8, text: &'a str },
    /// A bold line with every `**` removed.
    Emphasis(String),
    ListItem(&'a str),
    Blank,
    Paragraph(&'a str),
}

impl<'a> RenderToken<'a> {
    pub fn classify(line: &'a str) -> Self {
        if let Some(text) = line.strip_prefix("### ") {
            RenderToken::Heading { level: 3, text }
        } else if let Some(text) = line.strip_prefix("#### ") {
            RenderToken::Heading { level: 4, text }
        } else if line.starts_with("**") {
            RenderToken::Emphasis(line.replace("**", ""))
        } else if let Some(text) = line.strip_prefix("- ") {
            RenderToken::ListItem(text)
        } else if line.trim().is_empty() {
            RenderToken::Blank
        } else {
            RenderToken::Paragraph(line)
        }
    }

    /// Visible text of the token, if it has any.
    pub fn text(&self) -> Option<&str> {
        match self {
            RenderToken::Heading { text, .. } => Some(text),
            RenderToken::Emphasis(text) => Some(text),
            RenderToken::ListItem(text) => Some(text),
            RenderToken::Paragraph(text) => Some(text),
            RenderToken::Blank => None,
        }
    }
}

/// One group of lines between separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    lines: Vec<&'a str>,
}

impl<'a> Section<'a> {
    /// A fresh token iterator; call again to start over.
    pub fn tokens(&self) -> impl Iterator<Item = RenderToken<'a>> + '_ {
        self.lines.iter().copied().map(RenderToken::classify)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Split a reply into sections. Always yields at least one section.
pub fn render(text: &str) -> Vec<Section<'_>> {
    let mut sections = vec![Section { lines: Vec::new() }];

    for line in text.lines() {
        if line.trim() == RULE {
            sections.push(Section { lines: Vec::new() });
        } else if let Some(current) = sections.last_mut() {
            current.lines.push(line);
        }
    }

    sections
}

pub const ANALYSIS_HEADING: &str = "IELTS Writing Analysis";
pub const EXAMPLES_HEADING: &str = "Example Responses by Band Level";
pub const BAND_LABELS: [&str; 4] = ["Band 6", "Band 7", "Band 8", "Band 9"];
const BAND_SCORE_LABEL: &str = "Predicted Band Score";

/// Outcome of comparing a reply with the requested output shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractReport {
    pub missing: Vec<&'static str>,
    /// An analysis section came back although no essay was sent.
    pub unexpected_analysis: bool,
}

impl ContractReport {
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty() && !self.unexpected_analysis
    }
}

/// Check that the headings and labels the instruction asks for are present.
///
/// Only headings and bold lines count; a label mentioned in passing inside a
/// paragraph does not.
pub fn check_contract(text: &str, expects_analysis: bool) -> ContractReport {
    let labels: Vec<String> = render(text)
        .iter()
        .flat_map(|section| section.tokens().collect::<Vec<_>>())
        .filter(|token| matches!(token, RenderToken::Heading { .. } | RenderToken::Emphasis(_)))
        .filter_map(|token| token.text().map(str::to_string))
        .collect();
    let has = |needle: &str| labels.iter().any(|label| label.contains(needle));

    let mut report = ContractReport::default();

    if expects_analysis {
        for required in [ANALYSIS_HEADING, BAND_SCORE_LABEL] {
            if !has(required) {
                report.missing.push(required);
            }
        }
    } else {
        report.unexpected_analysis = has(ANALYSIS_HEADING);
    }

    if !has(EXAMPLES_HEADING) {
        report.missing.push(EXAMPLES_HEADING);
    }
    for band in BAND_LABELS {
        if !has(band) {
            report.missing.push(band);
        }
    }

    report
}
