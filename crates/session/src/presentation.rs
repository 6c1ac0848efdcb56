use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Text slots of the overlay UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    StepTitle,
    StepText,
    /// "Step n / N".
    StepCounter,
    /// "Marker Found" / "Searching…".
    MarkerStatus,
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Element::StepTitle => "step-title",
            Element::StepText => "step-text",
            Element::StepCounter => "step-counter",
            Element::MarkerStatus => "marker-status",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresentationError {
    #[error("presentation element '{0}' is missing")]
    MissingElement(Element),
}

/// Where step text and status labels end up.
pub trait Presentation {
    fn set_text(&mut self, element: Element, text: &str) -> Result<(), PresentationError>;
}

/// Write a label, logging and skipping it if the element is missing.
pub(crate) fn show(presentation: &mut dyn Presentation, element: Element, text: &str) {
    if let Err(e) = presentation.set_text(element, text) {
        tracing::warn!(error = %e, "skipping presentation update");
    }
}

/// In-memory presentation surface. Elements can be marked missing to
/// reproduce a UI that lacks one of the slots.
#[derive(Debug, Default)]
pub struct TextPresentation {
    texts: BTreeMap<Element, String>,
    missing: BTreeSet<Element>,
    writes: usize,
}

impl TextPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface where `element` does not exist.
    pub fn without(mut self, element: Element) -> Self {
        self.missing.insert(element);
        self
    }

    pub fn text(&self, element: Element) -> Option<&str> {
        self.texts.get(&element).map(String::as_str)
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl Presentation for TextPresentation {
    fn set_text(&mut self, element: Element, text: &str) -> Result<(), PresentationError> {
        if self.missing.contains(&element) {
            return Err(PresentationError::MissingElement(element));
        }
        self.writes += 1;
        self.texts.insert(element, text.to_string());
        Ok(())
    }
}

impl fmt::Display for TextPresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (element, text) in &self.texts {
            writeln!(f, "{element}: {text}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_latest_text() {
        let mut p = TextPresentation::new();
        p.set_text(Element::StepText, "one").unwrap();
        p.set_text(Element::StepText, "two").unwrap();
        assert_eq!(p.text(Element::StepText), Some("two"));
        assert_eq!(p.writes(), 2);
    }

    #[test]
    fn missing_element_is_an_error_not_a_panic() {
        let mut p = TextPresentation::new().without(Element::StepTitle);
        assert_eq!(
            p.set_text(Element::StepTitle, "x"),
            Err(PresentationError::MissingElement(Element::StepTitle))
        );
        show(&mut p, Element::StepTitle, "x");
        show(&mut p, Element::StepText, "y");
        assert_eq!(p.text(Element::StepTitle), None);
        assert_eq!(p.text(Element::StepText), Some("y"));
    }

    #[test]
    fn display_lists_elements() {
        let mut p = TextPresentation::new();
        show(&mut p, Element::StepCounter, "Step 1 / 3");
        assert_eq!(p.to_string(), "step-counter: Step 1 / 3\n");
    }
}
