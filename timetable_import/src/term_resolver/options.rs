use crate::normalizer::normalize_whitespace;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use shared_kernel::non_empty_string;
use tracing::{debug, warn};

non_empty_string!(TermLabel);
non_empty_string!(TermId);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub label: TermLabel,
    pub id: TermId,
}

/// Term options offered by the viewer page, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermOptions(Vec<Term>);

lazy_static! {
    static ref OPTION_BLOCK: Selector =
        Selector::parse("div.custom-control.custom-radio, div.form-check")
            .expect("OPTION_BLOCK selector to parse");
    static ref RADIO_INPUT: Selector =
        Selector::parse(r#"input[type="radio"]"#).expect("RADIO_INPUT selector to parse");
    static ref LABEL: Selector = Selector::parse("label").expect("LABEL selector to parse");
    static ref TERM_INPUT_NAME: Regex =
        Regex::new("(?i)semester").expect("TERM_INPUT_NAME to compile");
}

impl TermOptions {
    /// Reads the radio-button group the viewer renders for term selection. A page without
    /// any recognisable option yields an empty set.
    pub fn from_document(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut options = TermOptions::default();

        for block in document.select(&OPTION_BLOCK) {
            let radio = block.select(&RADIO_INPUT).find(|input| {
                input
                    .value()
                    .attr("name")
                    .map_or(false, |name| TERM_INPUT_NAME.is_match(name))
            });
            let label = block.select(&LABEL).next();
            let (Some(radio), Some(label)) = (radio, label) else {
                continue;
            };

            let label = normalize_whitespace(label.text().collect::<String>().as_str());
            let id = radio.value().attr("value").unwrap_or_default();
            if let (Ok(label), Ok(id)) = (TermLabel::try_from(label), TermId::try_from(id)) {
                debug!(label = %label, id = %id, "Found term option");
                options.insert(Term { label, id });
            }
        }

        if options.is_empty() {
            warn!("Could not find any term radio buttons on the page");
        }
        options
    }

    pub fn new(terms: impl IntoIterator<Item = Term>) -> Self {
        let mut options = TermOptions::default();
        for term in terms {
            options.insert(term);
        }
        options
    }

    /// A repeated label keeps its original position and takes the newer id.
    fn insert(&mut self, term: Term) {
        match self.0.iter_mut().find(|existing| existing.label == term.label) {
            Some(existing) => existing.id = term.id,
            None => self.0.push(term),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&Term> {
        self.0.first()
    }
}
