use log::warn;
use std::cell::Cell;
use std::rc::Rc;
use web_sys::{Document, Element};

use crate::dom;
use crate::error::Result;

/// At most one entry open at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accordion {
    open: Option<usize>,
}

impl Accordion {
    /// Starts from whichever entry the markup already renders open.
    pub fn from_active(active: impl IntoIterator<Item = bool>) -> Self {
        Self {
            open: active.into_iter().position(|is_active| is_active),
        }
    }

    pub fn open_entry(&self) -> Option<usize> {
        self.open
    }

    pub fn is_open(&self, entry: usize) -> bool {
        self.open == Some(entry)
    }

    pub fn toggle(&mut self, entry: usize) {
        self.open = if self.is_open(entry) { None } else { Some(entry) };
    }
}

struct FaqList {
    items: Vec<Element>,
    state: Cell<Accordion>,
}

impl FaqList {
    fn toggle(&self, entry: usize) -> Result<()> {
        let mut state = self.state.get();
        state.toggle(entry);
        self.state.set(state);
        for (index, item) in self.items.iter().enumerate() {
            item.class_list()
                .toggle_with_force("active", state.is_open(index))?;
        }
        Ok(())
    }
}

/// Every `.faq-question` inside an item, one per language, toggles that item.
pub fn init(document: &Document) -> Result<()> {
    let items = dom::query_all(document, ".faq-item");
    if items.is_empty() {
        return Ok(());
    }
    let list = Rc::new(FaqList {
        items: items.clone(),
        state: Cell::new(Accordion::from_active(
            items.iter().map(|item| item.class_list().contains("active")),
        )),
    });

    for (entry, item) in items.iter().enumerate() {
        for question in dom::query_all_in(item, ".faq-question") {
            let list = list.clone();
            dom::listen(&question, "click", move |_| {
                if let Err(e) = list.toggle(entry) {
                    warn!("FAQ toggle failed: {}", e);
                }
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clicking_open_entry_closes_it() {
        let mut faq = Accordion::default();
        faq.toggle(2);
        assert_eq!(faq.open_entry(), Some(2));
        faq.toggle(2);
        assert_eq!(faq.open_entry(), None);
    }

    #[test]
    fn entry_rendered_open_closes_on_first_click() {
        let mut faq = Accordion::from_active([false, true, false]);
        assert_eq!(faq.open_entry(), Some(1));
        faq.toggle(1);
        assert_eq!(faq.open_entry(), None);

        let first_wins = Accordion::from_active([true, false, true]);
        assert_eq!(first_wins.open_entry(), Some(0));
        assert_eq!(Accordion::from_active([false, false]).open_entry(), None);
    }

    #[test]
    fn opening_another_entry_closes_the_previous_one() {
        let mut faq = Accordion::default();
        faq.toggle(0);
        faq.toggle(3);
        assert!(!faq.is_open(0));
        assert!(faq.is_open(3));
    }

    #[test]
    fn at_most_one_entry_open_after_any_click_sequence() {
        let clicks = [0, 1, 1, 4, 2, 2, 2, 0, 3, 3, 1, 4, 4, 4, 0];
        let mut faq = Accordion::default();
        for entry in clicks {
            faq.toggle(entry);
            let open = (0..5).filter(|i| faq.is_open(*i)).count();
            assert!(open <= 1);
        }
        assert_eq!(faq.open_entry(), Some(0));
    }
}
