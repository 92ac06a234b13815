//! The filters of one table, each behind its own debouncer

use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use super::debounce::{DebounceWindows, Debouncer};
use super::filter::{
    apply_filters, is_ignored_arithmetic, FilterDescriptor, FilterInput, FilterKind, TableFilter,
};

struct FilterSlot {
    descriptor: FilterDescriptor,
    /// What the user sees in the filter bar
    draft: FilterInput,
    /// What the rows are filtered by
    committed: FilterInput,
    debouncer: Debouncer<FilterInput>,
}

pub struct FilterSet {
    slots: Vec<FilterSlot>,
}

fn empty_input(kind: &FilterKind) -> FilterInput {
    match kind {
        FilterKind::Select { .. } => FilterInput::Selection(Vec::new()),
        _ => FilterInput::Text(String::new()),
    }
}

impl FilterSet {
    pub fn new(descriptors: Vec<FilterDescriptor>, windows: DebounceWindows) -> Self {
        let slots = descriptors
            .into_iter()
            .map(|descriptor| {
                let delay = match descriptor.kind {
                    FilterKind::TextInput => windows.text,
                    FilterKind::Select { .. } => windows.select,
                    FilterKind::Arithmetic => windows.arithmetic,
                };
                let empty = empty_input(&descriptor.kind);
                FilterSlot {
                    descriptor,
                    draft: empty.clone(),
                    committed: empty,
                    debouncer: Debouncer::new(delay),
                }
            })
            .collect();

        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn descriptor(&self, index: usize) -> Option<&FilterDescriptor> {
        self.slots.get(index).map(|slot| &slot.descriptor)
    }

    pub fn draft(&self, index: usize) -> Option<&FilterInput> {
        self.slots.get(index).map(|slot| &slot.draft)
    }

    /// New input for one filter; applied once it settles
    pub fn edit(&mut self, index: usize, input: FilterInput, now: Instant) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.draft = input.clone();
            slot.debouncer.input(input, now);
        }
    }

    /// Append a character to a text or arithmetic filter
    pub fn push_char(&mut self, index: usize, c: char, now: Instant) {
        if let Some(FilterInput::Text(text)) = self.draft(index) {
            let mut text = text.clone();
            text.push(c);
            self.edit(index, FilterInput::Text(text), now);
        }
    }

    pub fn pop_char(&mut self, index: usize, now: Instant) {
        if let Some(FilterInput::Text(text)) = self.draft(index) {
            let mut text = text.clone();
            text.pop();
            self.edit(index, FilterInput::Text(text), now);
        }
    }

    /// Add or remove one value of a select filter
    pub fn toggle_selection(&mut self, index: usize, value: Value, now: Instant) {
        if let Some(FilterInput::Selection(selected)) = self.draft(index) {
            let mut selected = selected.clone();
            match selected.iter().position(|v| *v == value) {
                Some(pos) => {
                    selected.remove(pos);
                }
                None => selected.push(value),
            }
            self.edit(index, FilterInput::Selection(selected), now);
        }
    }

    /// Commit settled input; true when the committed filters changed
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for slot in &mut self.slots {
            if let Some(input) = slot.debouncer.poll(now) {
                if input != slot.committed {
                    debug!("Filter '{}' committed: {:?}", slot.descriptor.key, input);
                    slot.committed = input;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Commit every pending input now
    pub fn flush(&mut self) -> bool {
        let mut changed = false;
        for slot in &mut self.slots {
            if let Some(input) = slot.debouncer.flush() {
                if input != slot.committed {
                    slot.committed = input;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Drop every filter immediately
    pub fn clear(&mut self) -> bool {
        let mut changed = false;
        for slot in &mut self.slots {
            let empty = empty_input(&slot.descriptor.kind);
            slot.debouncer.cancel();
            slot.draft = empty.clone();
            if slot.committed != empty {
                slot.committed = empty;
                changed = true;
            }
        }
        changed
    }

    pub fn is_pending(&self) -> bool {
        self.slots.iter().any(|slot| slot.debouncer.is_pending())
    }

    /// Arithmetic input that is present but does not constrain the rows
    pub fn is_ignored(&self, index: usize) -> bool {
        match self.slots.get(index) {
            Some(FilterSlot {
                descriptor:
                    FilterDescriptor {
                        kind: FilterKind::Arithmetic,
                        ..
                    },
                draft: FilterInput::Text(text),
                ..
            }) => is_ignored_arithmetic(text),
            _ => false,
        }
    }

    pub fn active_filters(&self) -> Vec<TableFilter> {
        self.slots
            .iter()
            .filter_map(|slot| TableFilter::from_input(&slot.descriptor, &slot.committed))
            .collect()
    }

    /// Indices of `rows` passing the committed filters
    pub fn visible(&self, rows: &[Value]) -> Vec<usize> {
        apply_filters(rows, &self.active_filters())
    }
}
