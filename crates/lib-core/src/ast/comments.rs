use smol_str::SmolStr;

/// Where a positioned comment sits relative to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSlot {
    Before,
    After,
}

/// A group of comment texts attached to one slot of a node. The text
/// list is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedComment {
    pub slot: CommentSlot,
    pub texts: Vec<SmolStr>,
}

/// The positioned-comment overlay carried by a node. Entries keep
/// their recorded order; `Before` entries always precede `After`
/// entries so emission order is stable across transformations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    entries: Vec<PositionedComment>,
}

impl Comments {
    pub fn new() -> Self {
        Comments::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PositionedComment] {
        &self.entries
    }

    /// Record comments on a slot. Empty input is dropped so the
    /// "non-empty entry" invariant holds.
    pub fn push(&mut self, slot: CommentSlot, texts: impl IntoIterator<Item = SmolStr>) {
        let texts: Vec<SmolStr> = texts.into_iter().collect();
        if texts.is_empty() {
            return;
        }
        let entry = PositionedComment { slot, texts };
        match slot {
            CommentSlot::Before => {
                let at = self
                    .entries
                    .iter()
                    .position(|e| e.slot == CommentSlot::After)
                    .unwrap_or(self.entries.len());
                self.entries.insert(at, entry);
            }
            CommentSlot::After => self.entries.push(entry),
        }
    }

    pub fn before(&self) -> impl Iterator<Item = &SmolStr> {
        self.slot_texts(CommentSlot::Before)
    }

    pub fn after(&self) -> impl Iterator<Item = &SmolStr> {
        self.slot_texts(CommentSlot::After)
    }

    fn slot_texts(&self, slot: CommentSlot) -> impl Iterator<Item = &SmolStr> {
        self.entries
            .iter()
            .filter(move |e| e.slot == slot)
            .flat_map(|e| e.texts.iter())
    }

    /// All texts in recorded order, slot-independent. Used for
    /// preservation checks and dedup signatures.
    pub fn texts(&self) -> impl Iterator<Item = &SmolStr> {
        self.entries.iter().flat_map(|e| e.texts.iter())
    }

    /// Drain the overlay. The emitter uses this for containers that
    /// consume their comment list on emission.
    pub fn take(&mut self) -> Comments {
        std::mem::take(self)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn append(&mut self, other: Comments) {
        for entry in other.entries {
            self.push(entry.slot, entry.texts);
        }
    }
}

impl FromIterator<PositionedComment> for Comments {
    fn from_iter<T: IntoIterator<Item = PositionedComment>>(iter: T) -> Self {
        let mut comments = Comments::new();
        for entry in iter {
            comments.push(entry.slot, entry.texts);
        }
        comments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<SmolStr> {
        items.iter().map(|s| SmolStr::new(s)).collect()
    }

    #[test]
    fn before_entries_precede_after_entries() {
        let mut comments = Comments::new();
        comments.push(CommentSlot::After, texts(&["a"]));
        comments.push(CommentSlot::Before, texts(&["b"]));
        comments.push(CommentSlot::Before, texts(&["c"]));

        let slots: Vec<_> = comments.entries().iter().map(|e| e.slot).collect();
        assert_eq!(
            slots,
            [CommentSlot::Before, CommentSlot::Before, CommentSlot::After]
        );
        let before: Vec<_> = comments.before().map(|s| s.as_str()).collect();
        assert_eq!(before, ["b", "c"]);
    }

    #[test]
    fn empty_pushes_are_dropped() {
        let mut comments = Comments::new();
        comments.push(CommentSlot::Before, Vec::<SmolStr>::new());
        assert!(comments.is_empty());
    }

    #[test]
    fn take_leaves_nothing_behind() {
        let mut comments = Comments::new();
        comments.push(CommentSlot::Before, texts(&["x"]));
        let taken = comments.take();
        assert!(comments.is_empty());
        assert_eq!(taken.before().count(), 1);
    }
}
